//! Cross-file consistency checks run after every input has been parsed.
//!
//! Each check is a pure function of the batch and returns the defects it
//! found; `validate_batch` runs them all so one pass reports everything.

use crate::{BatchContext, Defect, SchemaMismatch};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Markers every V1PLUS chip export carries.
pub const V1PLUS_REFERENCE_MARKERS: [&str; 7] = [
    "CNCB10000416",
    "CNCB10002887",
    "CNCB10004677",
    "CNCB10006046",
    "CNCB10009510",
    "CNCB10009951",
    "CNCB10010848",
];

/// Runs every enabled check in order and concatenates the defects.
pub fn validate_batch(ctx: &BatchContext) -> Vec<Defect> {
    let mut defects = check_marker_consistency(ctx);
    if ctx.config.check_chip_format {
        defects.extend(check_chip_format(ctx, &V1PLUS_REFERENCE_MARKERS));
    }
    defects.extend(check_referential_integrity(ctx));
    defects
}

/// All marker tables must match the template in length and marker-id order.
///
/// Genotype columns are positional, so set equality is not enough. Only the
/// first diverging table is reported.
pub fn check_marker_consistency(ctx: &BatchContext) -> Vec<Defect> {
    let mut tables = ctx.marker_tables();
    let (reference, template) = match tables.next() {
        Some(t) => t,
        None => return Vec::new(),
    };

    // Row counts first: a different length usually means a second chip type.
    let tables: Vec<_> = tables.collect();
    if let Some((other, rows)) = tables.iter().find(|(_, rows)| rows.len() != template.len()) {
        return vec![Defect::InconsistentSchema {
            reference: reference.to_string(),
            other: other.to_string(),
            mismatch: SchemaMismatch::RowCount {
                expected: template.len(),
                found: rows.len(),
            },
        }];
    }

    for (other, rows) in tables {
        let diverges = template
            .iter()
            .zip(rows.iter())
            .position(|(a, b)| a.marker_id != b.marker_id);
        if let Some(index) = diverges {
            return vec![Defect::InconsistentSchema {
                reference: reference.to_string(),
                other: other.to_string(),
                mismatch: SchemaMismatch::Order { index },
            }];
        }
    }
    Vec::new()
}

/// Every id in `reference_markers` must appear in the template marker table.
pub fn check_chip_format(ctx: &BatchContext, reference_markers: &[&str]) -> Vec<Defect> {
    let (stem, template) = match ctx.template() {
        Some(t) => t,
        None => return Vec::new(),
    };
    let present: HashSet<&str> = template.iter().map(|m| m.marker_id.as_str()).collect();
    let missing: Vec<String> = reference_markers
        .iter()
        .filter(|id| !present.contains(*id))
        .map(|id| id.to_string())
        .collect();

    if missing.is_empty() {
        Vec::new()
    } else {
        vec![Defect::UnrecognizedChipFormat {
            stem: stem.to_string(),
            missing,
        }]
    }
}

/// Sample ids must be unique, every mapped chip must have a sample, and the
/// mapping must cover exactly the distinct samples of the batch.
pub fn check_referential_integrity(ctx: &BatchContext) -> Vec<Defect> {
    let mut defects = Vec::new();

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for record in ctx.samples() {
        *counts.entry(record.sample_id.as_str()).or_insert(0) += 1;
    }

    for (sample_id, &occurrences) in counts.iter() {
        if occurrences > 1 {
            defects.push(Defect::DuplicateSampleId {
                sample_id: sample_id.to_string(),
                occurrences,
            });
        }
    }

    for entry in ctx.mapping().iter() {
        if !counts.contains_key(entry.chip_id.as_str()) {
            defects.push(Defect::UnmappedChip {
                chip_id: entry.chip_id.clone(),
            });
        }
    }

    if ctx.mapping().len() != counts.len() {
        defects.push(Defect::RowCountMismatch {
            mapped: ctx.mapping().len(),
            samples: counts.len(),
        });
    }

    defects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{mapping, marker, sample};
    use crate::RunConfig;

    fn markers(ids: &[&str]) -> Vec<crate::MarkerRecord> {
        ids.iter().map(|id| marker(id)).collect()
    }

    #[test]
    fn identical_marker_tables_pass() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_marker_table("a", markers(&["M1", "M2", "M3"]));
        ctx.add_marker_table("b", markers(&["M1", "M2", "M3"]));
        assert!(check_marker_consistency(&ctx).is_empty());
    }

    #[test]
    fn transposed_marker_is_one_schema_defect() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_marker_table("a", markers(&["M1", "M2", "M3"]));
        ctx.add_marker_table("b", markers(&["M1", "M3", "M2"]));
        ctx.add_marker_table("c", markers(&["M3", "M2", "M1"]));
        let defects = check_marker_consistency(&ctx);
        assert_eq!(
            defects,
            vec![Defect::InconsistentSchema {
                reference: "a".into(),
                other: "b".into(),
                mismatch: SchemaMismatch::Order { index: 1 },
            }]
        );
    }

    #[test]
    fn row_count_difference_is_reported() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_marker_table("a", markers(&["M1", "M2"]));
        ctx.add_marker_table("b", markers(&["M1", "M2", "M3"]));
        let defects = check_marker_consistency(&ctx);
        assert_eq!(defects.len(), 1);
        assert!(matches!(
            defects[0],
            Defect::InconsistentSchema {
                mismatch: SchemaMismatch::RowCount { expected: 2, found: 3 },
                ..
            }
        ));
    }

    #[test]
    fn chip_format_lists_missing_reference_markers() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_marker_table("a", markers(&["CNCB10000416", "M2"]));
        let defects = check_chip_format(&ctx, &["CNCB10000416", "CNCB10002887"]);
        assert_eq!(
            defects,
            vec![Defect::UnrecognizedChipFormat {
                stem: "a".into(),
                missing: vec!["CNCB10002887".into()],
            }]
        );
    }

    #[test]
    fn chip_format_is_opt_in() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_marker_table("a", markers(&["M1"]));
        ctx.add_sample_table("a", vec![sample("S1", 1)]);
        ctx.set_mapping(mapping(&[("S1", "Alice", "A")]));
        assert!(validate_batch(&ctx).is_empty());

        ctx.config.check_chip_format = true;
        let defects = validate_batch(&ctx);
        assert_eq!(defects.len(), 1);
        assert!(matches!(defects[0], Defect::UnrecognizedChipFormat { .. }));
    }

    #[test]
    fn one_unmapped_defect_per_missing_chip() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_sample_table("a", vec![sample("S1", 1), sample("S2", 1)]);
        ctx.set_mapping(mapping(&[
            ("S1", "a", "G"),
            ("X1", "b", "G"),
            ("X2", "c", "G"),
        ]));
        let defects = check_referential_integrity(&ctx);
        assert_eq!(
            defects,
            vec![
                Defect::UnmappedChip { chip_id: "X1".into() },
                Defect::UnmappedChip { chip_id: "X2".into() },
                Defect::RowCountMismatch { mapped: 3, samples: 2 },
            ]
        );
    }

    #[test]
    fn duplicate_sample_across_files_is_reported_once() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_sample_table("a", vec![sample("S1", 1), sample("S2", 1)]);
        ctx.add_sample_table("b", vec![sample("S1", 1)]);
        ctx.set_mapping(mapping(&[("S1", "a", "G"), ("S2", "b", "G")]));
        let defects = check_referential_integrity(&ctx);
        assert_eq!(
            defects,
            vec![Defect::DuplicateSampleId {
                sample_id: "S1".into(),
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn unmapped_sample_is_a_count_mismatch() {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_sample_table("a", vec![sample("S1", 1), sample("S2", 1)]);
        ctx.set_mapping(mapping(&[("S1", "a", "G")]));
        assert_eq!(
            check_referential_integrity(&ctx),
            vec![Defect::RowCountMismatch { mapped: 1, samples: 2 }]
        );
    }
}
