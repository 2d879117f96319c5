use crate::{BatchContext, Defect, MappingEntry, MarkerRecord, SampleRecord};
use indexmap::IndexMap;

/// One output group: template markers, its sample rows, and the chip → name table.
#[derive(Debug)]
pub struct GroupPartition<'a> {
    pub label: String,
    pub markers: &'a [MarkerRecord],
    /// Rows in mapping-table order.
    pub rows: Vec<&'a SampleRecord>,
    /// (chip id, target name), same order as `rows`.
    pub id_map: Vec<(&'a str, &'a str)>,
}

impl GroupPartition<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// File stem shared by all outputs of a group.
pub fn output_stem(label: &str, timestamp: &str) -> String {
    format!("{}_{}", label, timestamp)
}

/// Splits a validated batch into groups by group label.
///
/// Groups come out in order of first appearance in the mapping table, rows within
/// a group in mapping-table order. Expects `validate_batch` to have passed; a chip
/// with no sample record is returned as `UnmappedChip`.
pub fn partition(ctx: &BatchContext) -> Result<Vec<GroupPartition<'_>>, Defect> {
    let markers = ctx.template().map(|(_, rows)| rows).unwrap_or(&[]);
    let index = ctx.sample_index();

    let mut groups: IndexMap<&str, Vec<&MappingEntry>> = IndexMap::new();
    for entry in ctx.mapping().iter() {
        groups
            .entry(entry.group_label.as_str())
            .or_default()
            .push(entry);
    }

    let mut partitions = Vec::with_capacity(groups.len());
    for (label, entries) in groups {
        let mut rows = Vec::with_capacity(entries.len());
        let mut id_map = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = index
                .get(entry.chip_id.as_str())
                .copied()
                .ok_or_else(|| Defect::UnmappedChip {
                    chip_id: entry.chip_id.clone(),
                })?;
            rows.push(record);
            id_map.push((entry.chip_id.as_str(), entry.target_name.as_str()));
        }

        partitions.push(GroupPartition {
            label: label.to_string(),
            markers,
            rows,
            id_map,
        });
    }

    for group in undersized_groups(&partitions, ctx.config.min_group_size) {
        log::warn!(
            "Group {} has only {} genotyped samples (fewer than {})",
            group.label,
            group.len(),
            ctx.config.min_group_size
        );
    }
    Ok(partitions)
}

/// Groups with fewer than `min_size` rows.
pub fn undersized_groups<'g, 'a>(
    groups: &'g [GroupPartition<'a>],
    min_size: usize,
) -> impl Iterator<Item = &'g GroupPartition<'a>> {
    groups.iter().filter(move |g| g.len() < min_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{mapping, marker, sample};
    use crate::RunConfig;

    fn batch() -> BatchContext {
        let mut ctx = BatchContext::new(RunConfig::default());
        ctx.add_marker_table("batch", vec![marker("M1"), marker("M2"), marker("M3")]);
        ctx.add_sample_table(
            "batch",
            vec![sample("S1", 3), sample("S2", 3), sample("S3", 3), sample("S4", 3)],
        );
        ctx
    }

    #[test]
    fn single_group_keeps_mapping_order() {
        let mut ctx = batch();
        ctx.set_mapping(mapping(&[
            ("S2", "Bob", "BreedA"),
            ("S1", "Alice", "BreedA"),
        ]));
        let groups = partition(&ctx).unwrap();
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.label, "BreedA");
        assert_eq!(g.markers.len(), 3);
        let ids: Vec<_> = g.rows.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["S2", "S1"]);
        assert_eq!(g.id_map, vec![("S2", "Bob"), ("S1", "Alice")]);
    }

    #[test]
    fn groups_partition_every_sample_once() {
        let mut ctx = batch();
        ctx.set_mapping(mapping(&[
            ("S1", "a", "X"),
            ("S2", "b", "Y"),
            ("S3", "c", "X"),
            ("S4", "d", "Z"),
        ]));
        let groups = partition(&ctx).unwrap();
        let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["X", "Y", "Z"]);

        let mut all: Vec<_> = groups
            .iter()
            .flat_map(|g| g.rows.iter().map(|r| r.sample_id.clone()))
            .collect();
        all.sort();
        assert_eq!(all, vec!["S1", "S2", "S3", "S4"]);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn small_groups_are_flagged_against_threshold() {
        let mut ctx = batch();
        ctx.set_mapping(mapping(&[
            ("S1", "a", "X"),
            ("S2", "b", "X"),
            ("S3", "c", "X"),
            ("S4", "d", "Y"),
        ]));
        let groups = partition(&ctx).unwrap();

        let small: Vec<_> = undersized_groups(&groups, 3).map(|g| g.label.as_str()).collect();
        assert_eq!(small, vec!["Y"]);
        assert_eq!(undersized_groups(&groups, 1).count(), 0);
        assert_eq!(undersized_groups(&groups, 100).count(), 2);
    }

    #[test]
    fn missing_sample_is_unmapped_chip() {
        let mut ctx = batch();
        ctx.set_mapping(mapping(&[("S9", "ghost", "X")]));
        let err = partition(&ctx).unwrap_err();
        assert_eq!(err, Defect::UnmappedChip { chip_id: "S9".into() });
    }

    #[test]
    fn stem_joins_label_and_timestamp() {
        assert_eq!(output_stem("BreedA", "20250101120000"), "BreedA_20250101120000");
    }
}
