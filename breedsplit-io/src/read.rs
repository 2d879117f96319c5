//! Readers for PLINK `.map`/`.ped` files, the mapping table and the exclude list.
//!
//! All tables are tab-separated without a header. Empty fields at either end of a
//! line (stray edge tabs) are dropped before the field count is checked, and lines
//! with nothing left are skipped. Line numbers in defects are 1-based physical lines.

use crate::TableRead;
use anyhow::{Context, Result};
use breedsplit_core::{
    ped_columns, Defect, ExcludeSet, MappingEntry, MappingTable, MarkerRecord, SampleRecord,
    MAPPING_COLUMNS, MAP_COLUMNS, PED_META_COLUMNS,
};
use csv::StringRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Opens a tab-separated table, or says why it cannot be read.
fn open_table(path: &Path, what: &'static str) -> Result<csv::Reader<File>, Defect> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Defect::MissingInput {
                what,
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(Defect::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    if !meta.is_file() {
        return Err(Defect::Unreadable {
            path: path.to_path_buf(),
            reason: "not a regular file".into(),
        });
    }

    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Defect::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Feeds every record of `path` to `on_row` with its line number, collecting defects.
/// Reading stops at the first I/O or decoding error.
fn read_rows<F>(path: &Path, what: &'static str, mut on_row: F) -> Vec<Defect>
where
    F: FnMut(u64, &StringRecord) -> Result<(), Defect>,
{
    let mut defects = Vec::new();
    let mut rdr = match open_table(path, what) {
        Ok(rdr) => rdr,
        Err(defect) => {
            defects.push(defect);
            return defects;
        }
    };

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                defects.push(Defect::Unreadable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                break;
            }
        };
        let line = record.position().map_or(0, |p| p.line());
        let record = trim_edges(&record);
        if record.is_empty() {
            continue;
        }
        if let Err(defect) = on_row(line, &record) {
            defects.push(defect);
        }
    }
    defects
}

/// Drops the empty fields at both ends of a line, keeping interior ones.
fn trim_edges(record: &StringRecord) -> StringRecord {
    let fields: Vec<&str> = record.iter().collect();
    let start = fields
        .iter()
        .position(|f| !f.is_empty())
        .unwrap_or(fields.len());
    let end = fields
        .iter()
        .rposition(|f| !f.is_empty())
        .map_or(start, |i| i + 1);
    fields[start..end].iter().copied().collect()
}

fn check_width(path: &Path, line: u64, record: &StringRecord, expected: usize) -> Result<(), Defect> {
    if record.len() == expected {
        Ok(())
    } else {
        Err(Defect::MalformedRow {
            path: path.to_path_buf(),
            line,
            found: record.len(),
            expected,
        })
    }
}

/// A readable file with no rows in it (zero bytes or blank lines only).
fn nothing_read<T>(path: &Path, rows: &[T], defects: &mut Vec<Defect>) {
    if rows.is_empty() && defects.is_empty() {
        defects.push(Defect::EmptyInput {
            path: path.to_path_buf(),
        });
    }
}

/// Reads a PLINK `.map` file: chromosome, marker id, genetic distance, position.
pub fn read_marker_table<P: AsRef<Path>>(path: P) -> TableRead<Vec<MarkerRecord>> {
    let path = path.as_ref();
    let mut rows = Vec::new();
    let mut defects = read_rows(path, "marker file", |line, record| {
        check_width(path, line, record, MAP_COLUMNS)?;
        rows.push(MarkerRecord {
            chromosome: record[0].to_string(),
            marker_id: record[1].to_string(),
            genetic_distance: record[2].to_string(),
            position: record[3].to_string(),
        });
        Ok(())
    });
    nothing_read(path, &rows, &mut defects);

    log::debug!(
        "{}: {} markers, {} defects",
        path.display(),
        rows.len(),
        defects.len()
    );
    TableRead { rows, defects }
}

/// Reads a PLINK `.ped` file whose lines must carry `6 + 2 * marker_count` fields.
///
/// Lines of the wrong width are reported and left out; later lines are still read.
/// An empty file is zero samples, not a defect.
pub fn read_sample_table<P: AsRef<Path>>(
    path: P,
    marker_count: usize,
) -> TableRead<Vec<SampleRecord>> {
    let path = path.as_ref();
    let expected = ped_columns(marker_count);
    let mut rows = Vec::new();
    let defects = read_rows(path, "sample file", |line, record| {
        check_width(path, line, record, expected)?;
        rows.push(SampleRecord {
            family_id: record[0].to_string(),
            sample_id: record[1].to_string(),
            father_id: record[2].to_string(),
            mother_id: record[3].to_string(),
            sex: record[4].to_string(),
            phenotype: record[5].to_string(),
            genotypes: record
                .iter()
                .skip(PED_META_COLUMNS)
                .map(str::to_string)
                .collect(),
        });
        Ok(())
    });
    if rows.is_empty() && defects.is_empty() {
        log::warn!("{} holds no samples", path.display());
    }

    log::debug!(
        "{}: {} samples, {} defects",
        path.display(),
        rows.len(),
        defects.len()
    );
    TableRead { rows, defects }
}

/// Reads the chip mapping table: chip id, target sample name, group label.
///
/// A repeated chip id is a `DuplicateKey`; the first occurrence is kept.
pub fn read_mapping_table<P: AsRef<Path>>(path: P) -> TableRead<MappingTable> {
    let path = path.as_ref();
    let mut table = MappingTable::new();
    let mut defects = read_rows(path, "mapping table", |line, record| {
        check_width(path, line, record, MAPPING_COLUMNS)?;
        let entry = MappingEntry {
            chip_id: record[0].to_string(),
            target_name: record[1].to_string(),
            group_label: record[2].to_string(),
        };
        let key = entry.chip_id.clone();
        if table.insert(entry) {
            Ok(())
        } else {
            Err(Defect::DuplicateKey {
                path: path.to_path_buf(),
                line,
                key,
            })
        }
    });
    if table.is_empty() && defects.is_empty() {
        defects.push(Defect::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    log::info!("Loaded {} chip mappings from {}", table.len(), path.display());
    TableRead {
        rows: table,
        defects,
    }
}

/// Reads the exclude list, one chip id per line. A missing file is `None`.
pub fn read_exclude_list<P: AsRef<Path>>(path: P) -> Result<Option<ExcludeSet>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let mut excluded = ExcludeSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        let chip_id = line.trim();
        if !chip_id.is_empty() {
            excluded.insert(chip_id.to_string());
        }
    }
    Ok(Some(excluded))
}
