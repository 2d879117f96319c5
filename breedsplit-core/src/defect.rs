//! Defects found while loading, validating or emitting a batch.
//!
//! Defects are collected, not thrown: every stage runs to the end and the
//! operator gets the full list before the run halts.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// How two marker files disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaMismatch {
    RowCount { expected: usize, found: usize },
    /// First position (0-based) where the marker ids differ.
    Order { index: usize },
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMismatch::RowCount { expected, found } => write!(
                f,
                "{} markers instead of {} (more than one chip in the batch?)",
                found, expected
            ),
            SchemaMismatch::Order { index } => {
                write!(f, "marker order differs at row {}", index + 1)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Defect {
    #[error("{what} not found: {}", .path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("{} is empty", .path.display())]
    EmptyInput { path: PathBuf },

    #[error("{} has no matching {}", .present.display(), .missing.display())]
    UnpairedInput { present: PathBuf, missing: PathBuf },

    #[error("{} line {line}: {found} columns, expected {expected}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("{} line {line}: duplicate chip id {key}", .path.display())]
    DuplicateKey { path: PathBuf, line: u64, key: String },

    #[error("marker files {reference} and {other} are inconsistent: {mismatch}")]
    InconsistentSchema {
        reference: String,
        other: String,
        mismatch: SchemaMismatch,
    },

    #[error("marker file {stem} does not look like a V1PLUS chip export (missing {})", .missing.join(", "))]
    UnrecognizedChipFormat { stem: String, missing: Vec<String> },

    #[error("sample id {sample_id} appears {occurrences} times across the .ped files")]
    DuplicateSampleId { sample_id: String, occurrences: usize },

    #[error("chip id {chip_id} in the mapping table has no genotype record")]
    UnmappedChip { chip_id: String },

    #[error("mapping table has {mapped} rows but the batch holds {samples} distinct samples")]
    RowCountMismatch { mapped: usize, samples: usize },

    #[error("failed to write bundle for group {group}: {reason}")]
    BundleWriteFailure { group: String, reason: String },

    #[error("failed to read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}
