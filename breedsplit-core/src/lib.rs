//! breedsplit-core: shared data structures and batch logic for breedsplit.
//!
//! This crate holds everything that does not touch the file system:
//! - PLINK marker and sample records, the chip mapping table
//! - `Defect`, the accumulated error kinds of a run
//! - `BatchContext`, the per-run state threaded through every stage
//! - marker/referential consistency checks and the group partitioner
//!
//! Reading and writing files lives in breedsplit-io.

pub mod config;
pub mod context;
pub mod defect;
pub mod partition;
pub mod validate;

pub use config::RunConfig;
pub use context::{BatchContext, Halt, Stage};
pub use defect::{Defect, SchemaMismatch};
pub use partition::{output_stem, partition, undersized_groups, GroupPartition};
pub use validate::validate_batch;

use indexmap::IndexMap;
use std::collections::HashSet;

pub type SampleId = String;
pub type MarkerId = String;
pub type ChipId = String;

/// One line of a PLINK `.map` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerRecord {
    pub marker_id: MarkerId,
    pub chromosome: String,
    /// Passed through verbatim, never parsed as a number.
    pub genetic_distance: String,
    pub position: String,
}

/// One line of a PLINK `.ped` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleRecord {
    pub sample_id: SampleId,
    pub family_id: String,
    pub father_id: String,
    pub mother_id: String,
    pub sex: String,
    pub phenotype: String,
    /// Two allele columns per marker, in marker order.
    pub genotypes: Vec<String>,
}

/// Leading metadata columns of a `.ped` line.
pub const PED_META_COLUMNS: usize = 6;

/// Column count of a `.map` line.
pub const MAP_COLUMNS: usize = 4;

/// Column count of a mapping table line.
pub const MAPPING_COLUMNS: usize = 3;

/// Expected field count of a `.ped` line for a panel of `marker_count` markers.
pub fn ped_columns(marker_count: usize) -> usize {
    PED_META_COLUMNS + 2 * marker_count
}

/// Target of one chip in the mapping table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingEntry {
    pub chip_id: ChipId,
    pub target_name: String,
    pub group_label: String,
}

/// Chip mapping table: keyed by chip id, iterates in file order.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    entries: IndexMap<ChipId, MappingEntry>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry unless its chip id is already present.
    /// Returns false (and keeps the first entry) on a duplicate.
    pub fn insert(&mut self, entry: MappingEntry) -> bool {
        if self.entries.contains_key(&entry.chip_id) {
            return false;
        }
        self.entries.insert(entry.chip_id.clone(), entry);
        true
    }

    pub fn get(&self, chip_id: &str) -> Option<&MappingEntry> {
        self.entries.get(chip_id)
    }

    pub fn contains(&self, chip_id: &str) -> bool {
        self.entries.contains_key(chip_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry whose chip id is in `excluded`, keeping the order of the rest.
    pub fn remove_excluded(&mut self, excluded: &ExcludeSet) -> usize {
        let before = self.entries.len();
        self.entries.retain(|chip_id, _| !excluded.contains(chip_id));
        before - self.entries.len()
    }
}

impl FromIterator<MappingEntry> for MappingTable {
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        let mut table = MappingTable::new();
        for entry in iter {
            table.insert(entry);
        }
        table
    }
}

/// Chip ids to drop from a batch when exclusions are enabled.
pub type ExcludeSet = HashSet<ChipId>;
