//! Per-run state threaded through load, validation and partitioning.

use crate::{
    Defect, ExcludeSet, MappingTable, MarkerRecord, RunConfig, SampleId, SampleRecord,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Pipeline stage a gate closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Load,
    Validate,
    Emit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Validate => "validation",
            Stage::Emit => "emit",
        };
        f.write_str(name)
    }
}

/// A gate refused to let the run continue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Halt {
    pub stage: Stage,
    pub defect_count: usize,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} defect(s) found during {}; fix them and run again",
            self.defect_count, self.stage
        )
    }
}

impl std::error::Error for Halt {}

/// Everything loaded for one batch plus the defects found so far.
///
/// Marker and sample tables are keyed by file stem in a `BTreeMap`, so the
/// template marker table (the lexicographically first stem) does not depend on
/// directory enumeration order.
#[derive(Debug)]
pub struct BatchContext {
    pub config: RunConfig,
    markers: BTreeMap<String, Vec<MarkerRecord>>,
    samples: BTreeMap<String, Vec<SampleRecord>>,
    mapping: MappingTable,
    exclusions: ExcludeSet,
    defects: Vec<Defect>,
}

impl BatchContext {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            markers: BTreeMap::new(),
            samples: BTreeMap::new(),
            mapping: MappingTable::new(),
            exclusions: ExcludeSet::new(),
            defects: Vec::new(),
        }
    }

    pub fn set_mapping(&mut self, mapping: MappingTable) {
        self.mapping = mapping;
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    pub fn set_exclusions(&mut self, exclusions: ExcludeSet) {
        self.exclusions = exclusions;
    }

    pub fn exclusions(&self) -> &ExcludeSet {
        &self.exclusions
    }

    pub fn add_marker_table(&mut self, stem: impl Into<String>, rows: Vec<MarkerRecord>) {
        self.markers.insert(stem.into(), rows);
    }

    pub fn add_sample_table(&mut self, stem: impl Into<String>, rows: Vec<SampleRecord>) {
        self.samples.insert(stem.into(), rows);
    }

    /// Marker tables in stem order.
    pub fn marker_tables(&self) -> impl Iterator<Item = (&str, &[MarkerRecord])> {
        self.markers.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// The canonical marker table written into every group.
    pub fn template(&self) -> Option<(&str, &[MarkerRecord])> {
        self.marker_tables().next()
    }

    /// All sample records, in stem order then file order.
    pub fn samples(&self) -> impl Iterator<Item = &SampleRecord> {
        self.samples.values().flatten()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    /// Global `sample_id -> record` index. The first record wins on a duplicate id.
    pub fn sample_index(&self) -> HashMap<&str, &SampleRecord> {
        let mut index = HashMap::with_capacity(self.sample_count());
        for record in self.samples() {
            index.entry(record.sample_id.as_str()).or_insert(record);
        }
        index
    }

    /// Removes excluded chip ids from the mapping table and the sample tables.
    /// Returns (mapping entries removed, sample records removed).
    pub fn apply_exclusions(&mut self) -> (usize, usize) {
        if self.exclusions.is_empty() {
            return (0, 0);
        }
        let mapped = self.mapping.remove_excluded(&self.exclusions);
        let mut sampled = 0;
        for rows in self.samples.values_mut() {
            let before = rows.len();
            rows.retain(|r| !self.exclusions.contains(&r.sample_id));
            sampled += before - rows.len();
        }
        (mapped, sampled)
    }

    pub fn record(&mut self, defect: Defect) {
        self.defects.push(defect);
    }

    pub fn extend_defects<I: IntoIterator<Item = Defect>>(&mut self, defects: I) {
        self.defects.extend(defects);
    }

    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    pub fn has_defects(&self) -> bool {
        !self.defects.is_empty()
    }

    pub fn into_defects(self) -> Vec<Defect> {
        self.defects
    }

    /// Closes `stage`: errors if any defect is outstanding.
    pub fn gate(&self, stage: Stage) -> Result<(), Halt> {
        if self.defects.is_empty() {
            Ok(())
        } else {
            Err(Halt {
                stage,
                defect_count: self.defects.len(),
            })
        }
    }

    /// Distinct sample ids in the batch.
    pub fn distinct_sample_ids(&self) -> Vec<&SampleId> {
        let mut seen = std::collections::HashSet::new();
        self.samples()
            .map(|r| &r.sample_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}
