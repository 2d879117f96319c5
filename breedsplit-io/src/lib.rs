//! breedsplit-io: file I/O for the breedsplit toolkit.
//!
//! This crate reads and writes every file a split run touches:
//! - PLINK `.map` / `.ped` text files and the chip mapping table
//! - the optional exclude list
//! - discovery of `.map`/`.ped` pairs in a directory
//! - per-group output files and the archive that bundles them
//!
//! Readers do not stop at the first bad line. They return the well-formed rows
//! together with every `Defect` they ran into.

pub mod bundle;
pub mod discover;
pub mod read;
pub mod write;

pub use bundle::{write_bundle, BundleEmitter, ZipBundler};
pub use discover::{discover_input_pairs, InputPair};
pub use read::{read_exclude_list, read_mapping_table, read_marker_table, read_sample_table};

use breedsplit_core::Defect;

/// Rows read from one file plus the defects found while reading it.
#[derive(Debug)]
pub struct TableRead<T> {
    pub rows: T,
    pub defects: Vec<Defect>,
}

impl<T> TableRead<T> {
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }
}
