use crate::TableRead;
use anyhow::{Context, Result};
use breedsplit_core::Defect;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const MARKER_EXT: &str = "map";
pub const SAMPLE_EXT: &str = "ped";

/// A `.map` file and the `.ped` file sharing its stem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputPair {
    pub stem: String,
    pub marker_path: PathBuf,
    pub sample_path: PathBuf,
}

#[derive(Default)]
struct Slots {
    marker: Option<PathBuf>,
    sample: Option<PathBuf>,
}

/// Finds every `.map`/`.ped` pair directly inside `dir`, sorted by stem.
///
/// An orphan of either kind is an `UnpairedInput`; no pair at all is `MissingInput`.
/// Failing to list the directory is an error rather than a defect.
pub fn discover_input_pairs<P: AsRef<Path>>(dir: P) -> Result<TableRead<Vec<InputPair>>> {
    let dir = dir.as_ref();
    let mut by_stem: BTreeMap<String, Slots> = BTreeMap::new();

    let entries =
        std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("listing {}", dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let is_marker = match path.extension() {
            Some(ext) if ext == MARKER_EXT => true,
            Some(ext) if ext == SAMPLE_EXT => false,
            _ => continue,
        };
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!(
                "Skipping {}: file name is not valid UTF-8",
                path.display()
            );
            continue;
        };
        let slots = by_stem.entry(stem.to_string()).or_default();
        if is_marker {
            slots.marker = Some(path);
        } else {
            slots.sample = Some(path);
        }
    }

    let mut pairs = Vec::new();
    let mut defects = Vec::new();
    for (stem, slots) in by_stem {
        match (slots.marker, slots.sample) {
            (Some(marker_path), Some(sample_path)) => pairs.push(InputPair {
                stem,
                marker_path,
                sample_path,
            }),
            (Some(present), None) => defects.push(Defect::UnpairedInput {
                missing: present.with_extension(SAMPLE_EXT),
                present,
            }),
            (None, Some(present)) => defects.push(Defect::UnpairedInput {
                missing: present.with_extension(MARKER_EXT),
                present,
            }),
            (None, None) => {}
        }
    }

    if pairs.is_empty() {
        defects.push(Defect::MissingInput {
            what: "marker/sample file pair",
            path: dir.to_path_buf(),
        });
    }

    log::info!("Found {} .map/.ped pair(s) in {}", pairs.len(), dir.display());
    Ok(TableRead {
        rows: pairs,
        defects,
    })
}
