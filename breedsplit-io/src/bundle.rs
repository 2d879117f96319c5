//! Packaging a group's output files into one archive.

use crate::write::{write_id_map, write_marker_table, write_sample_table};
use anyhow::{anyhow, Context, Result};
use breedsplit_core::GroupPartition;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Packs a set of files into a single archive.
pub trait BundleEmitter {
    /// Extension of the archives this emitter produces, without the dot.
    fn extension(&self) -> &str;

    /// Writes `archive` containing each of `members` under its base name.
    fn emit(&self, archive: &Path, members: &[PathBuf]) -> Result<()>;
}

/// Deflate-compressed `.zip` archives.
#[derive(Clone, Copy, Debug)]
pub struct ZipBundler {
    pub compression: CompressionMethod,
}

impl Default for ZipBundler {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl BundleEmitter for ZipBundler {
    fn extension(&self) -> &str {
        "zip"
    }

    fn emit(&self, archive: &Path, members: &[PathBuf]) -> Result<()> {
        let out = File::create(archive)
            .with_context(|| format!("creating {}", archive.display()))?;
        let mut zip = ZipWriter::new(BufWriter::new(out));
        let options = FileOptions::default().compression_method(self.compression);

        for member in members {
            let name = member
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("no file name in {}", member.display()))?;
            zip.start_file(name, options)?;
            let mut src =
                File::open(member).with_context(|| format!("opening {}", member.display()))?;
            std::io::copy(&mut src, &mut zip)
                .with_context(|| format!("adding {} to {}", name, archive.display()))?;
        }

        let mut out = zip.finish()?;
        out.flush()?;
        Ok(())
    }
}

/// `members` is `[ped, map, idmap]`.
fn write_members(members: &[PathBuf; 3], group: &GroupPartition<'_>) -> Result<()> {
    let [ped_path, map_path, idmap_path] = members;
    write_marker_table(map_path, group.markers)?;
    write_sample_table(ped_path, group.rows.iter().copied())?;
    write_id_map(idmap_path, &group.id_map)
}

/// Tries to remove every member, skipping ones never written. Returns the first failure.
fn remove_loose(members: &[PathBuf]) -> Result<()> {
    let mut first_err = None;
    for member in members {
        match std::fs::remove_file(member) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                log::warn!("Could not remove {}: {}", member.display(), e);
                if first_err.is_none() {
                    first_err = Some(
                        anyhow::Error::new(e).context(format!("removing {}", member.display())),
                    );
                }
            }
        }
    }
    first_err.map_or(Ok(()), Err)
}

/// Writes a group's `.map`, `.ped` and `.idmap.txt` as `{stem}.*` in `out_dir`,
/// bundles them with `emitter`, then removes the loose files.
///
/// Returns the archive path.
pub fn write_bundle(
    out_dir: &Path,
    stem: &str,
    group: &GroupPartition<'_>,
    emitter: &dyn BundleEmitter,
) -> Result<PathBuf> {
    let map_path = out_dir.join(format!("{}.map", stem));
    let ped_path = out_dir.join(format!("{}.ped", stem));
    let idmap_path = out_dir.join(format!("{}.idmap.txt", stem));
    let archive = out_dir.join(format!("{}.{}", stem, emitter.extension()));

    let members = [ped_path, map_path, idmap_path];
    let bundled = write_members(&members, group)
        .and_then(|()| emitter.emit(&archive, &members))
        .with_context(|| format!("bundling {}", archive.display()));

    // Loose files go on every path; a bundling error takes precedence.
    let cleaned = remove_loose(&members);
    bundled?;
    cleaned?;

    log::info!(
        "Wrote group {} ({} samples) to {}",
        group.label,
        group.len(),
        archive.display()
    );
    Ok(archive)
}
