//! Tab-separated writers for one group's `.map`, `.ped` and `.idmap.txt` files.

use anyhow::{Context, Result};
use breedsplit_core::{MarkerRecord, SampleRecord};
use std::fs::File;
use std::path::Path;

fn tsv_writer(path: &Path) -> Result<csv::Writer<File>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))
}

/// Writes markers as chromosome, marker id, genetic distance, position.
pub fn write_marker_table<P: AsRef<Path>>(path: P, markers: &[MarkerRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = tsv_writer(path)?;
    for m in markers {
        wtr.write_record([
            m.chromosome.as_str(),
            m.marker_id.as_str(),
            m.genetic_distance.as_str(),
            m.position.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes full `.ped` lines: six metadata columns then the genotype vector.
pub fn write_sample_table<'a, P, I>(path: P, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a SampleRecord>,
{
    let path = path.as_ref();
    let mut wtr = tsv_writer(path)?;
    for s in rows {
        let meta = [
            s.family_id.as_str(),
            s.sample_id.as_str(),
            s.father_id.as_str(),
            s.mother_id.as_str(),
            s.sex.as_str(),
            s.phenotype.as_str(),
        ];
        wtr.write_record(meta.into_iter().chain(s.genotypes.iter().map(String::as_str)))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `chip id<TAB>target name` lines.
pub fn write_id_map<P: AsRef<Path>>(path: P, id_map: &[(&str, &str)]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = tsv_writer(path)?;
    for (chip_id, target_name) in id_map {
        wtr.write_record([*chip_id, *target_name])?;
    }
    wtr.flush()?;
    Ok(())
}
