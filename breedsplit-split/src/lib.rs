//! breedsplit-split: validate a PLINK batch and split it into per-group bundles.
//!
//! A run goes through two gates. Loading (mapping table, pair discovery, every
//! `.map`/`.ped`) must finish without defects before validation runs, and
//! validation must finish without defects before anything is written.

use anyhow::Result;
use breedsplit_core::{
    output_stem, partition, validate_batch, BatchContext, Defect, Halt, RunConfig, Stage,
};
use breedsplit_io::{
    discover_input_pairs, read_exclude_list, read_mapping_table, read_marker_table,
    read_sample_table, write_bundle, BundleEmitter, ZipBundler,
};
use std::path::PathBuf;

/// Outcome of a split run.
#[derive(Debug)]
pub struct SplitReport {
    /// Every defect of the run, in the order found.
    pub defects: Vec<Defect>,
    /// Gate that stopped the run, if any.
    pub halted_at: Option<Stage>,
    /// Archives written, one per successful group.
    pub bundles: Vec<PathBuf>,
}

impl SplitReport {
    pub fn is_success(&self) -> bool {
        self.defects.is_empty()
    }

    fn halted(ctx: BatchContext, halt: Halt) -> Self {
        log::error!("{}", halt);
        Self {
            defects: ctx.into_defects(),
            halted_at: Some(halt.stage),
            bundles: Vec::new(),
        }
    }
}

/// Runs a split with the default `.zip` bundler.
pub fn run_split(config: &RunConfig) -> Result<SplitReport> {
    run_split_with(config, &ZipBundler::default())
}

/// Runs a split, packing each group with `emitter`.
///
/// Defects never surface as `Err`; they are in the report. `Err` is reserved
/// for failures outside the batch itself, such as an unlistable input directory.
pub fn run_split_with(config: &RunConfig, emitter: &dyn BundleEmitter) -> Result<SplitReport> {
    let mut ctx = BatchContext::new(config.clone());
    log::info!(
        "Site {}: splitting batch in {}",
        config.site_code,
        config.input_dir.display()
    );

    load_batch(&mut ctx)?;
    if let Err(halt) = ctx.gate(Stage::Load) {
        return Ok(SplitReport::halted(ctx, halt));
    }

    if ctx.config.apply_exclusions {
        let (mapped, sampled) = ctx.apply_exclusions();
        log::info!(
            "Excluded {} mapping entries and {} genotype records",
            mapped,
            sampled
        );
    }

    let defects = validate_batch(&ctx);
    ctx.extend_defects(defects);
    if let Err(halt) = ctx.gate(Stage::Validate) {
        return Ok(SplitReport::halted(ctx, halt));
    }

    let (bundles, failures) = emit_groups(&ctx, emitter);
    ctx.extend_defects(failures);
    let halted_at = ctx.gate(Stage::Emit).err().map(|halt| {
        log::error!("{}", halt);
        halt.stage
    });

    Ok(SplitReport {
        defects: ctx.into_defects(),
        halted_at,
        bundles,
    })
}

/// Reads the mapping table, the exclude list and every `.map`/`.ped` pair into `ctx`.
fn load_batch(ctx: &mut BatchContext) -> Result<()> {
    let mapping = read_mapping_table(&ctx.config.mapping_path);
    ctx.extend_defects(mapping.defects);
    ctx.set_mapping(mapping.rows);

    match read_exclude_list(&ctx.config.exclude_path) {
        Ok(Some(excluded)) => {
            log::info!(
                "Loaded {} excluded chip ids from {}",
                excluded.len(),
                ctx.config.exclude_path.display()
            );
            ctx.set_exclusions(excluded);
        }
        Ok(None) => {}
        Err(e) if ctx.config.apply_exclusions => ctx.record(Defect::Unreadable {
            path: ctx.config.exclude_path.clone(),
            reason: format!("{:#}", e),
        }),
        Err(e) => log::warn!("Ignoring exclude list: {:#}", e),
    }

    let pairs = discover_input_pairs(&ctx.config.input_dir)?;
    ctx.extend_defects(pairs.defects);

    for pair in pairs.rows {
        let markers = read_marker_table(&pair.marker_path);
        ctx.extend_defects(markers.defects);
        // Without markers there is no expected .ped width to check against.
        if markers.rows.is_empty() {
            continue;
        }

        let samples = read_sample_table(&pair.sample_path, markers.rows.len());
        ctx.extend_defects(samples.defects);
        log::info!(
            "{}: {} markers, {} samples",
            pair.stem,
            markers.rows.len(),
            samples.rows.len()
        );
        ctx.add_marker_table(pair.stem.clone(), markers.rows);
        ctx.add_sample_table(pair.stem, samples.rows);
    }
    Ok(())
}

/// Partitions the batch and writes one bundle per group.
///
/// A failing group is recorded and the remaining groups are still written.
fn emit_groups(ctx: &BatchContext, emitter: &dyn BundleEmitter) -> (Vec<PathBuf>, Vec<Defect>) {
    let groups = match partition(ctx) {
        Ok(groups) => groups,
        Err(defect) => return (Vec::new(), vec![defect]),
    };

    let mut bundles = Vec::with_capacity(groups.len());
    let mut failures = Vec::new();
    for group in &groups {
        let stem = output_stem(&group.label, &ctx.config.timestamp);
        match write_bundle(&ctx.config.output_dir, &stem, group, emitter) {
            Ok(archive) => bundles.push(archive),
            Err(e) => failures.push(Defect::BundleWriteFailure {
                group: group.label.clone(),
                reason: format!("{:#}", e),
            }),
        }
    }
    (bundles, failures)
}
