use anyhow::{bail, Context, Result};
use breedsplit_core::config::{
    is_valid_site_code, run_timestamp, DEFAULT_EXCLUDE_FILE, DEFAULT_MAPPING_FILE,
    DEFAULT_MIN_GROUP_SIZE, SITE_CODE_LEN,
};
use breedsplit_core::RunConfig;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// breedsplit: validate a PLINK .map/.ped batch and split it into per-breed bundles
#[derive(Parser)]
#[command(name = "breedsplit", version)]
struct Cli {
    /// Directory scanned for .map/.ped pairs
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,

    /// Directory the per-group archives are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Mapping table: chip id, target sample name, group label (tab-separated, no header)
    #[arg(long, default_value = DEFAULT_MAPPING_FILE)]
    mapping: PathBuf,

    /// Exclude list, one chip id per line
    #[arg(long, default_value = DEFAULT_EXCLUDE_FILE)]
    exclude: PathBuf,

    /// Drop excluded chip ids before validation instead of only reporting them
    #[arg(long, default_value_t = false)]
    apply_exclusions: bool,

    /// Require the V1PLUS reference markers in the marker template
    #[arg(long, default_value_t = false)]
    check_chip: bool,

    /// Warn about groups with fewer samples than this
    #[arg(long, default_value_t = DEFAULT_MIN_GROUP_SIZE)]
    min_group_size: usize,

    /// Four-character site code; asked for on stdin when absent
    #[arg(long)]
    site_code: Option<String>,

    /// Debug-level logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn set_log_level(verbose: bool, quiet: bool) {
    let mut log_level = LevelFilter::Info;
    if verbose {
        log_level = LevelFilter::Debug;
    }
    if quiet {
        log_level = LevelFilter::Error;
    }
    let mut builder = Builder::new();
    builder.filter_level(log_level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp(None);
    // Only fails if a logger is already installed.
    let _ = builder.try_init();
}

/// Asks for a site code until a valid one is entered.
fn prompt_site_code<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<String> {
    loop {
        write!(output, "Enter the {}-character site code: ", SITE_CODE_LEN)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("reading site code")? == 0 {
            bail!("no site code given");
        }
        if is_valid_site_code(&line) {
            return Ok(line.trim().to_string());
        }
        writeln!(
            output,
            "Site code must be exactly {} characters, got {:?}",
            SITE_CODE_LEN,
            line.trim()
        )?;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    set_log_level(cli.verbose, cli.quiet);

    let site_code = match cli.site_code {
        Some(code) if is_valid_site_code(&code) => code.trim().to_string(),
        Some(code) => {
            eprintln!(
                "Invalid site code {:?}: must be exactly {} characters",
                code, SITE_CODE_LEN
            );
            std::process::exit(1);
        }
        None => prompt_site_code(io::stdin().lock(), io::stderr())?,
    };

    let config = RunConfig {
        input_dir: cli.input_dir,
        output_dir: cli.output_dir,
        mapping_path: cli.mapping,
        exclude_path: cli.exclude,
        apply_exclusions: cli.apply_exclusions,
        check_chip_format: cli.check_chip,
        min_group_size: cli.min_group_size,
        site_code,
        timestamp: run_timestamp(),
    };

    let report = breedsplit_split::run_split(&config)?;
    if !report.is_success() {
        for defect in &report.defects {
            log::error!("{}", defect);
        }
        eprintln!("breedsplit failed with {} defect(s)", report.defects.len());
        std::process::exit(1);
    }

    println!(
        "Split complete: {} bundle(s) written to {}",
        report.bundles.len(),
        config.output_dir.display()
    );
    Ok(())
}
