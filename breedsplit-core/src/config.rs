use std::path::PathBuf;

pub const DEFAULT_MAPPING_FILE: &str = "split_plink.txt";
pub const DEFAULT_EXCLUDE_FILE: &str = "exclude_chipid.txt";
pub const DEFAULT_MIN_GROUP_SIZE: usize = 100;
pub const SITE_CODE_LEN: usize = 4;

/// Settings for one split run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory scanned for `.map`/`.ped` pairs.
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub mapping_path: PathBuf,
    pub exclude_path: PathBuf,
    /// Drop excluded chip ids before validation. Off by default; the list is only logged.
    pub apply_exclusions: bool,
    /// Require the V1PLUS reference markers in the template `.map`.
    pub check_chip_format: bool,
    /// Groups smaller than this get a warning.
    pub min_group_size: usize,
    pub site_code: String,
    /// Suffix shared by every output stem of the run.
    pub timestamp: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            mapping_path: PathBuf::from(DEFAULT_MAPPING_FILE),
            exclude_path: PathBuf::from(DEFAULT_EXCLUDE_FILE),
            apply_exclusions: false,
            check_chip_format: false,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            site_code: String::new(),
            timestamp: run_timestamp(),
        }
    }
}

/// Local wall-clock time with second resolution, e.g. `20250314093012`.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// A site code is exactly four characters after trimming.
pub fn is_valid_site_code(code: &str) -> bool {
    code.trim().chars().count() == SITE_CODE_LEN
}
