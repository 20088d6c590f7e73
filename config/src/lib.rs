use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

// sentinels
pub const NA: &str = "NA";
pub const ON_TARGET: &str = "Y";
pub const OFF_TARGET: &str = "N";
pub const NO_ORF: &str = "NoORF";

// separators
pub const GROUP_SEP: char = '\t';
pub const MEMBER_SEP: char = ',';
pub const TSV_DELIMITER: u8 = b'\t';

// suffixes
pub const CCS_SUFFIX: &str = "/ccs";
pub const ORF_GROUP_SUFFIX: &str = ".group.txt";
pub const ORF_FASTA_SUFFIX: &str = ".faa";

// output
pub const OUTPUT_FIELDS: [&str; 10] = [
    "id",
    "pbid",
    "length",
    "transcript",
    "gene",
    "category",
    "ontarget",
    "ORFgroup",
    "BC_1",
    "BC_2",
];

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progressbar_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} {pos}/{len} ETA {eta_precise} ")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let progress_bar = ProgressBar::new(length);

    progress_bar.set_style(progressbar_style);
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// append a literal suffix to a path prefix: `dedup` + `.faa` -> `dedup.faa`
pub fn with_suffix<P: AsRef<Path>>(prefix: P, suffix: &str) -> PathBuf {
    let mut path: OsString = prefix.as_ref().as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// argument checker for collate runs
///
/// Checks run in a fixed order: the output must not exist yet, then every
/// required input must exist, then every optional input that was given.
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        self.check_output()?;
        self.check_inputs()?;
        self.check_optionals()?;

        Ok(())
    }

    fn check_output(&self) -> Result<(), CliError> {
        let output = self.get_output();
        if output.exists() {
            return Err(CliError::OutputExists(output.to_path_buf()));
        }

        Ok(())
    }

    fn check_inputs(&self) -> Result<(), CliError> {
        for (label, path) in self.get_inputs() {
            validate(label, &path)?;
        }

        Ok(())
    }

    fn check_optionals(&self) -> Result<(), CliError> {
        let optionals = self.get_optionals();
        if optionals.is_empty() {
            log::info!("No optional inputs provided. Skipping...");
        }

        for (label, path) in optionals {
            validate(label, &path)?;
        }

        Ok(())
    }

    fn get_output(&self) -> &Path;
    fn get_inputs(&self) -> Vec<(&'static str, PathBuf)>;
    fn get_optionals(&self) -> Vec<(&'static str, PathBuf)>;
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Output file {0:?} already exists. Abort!")]
    OutputExists(PathBuf),
    #[error("{label} {path:?} not found. Abort!")]
    MissingFile { label: &'static str, path: PathBuf },
}

/// argument validation
pub fn validate(label: &'static str, arg: &Path) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::MissingFile {
            label,
            path: arg.to_path_buf(),
        });
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!(
            "{label} {:?} is not a file",
            arg
        )));
    }

    Ok(())
}
