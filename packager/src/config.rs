//! Packager configuration: an optional TOML file overlaid by CLI flags.
//!
//! The file uses the same names as the long flags, with underscores:
//!
//! ```toml
//! program = "tabby"
//! input_dir = "binaries"
//! output_dir = "dist"
//! failure_policy = "omit-failed"
//! jobs = 4
//! repo = "TabbyML/tabby"
//! ```
//!
//! Tag and commit are deliberately absent: they describe the trigger, not
//! the project, and are only accepted on the command line.

use crate::artefact::error::ArtefactError;
use crate::artefact::program_name::ProgramName;
use crate::cli::Cli;
use crate::pipeline::FailurePolicy;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// The file that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// The file that was parsed.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A required setting was given neither as a flag nor in the file.
    #[error("missing required setting `{key}` (pass --{flag} or set it in the config file)")]
    Missing {
        /// Key in the configuration file.
        key: &'static str,
        /// Equivalent command-line flag, without the leading dashes.
        flag: &'static str,
    },

    /// The program name cannot be used as a file name prefix.
    #[error(transparent)]
    InvalidProgram(#[from] ArtefactError),

    /// `jobs` was zero.
    #[error("jobs must be at least 1")]
    ZeroJobs,
}

/// Settings read from the configuration file. Every key is optional.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Program name.
    pub program: Option<String>,
    /// Directory holding the compiled binaries.
    pub input_dir: Option<Utf8PathBuf>,
    /// Directory receiving the archives.
    pub output_dir: Option<Utf8PathBuf>,
    /// Root for staging directories.
    pub staging_dir: Option<Utf8PathBuf>,
    /// Treatment of failed artifacts.
    pub failure_policy: Option<FailurePolicy>,
    /// Number of parallel packaging jobs.
    pub jobs: Option<usize>,
    /// Repository to publish to.
    pub repo: Option<String>,
}

impl FileConfig {
    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagerConfig {
    /// Program name shared by every binary.
    pub program: ProgramName,
    /// Directory holding the compiled binaries.
    pub input_dir: Utf8PathBuf,
    /// Directory receiving the archives.
    pub output_dir: Utf8PathBuf,
    /// Staging root; a temporary directory when `None`.
    pub staging_dir: Option<Utf8PathBuf>,
    /// Treatment of failed artifacts.
    pub failure_policy: FailurePolicy,
    /// Size of the packaging pool; rayon's default when `None`.
    pub jobs: Option<usize>,
    /// Repository passed to the publisher.
    pub repo: Option<String>,
}

impl PackagerConfig {
    /// Load the file named by `--config`, if any, and overlay the flags.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable or invalid, or a
    /// required setting is missing.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Overlay `cli` on `file`; flags win wherever both are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `program`, `input_dir`, or
    /// `output_dir` is unset, [`ConfigError::InvalidProgram`] for an
    /// unusable program name, and [`ConfigError::ZeroJobs`] for `jobs = 0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use release_packager::cli::Cli;
    /// use release_packager::config::{FileConfig, PackagerConfig};
    ///
    /// let cli = Cli::parse_from(["release-packager", "-o", "out"]);
    /// let file = FileConfig {
    ///     program: Some("tabby".to_owned()),
    ///     input_dir: Some("binaries".into()),
    ///     output_dir: Some("dist".into()),
    ///     ..FileConfig::default()
    /// };
    ///
    /// let config = PackagerConfig::resolve(&cli, file)?;
    /// assert_eq!(config.output_dir, "out");
    /// assert_eq!(config.input_dir, "binaries");
    /// # Ok::<(), release_packager::config::ConfigError>(())
    /// ```
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let program = cli
            .program
            .clone()
            .or(file.program)
            .ok_or(ConfigError::Missing {
                key: "program",
                flag: "program",
            })?;
        let input_dir = cli
            .input_dir
            .clone()
            .or(file.input_dir)
            .ok_or(ConfigError::Missing {
                key: "input_dir",
                flag: "input-dir",
            })?;
        let output_dir = cli
            .output_dir
            .clone()
            .or(file.output_dir)
            .ok_or(ConfigError::Missing {
                key: "output_dir",
                flag: "output-dir",
            })?;
        let jobs = cli.jobs.or(file.jobs);
        if jobs == Some(0) {
            return Err(ConfigError::ZeroJobs);
        }

        Ok(Self {
            program: ProgramName::try_from(program)?,
            input_dir,
            output_dir,
            staging_dir: cli.staging_dir.clone().or(file.staging_dir),
            failure_policy: cli
                .failure_policy
                .or(file.failure_policy)
                .unwrap_or_default(),
            jobs,
            repo: cli.repo.clone().or(file.repo),
        })
    }
}
