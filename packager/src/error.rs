//! Run-level error type for the release packager.
//!
//! Per-artifact problems never surface here; they are collected in the
//! packaging report. These variants abort a run or summarise its failure.

use crate::artefact::bundle_error::BundleError;
use crate::artefact::error::ArtefactError;
use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::publish::PublishError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that end a packaging run.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The version could not be resolved from the trigger inputs.
    #[error("version resolution failed: {0}")]
    Artefact(#[from] ArtefactError),

    /// The configuration file or flags were invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The input directory could not be scanned.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The input directory holds no binaries.
    #[error("no binaries found in {input_dir}")]
    NoArtifacts {
        /// The scanned directory.
        input_dir: Utf8PathBuf,
    },

    /// The staging or output directory could not be created.
    #[error("failed to prepare directories: {0}")]
    Prepare(#[source] BundleError),

    /// The worker pool could not be started.
    #[error("failed to start packaging workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Some artifacts failed to package.
    #[error("{failed} of {total} artifact(s) failed to package")]
    ArtifactsFailed {
        /// Number of failed artifacts.
        failed: usize,
        /// Number of artifacts attempted.
        total: usize,
    },

    /// The release upsert failed.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing_version(
        PackagerError::Artefact(ArtefactError::MissingVersionContext),
        "version resolution failed: no version context"
    )]
    #[case::no_artifacts(
        PackagerError::NoArtifacts { input_dir: Utf8PathBuf::from("binaries") },
        "no binaries found in binaries"
    )]
    #[case::artifacts_failed(
        PackagerError::ArtifactsFailed { failed: 1, total: 3 },
        "1 of 3 artifact(s) failed to package"
    )]
    fn messages_name_the_problem(#[case] err: PackagerError, #[case] expected: &str) {
        assert!(
            err.to_string().starts_with(expected),
            "unexpected message: {err}"
        );
    }
}
