//! Error types for bundle construction.
//!
//! Every failure records the stage it happened in and the path involved so
//! that per-artifact reports can say exactly what went wrong.

use super::archive::ArchiveError;
use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// The step of bundle construction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleStage {
    /// Creating the staging directory.
    Stage,
    /// Copying the binary into the staging directory.
    Copy,
    /// Setting the execute permission.
    Permissions,
    /// Writing the archive.
    Archive,
    /// Moving the archive into the output directory.
    Move,
}

impl fmt::Display for BundleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stage => "stage",
            Self::Copy => "copy",
            Self::Permissions => "permissions",
            Self::Archive => "archive",
            Self::Move => "move",
        };
        f.write_str(label)
    }
}

/// Errors arising while building a single release bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A file system operation failed.
    #[error("{stage} failed for {path}: {source}")]
    Io {
        /// Step that failed.
        stage: BundleStage,
        /// Path being operated on.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the archive failed.
    #[error("archive failed for {path}: {source}")]
    Archive {
        /// Archive being written.
        path: Utf8PathBuf,
        /// Underlying archive error.
        #[source]
        source: ArchiveError,
    },
}

impl BundleError {
    /// The stage this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> BundleStage {
        match self {
            Self::Io { stage, .. } => *stage,
            Self::Archive { .. } => BundleStage::Archive,
        }
    }

    /// Build a `map_err` adapter that tags an I/O error with its stage and path.
    pub(crate) fn io(
        stage: BundleStage,
        path: impl Into<Utf8PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let owned = path.into();
        move |source| Self::Io {
            stage,
            path: owned,
            source,
        }
    }
}
