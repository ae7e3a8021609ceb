//! Error types for artefact naming, version resolution, and file name parsing.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// The program name is empty or cannot appear in a file name.
    #[error("invalid program name \"{value}\": {reason}")]
    InvalidProgramName {
        /// The rejected program name.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A binary's file name does not carry the expected program prefix.
    #[error("malformed binary name \"{file_name}\": expected \"{expected_prefix}<platform>[.ext]\"")]
    MalformedFileName {
        /// The rejected file name.
        file_name: String,
        /// The prefix every binary must start with.
        expected_prefix: String,
    },

    /// Neither a tag nor a commit identifier was supplied.
    #[error("no version context: both the tag name and the commit SHA are empty")]
    MissingVersionContext,

    /// The resolved version cannot be embedded in an archive name.
    #[error("invalid release version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
