//! Error types for release publishing.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors arising while collecting archives or talking to the release store.
#[derive(Debug, Error)]
pub enum PublishError {
    /// A publisher command exited unsuccessfully.
    #[error("`{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status, or `"signal"` when the process was killed.
        status: String,
        /// Trimmed standard error of the command.
        stderr: String,
    },

    /// A publisher command printed something that could not be understood.
    #[error("unexpected output from `{command}`: {reason}")]
    UnexpectedOutput {
        /// The command line that was run.
        command: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// The release exists but the request forbids updating it.
    #[error("release {tag} already exists and updating existing releases is disabled")]
    ReleaseExists {
        /// The conflicting tag.
        tag: String,
    },

    /// The request named an asset that is not on disk.
    #[error("release asset not found: {0}")]
    MissingAsset(Utf8PathBuf),

    /// Spawning a command or reading the output directory failed.
    #[error("I/O error during publishing: {0}")]
    Io(#[from] std::io::Error),

    /// The archive glob pattern was invalid.
    #[error("invalid archive pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Reading a globbed path failed.
    #[error("failed to read archive path: {0}")]
    Glob(#[from] glob::GlobError),

    /// A globbed path is not valid UTF-8.
    #[error("archive path is not valid UTF-8: {0}")]
    NonUtf8Path(#[from] camino::FromPathBufError),
}
