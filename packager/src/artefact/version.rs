//! Release version resolution with commit-hash fallback.
//!
//! The CI trigger supplies a tag name when one exists. Untagged runs fall
//! back to an abbreviated commit hash so every archive still carries a
//! unique, deterministic version component.

use super::error::{ArtefactError, Result};
use std::fmt;

/// Number of commit characters used when no tag is available.
pub const COMMIT_FALLBACK_LEN: usize = 8;

/// Where a [`ReleaseVersion`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// The trigger supplied a tag name.
    Tag,
    /// No tag was supplied; the version is an abbreviated commit hash.
    CommitFallback,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => f.write_str("tag"),
            Self::CommitFallback => f.write_str("commit fallback"),
        }
    }
}

/// The effective version embedded in archive names and used as the
/// release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    value: String,
    source: VersionSource,
}

impl ReleaseVersion {
    /// The version string, e.g. `v0.3.0` or `deadbeef`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Which input the version was taken from.
    #[must_use]
    pub const fn source(&self) -> VersionSource {
        self.source
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Resolve the release version from a tag name and a commit SHA.
///
/// A non-empty tag wins. Otherwise the first eight characters of the commit
/// are used. Surrounding whitespace is ignored on both inputs.
///
/// # Errors
///
/// Returns [`ArtefactError::MissingVersionContext`] when both inputs are
/// empty, and [`ArtefactError::InvalidVersion`] when the chosen value
/// cannot be used inside a file name.
///
/// # Examples
///
/// ```
/// use release_packager::artefact::version::{VersionSource, resolve};
///
/// let tagged = resolve("v1.2.3", "abcdef1234567890").expect("tag present");
/// assert_eq!(tagged.value(), "v1.2.3");
/// assert_eq!(tagged.source(), VersionSource::Tag);
///
/// let untagged = resolve("", "abcdef1234567890").expect("commit present");
/// assert_eq!(untagged.value(), "abcdef12");
/// assert_eq!(untagged.source(), VersionSource::CommitFallback);
/// ```
pub fn resolve(tag_name: &str, commit_sha: &str) -> Result<ReleaseVersion> {
    let tag = tag_name.trim();
    let commit = commit_sha.trim();

    let version = if !tag.is_empty() {
        ReleaseVersion {
            value: tag.to_owned(),
            source: VersionSource::Tag,
        }
    } else if !commit.is_empty() {
        ReleaseVersion {
            value: commit.chars().take(COMMIT_FALLBACK_LEN).collect(),
            source: VersionSource::CommitFallback,
        }
    } else {
        return Err(ArtefactError::MissingVersionContext);
    };

    validate_version(&version.value)?;
    Ok(version)
}

fn validate_version(value: &str) -> Result<()> {
    if let Some(bad) = value
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_whitespace() || c.is_control())
    {
        return Err(ArtefactError::InvalidVersion {
            value: value.to_owned(),
            reason: format!("character {bad:?} cannot appear in an archive name"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::any_commit("abcdef1234567890")]
    #[case::empty_commit("")]
    fn tag_takes_precedence(#[case] commit: &str) {
        let version = resolve("v1.2.3", commit).expect("tag present");
        assert_eq!(version.value(), "v1.2.3");
        assert_eq!(version.source(), VersionSource::Tag);
    }

    #[test]
    fn empty_tag_falls_back_to_eight_commit_characters() {
        let version = resolve("", "abcdef1234567890").expect("commit present");
        assert_eq!(version.value(), "abcdef12");
        assert_eq!(version.source(), VersionSource::CommitFallback);
    }

    #[test]
    fn whitespace_tag_counts_as_empty() {
        let version = resolve("  \n", "deadbeefcafe0000").expect("commit present");
        assert_eq!(version.value(), "deadbeef");
        assert_eq!(version.source(), VersionSource::CommitFallback);
    }

    #[test]
    fn short_commit_is_used_whole() {
        let version = resolve("", "abc12").expect("commit present");
        assert_eq!(version.value(), "abc12");
    }

    #[rstest]
    #[case::both_empty("", "")]
    #[case::both_blank(" ", "\t")]
    fn missing_context_is_an_error(#[case] tag: &str, #[case] commit: &str) {
        assert_eq!(
            resolve(tag, commit),
            Err(ArtefactError::MissingVersionContext)
        );
    }

    #[rstest]
    #[case::slash("release/v1")]
    #[case::inner_space("v1 beta")]
    fn rejects_versions_unusable_in_file_names(#[case] tag: &str) {
        let err = resolve(tag, "abcdef12").expect_err("invalid version");
        assert!(matches!(err, ArtefactError::InvalidVersion { .. }));
    }

    #[test]
    fn display_shows_value() {
        let version = resolve("nightly", "").expect("tag present");
        assert_eq!(version.to_string(), "nightly");
        assert_eq!(version.source().to_string(), "tag");
    }
}
