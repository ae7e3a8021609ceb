//! Stable versus prerelease classification of release versions.
//!
//! Only a bare `v<major>.<minor>.<patch>` tag is stable. Anything else,
//! including suffixed tags and commit-hash fallbacks, is a prerelease.

use super::version::ReleaseVersion;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Pattern a version must match exactly to count as stable.
pub const STABLE_VERSION_PATTERN: &str = r"^v[0-9]+\.[0-9]+\.[0-9]+$";

static STABLE_VERSION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(STABLE_VERSION_PATTERN).ok());

/// Whether a release should be marked stable or prerelease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityVerdict {
    /// A final release; becomes the latest release.
    Stable,
    /// Anything that is not a final release.
    Prerelease,
}

impl StabilityVerdict {
    /// Return `true` for [`StabilityVerdict::Stable`].
    #[must_use]
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Stable)
    }

    /// The `prerelease` flag sent to the publisher.
    #[must_use]
    pub const fn prerelease(self) -> bool {
        !self.is_stable()
    }

    /// The `make_latest` flag sent to the publisher.
    #[must_use]
    pub const fn make_latest(self) -> bool {
        self.is_stable()
    }
}

impl fmt::Display for StabilityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => f.write_str("stable"),
            Self::Prerelease => f.write_str("prerelease"),
        }
    }
}

/// Return `true` iff `value` is exactly `v<digits>.<digits>.<digits>`.
///
/// # Examples
///
/// ```
/// use release_packager::artefact::stability::is_stable_str;
///
/// assert!(is_stable_str("v1.2.3"));
/// assert!(!is_stable_str("v1.2.3-rc1"));
/// assert!(!is_stable_str("nightly"));
/// ```
#[must_use]
pub fn is_stable_str(value: &str) -> bool {
    STABLE_VERSION
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

/// Return `true` iff `version` denotes a stable release.
#[must_use]
pub fn is_stable(version: &ReleaseVersion) -> bool {
    is_stable_str(version.value())
}

/// Classify `version` as stable or prerelease.
#[must_use]
pub fn classify(version: &ReleaseVersion) -> StabilityVerdict {
    if is_stable(version) {
        StabilityVerdict::Stable
    } else {
        StabilityVerdict::Prerelease
    }
}
