//! Release publishing: request assembly and idempotent upsert.
//!
//! The packager decides *what* to publish and with which flags; the
//! [`ReleasePublisher`] collaborator performs the side effects. The upsert
//! logic lives here so it can be exercised against any publisher:
//!
//! 1. Look up the release for the tag.
//! 2. Existing release: update its flags, then delete every old asset.
//!    Missing release: create it.
//! 3. Upload each archive.
//!
//! Rerunning the same tag therefore never accumulates duplicate assets.
//!
//! # Sub-modules
//!
//! - [`error`] — Error types for publishing.
//! - [`gh`] — `ReleasePublisher` backed by the GitHub CLI.
//! - `memory` — In-memory release store (tests and `test-support`).

pub mod error;
pub mod gh;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use error::PublishError;

use crate::artefact::archive::ArchiveFormat;
use crate::artefact::stability::StabilityVerdict;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Serialize;
use std::fmt;

/// The CI event that started the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TriggerContext {
    /// A push of a tag or branch; the only context that publishes.
    Push,
    /// A manually dispatched run.
    #[default]
    Manual,
    /// Pull request validation.
    PullRequest,
}

impl fmt::Display for TriggerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => f.write_str("push"),
            Self::Manual => f.write_str("manual"),
            Self::PullRequest => f.write_str("pull-request"),
        }
    }
}

/// Whether a run performs the publish side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Package and publish.
    Publish,
    /// Package and validate only.
    DryRun,
}

impl PublishMode {
    /// Derive the mode from the trigger. Only [`TriggerContext::Push`]
    /// publishes, and `force_dry_run` overrides even that.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_packager::publish::{PublishMode, TriggerContext};
    ///
    /// assert_eq!(PublishMode::for_trigger(TriggerContext::Push, false), PublishMode::Publish);
    /// assert_eq!(PublishMode::for_trigger(TriggerContext::Push, true), PublishMode::DryRun);
    /// assert_eq!(PublishMode::for_trigger(TriggerContext::Manual, false), PublishMode::DryRun);
    /// ```
    #[must_use]
    pub const fn for_trigger(trigger: TriggerContext, force_dry_run: bool) -> Self {
        match (trigger, force_dry_run) {
            (TriggerContext::Push, false) => Self::Publish,
            _ => Self::DryRun,
        }
    }

    /// Return `true` for [`PublishMode::DryRun`].
    #[must_use]
    pub const fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Everything the publish collaborator needs for one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    /// Archives to attach, in upload order.
    pub artifact_paths: Vec<Utf8PathBuf>,
    /// Tag the release record is keyed by.
    pub tag: String,
    /// Mark the release as a prerelease.
    pub prerelease: bool,
    /// Mark the release as the latest release.
    pub make_latest: bool,
    /// Update an existing release instead of failing.
    pub update_existing: bool,
    /// Remove the existing release's assets before uploading.
    pub remove_old_artifacts: bool,
}

impl PublishRequest {
    /// Build an upsert request whose flags follow `verdict`.
    #[must_use]
    pub fn new(
        tag: impl Into<String>,
        artifact_paths: Vec<Utf8PathBuf>,
        verdict: StabilityVerdict,
    ) -> Self {
        Self {
            artifact_paths,
            tag: tag.into(),
            prerelease: verdict.prerelease(),
            make_latest: verdict.make_latest(),
            update_existing: true,
            remove_old_artifacts: true,
        }
    }

    /// File names of the archives, as they will appear on the release.
    #[must_use]
    pub fn asset_names(&self) -> Vec<&str> {
        self.artifact_paths
            .iter()
            .filter_map(|path| path.file_name())
            .collect()
    }

    /// Pretty-printed JSON rendering, used for dry-run reports.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the request cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A release as reported by the publish collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Tag the release is keyed by.
    pub tag: String,
    /// Whether the release is marked as a prerelease.
    pub prerelease: bool,
    /// Names of the attached assets.
    pub assets: Vec<String>,
}

/// What an upsert changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// `true` when the release did not exist beforehand.
    pub created: bool,
    /// Assets deleted from the existing release.
    pub removed_assets: Vec<String>,
    /// Assets uploaded by this run.
    pub uploaded_assets: Vec<String>,
}

/// The side-effecting release store.
///
/// Implementations perform one remote operation per call. The upsert
/// sequence is driven by [`publish_distribution`].
#[cfg_attr(test, mockall::automock)]
pub trait ReleasePublisher {
    /// Look up the release for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the lookup itself fails. A missing
    /// release is `Ok(None)`.
    fn find_release(&self, tag: &str) -> Result<Option<ReleaseRecord>, PublishError>;

    /// Create a release with the request's tag and flags.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the release cannot be created.
    fn create_release(&self, request: &PublishRequest) -> Result<(), PublishError>;

    /// Apply the request's flags to an existing release.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the release cannot be updated.
    fn update_release(&self, request: &PublishRequest) -> Result<(), PublishError>;

    /// Remove the asset called `asset_name` from the release for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the asset cannot be removed.
    fn delete_asset(&self, tag: &str, asset_name: &str) -> Result<(), PublishError>;

    /// Attach the archive at `path` to the release for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the upload fails.
    fn upload_asset(&self, tag: &str, path: &Utf8Path) -> Result<(), PublishError>;
}

/// List the archives in `output_dir` whose names start with `name_prefix`.
///
/// Matches every supported archive extension and returns the paths sorted.
///
/// # Errors
///
/// Returns [`PublishError`] if a pattern is invalid, a directory entry
/// cannot be read, or a path is not UTF-8.
pub fn collect_archives(
    output_dir: &Utf8Path,
    name_prefix: &str,
) -> Result<Vec<Utf8PathBuf>, PublishError> {
    let mut archives = Vec::new();
    for format in ArchiveFormat::all() {
        let pattern = format!(
            "{}/{}*{}",
            glob::Pattern::escape(output_dir.as_str()),
            glob::Pattern::escape(name_prefix),
            format.extension()
        );
        for entry in glob::glob(&pattern)? {
            let path = Utf8PathBuf::try_from(entry?)?;
            if path.is_file() {
                archives.push(path);
            }
        }
    }
    archives.sort();
    archives.dedup();
    Ok(archives)
}

/// Upsert the release described by `request`.
///
/// Every archive is checked before the store is touched, so a missing file
/// fails the publish without modifying the remote release.
///
/// # Errors
///
/// Returns [`PublishError::MissingAsset`] for absent archives,
/// [`PublishError::ReleaseExists`] when the release exists and
/// `update_existing` is off, and any error raised by `publisher`.
pub fn publish_distribution(
    publisher: &dyn ReleasePublisher,
    request: &PublishRequest,
) -> Result<PublishOutcome, PublishError> {
    if let Some(missing) = request.artifact_paths.iter().find(|path| !path.is_file()) {
        return Err(PublishError::MissingAsset(missing.clone()));
    }

    let mut outcome = PublishOutcome::default();
    match publisher.find_release(&request.tag)? {
        Some(existing) => {
            if !request.update_existing {
                return Err(PublishError::ReleaseExists {
                    tag: request.tag.clone(),
                });
            }
            info!("updating existing release {}", request.tag);
            publisher.update_release(request)?;
            if request.remove_old_artifacts {
                for asset in existing.assets {
                    debug!("removing old asset {asset} from {}", request.tag);
                    publisher.delete_asset(&request.tag, &asset)?;
                    outcome.removed_assets.push(asset);
                }
            }
        }
        None => {
            info!("creating release {}", request.tag);
            publisher.create_release(request)?;
            outcome.created = true;
        }
    }

    for path in &request.artifact_paths {
        debug!("uploading {path} to {}", request.tag);
        publisher.upload_asset(&request.tag, path)?;
        outcome
            .uploaded_assets
            .push(path.file_name().unwrap_or(path.as_str()).to_owned());
    }

    info!(
        "published {} asset(s) to {} (prerelease: {}, latest: {})",
        outcome.uploaded_assets.len(),
        request.tag,
        request.prerelease,
        request.make_latest
    );
    Ok(outcome)
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
