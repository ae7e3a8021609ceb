//! Packaging and publishing pipeline orchestration.
//!
//! A run resolves the release version, discovers the input binaries,
//! packages each one as an independent job on a rayon pool, and then
//! decides from the [`FailurePolicy`] and [`PublishMode`] whether the
//! resulting distribution set is handed to the publisher.
//!
//! Jobs share nothing mutable: each one owns its staging directory and
//! archive name, which are disjoint per platform. Results are gathered
//! only once every job has finished.

use crate::artefact::bundle::{BundleBuilder, ReleaseBundle};
use crate::artefact::bundle_error::BundleError;
use crate::artefact::error::ArtefactError;
use crate::artefact::platform::SourceArtifact;
use crate::artefact::program_name::ProgramName;
use crate::artefact::stability::{StabilityVerdict, classify};
use crate::artefact::version::{ReleaseVersion, resolve};
use crate::config::PackagerConfig;
use crate::discovery::{discover_binaries, exclude_nested};
use crate::error::{PackagerError, Result};
use crate::publish::{
    PublishMode, PublishOutcome, PublishRequest, ReleasePublisher, collect_archives,
    publish_distribution,
};
use camino::{Utf8Path, Utf8PathBuf};
use log::{error, info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// How a run treats artifacts that failed to package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Any failure blocks publishing.
    #[default]
    FailFast,
    /// Failures are reported and left out; the rest is published.
    OmitFailed,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail-fast"),
            Self::OmitFailed => f.write_str("omit-failed"),
        }
    }
}

/// Why a single artifact could not be packaged.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The file name does not follow `<program>_<platform>[.ext]`.
    #[error(transparent)]
    Malformed(#[from] ArtefactError),

    /// Another input already claimed the same platform identifier.
    #[error("duplicate platform {platform_id}: already provided by {first}")]
    DuplicatePlatform {
        /// The contested platform identifier.
        platform_id: String,
        /// The input that claimed it first.
        first: Utf8PathBuf,
    },

    /// Building the bundle failed.
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

impl ArtifactError {
    /// Short label for the step that failed, e.g. `decompose` or `copy`.
    #[must_use]
    pub fn stage(&self) -> String {
        match self {
            Self::Malformed(_) | Self::DuplicatePlatform { .. } => "decompose".to_owned(),
            Self::Bundle(err) => err.stage().to_string(),
        }
    }
}

/// A failed artifact and its cause.
#[derive(Debug)]
pub struct ArtifactFailure {
    /// The input binary.
    pub source_path: Utf8PathBuf,
    /// What went wrong.
    pub error: ArtifactError,
}

impl ArtifactFailure {
    /// File name of the input binary.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.source_path
            .file_name()
            .unwrap_or(self.source_path.as_str())
    }
}

impl fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.file_name(),
            self.error.stage(),
            self.error
        )
    }
}

/// Per-artifact results of a packaging pass.
#[derive(Debug, Default)]
pub struct PackagingReport {
    /// Finished bundles, ordered by platform identifier.
    pub bundles: Vec<ReleaseBundle>,
    /// Failed artifacts, ordered by input path.
    pub failures: Vec<ArtifactFailure>,
}

impl PackagingReport {
    /// Number of artifacts attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.bundles.len() + self.failures.len()
    }

    /// Return `true` when every artifact was bundled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The archives of one release plus how it should be flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSet {
    /// Tag the release is keyed by.
    pub tag: String,
    /// Stable or prerelease.
    pub verdict: StabilityVerdict,
    /// Bundles to publish, ordered by platform identifier.
    pub bundles: Vec<ReleaseBundle>,
}

impl DistributionSet {
    /// Collect the successful bundles of `report` under `version`.
    #[must_use]
    pub fn new(
        version: &ReleaseVersion,
        verdict: StabilityVerdict,
        report: &PackagingReport,
    ) -> Self {
        Self {
            tag: version.value().to_owned(),
            verdict,
            bundles: report.bundles.clone(),
        }
    }

    /// Archive paths in publish order.
    #[must_use]
    pub fn artifact_paths(&self) -> Vec<Utf8PathBuf> {
        self.bundles
            .iter()
            .map(|bundle| bundle.artifact_path.clone())
            .collect()
    }

    /// Return `true` when there is nothing to publish.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// The upsert request for this set.
    #[must_use]
    pub fn publish_request(&self) -> PublishRequest {
        PublishRequest::new(self.tag.clone(), self.artifact_paths(), self.verdict)
    }
}

fn decompose_inputs(
    inputs: &[Utf8PathBuf],
    program: &ProgramName,
) -> (Vec<SourceArtifact>, Vec<ArtifactFailure>) {
    let mut claimed: BTreeMap<String, Utf8PathBuf> = BTreeMap::new();
    let mut sources = Vec::new();
    let mut failures = Vec::new();

    for path in inputs {
        let source = match SourceArtifact::from_path(path, program) {
            Ok(source) => source,
            Err(err) => {
                failures.push(ArtifactFailure {
                    source_path: path.clone(),
                    error: err.into(),
                });
                continue;
            }
        };
        let platform_id = source.artifact.platform_id().to_owned();
        if let Some(first) = claimed.get(&platform_id) {
            failures.push(ArtifactFailure {
                source_path: path.clone(),
                error: ArtifactError::DuplicatePlatform {
                    platform_id,
                    first: first.clone(),
                },
            });
            continue;
        }
        claimed.insert(platform_id, path.clone());
        sources.push(source);
    }
    (sources, failures)
}

fn build_one(
    builder: &BundleBuilder,
    source: &SourceArtifact,
) -> std::result::Result<ReleaseBundle, ArtifactFailure> {
    info!("packaging {}", source.path);
    match builder.build(source) {
        Ok(bundle) => {
            info!("packaged {}", bundle.artifact_path);
            Ok(bundle)
        }
        Err(err) => Err(ArtifactFailure {
            source_path: source.path.clone(),
            error: err.into(),
        }),
    }
}

/// Package every input binary, one job per artifact.
///
/// Malformed names and duplicate platforms fail on their own; sibling
/// artifacts are still packaged. With `jobs` set, the work runs on a
/// dedicated pool of that size, otherwise on rayon's global pool.
///
/// # Errors
///
/// Returns [`PackagerError::ThreadPool`] if the dedicated pool cannot be
/// created. Per-artifact failures are reported in the [`PackagingReport`].
pub fn package_all(
    builder: &BundleBuilder,
    program: &ProgramName,
    inputs: &[Utf8PathBuf],
    jobs: Option<usize>,
) -> Result<PackagingReport> {
    let (sources, mut failures) = decompose_inputs(inputs, program);

    let run_jobs = || -> Vec<std::result::Result<ReleaseBundle, ArtifactFailure>> {
        sources
            .par_iter()
            .map(|source| build_one(builder, source))
            .collect()
    };
    let results = match jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(run_jobs),
        None => run_jobs(),
    };

    let mut bundles = Vec::new();
    for result in results {
        match result {
            Ok(bundle) => bundles.push(bundle),
            Err(failure) => failures.push(failure),
        }
    }
    for failure in &failures {
        error!("failed to package {failure}");
    }

    bundles.sort_by(|a, b| a.platform_id.cmp(&b.platform_id));
    failures.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    Ok(PackagingReport { bundles, failures })
}

/// What happened to the distribution set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// The release was upserted.
    Published(PublishOutcome),
    /// Dry run; the request that would have been sent.
    DryRun(PublishRequest),
    /// Publishing was skipped because artifacts failed.
    Blocked {
        /// Number of failed artifacts.
        failed: usize,
    },
}

/// Inputs of a single run.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    /// Resolved configuration.
    pub config: &'a PackagerConfig,
    /// Tag name from the trigger; may be empty.
    pub tag_name: &'a str,
    /// Commit identifier from the trigger; may be empty.
    pub commit_sha: &'a str,
    /// Publish or dry run.
    pub mode: PublishMode,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Version embedded in every archive name.
    pub version: ReleaseVersion,
    /// Per-artifact results.
    pub report: PackagingReport,
    /// Archives eligible for publishing.
    pub distribution: DistributionSet,
    /// Outcome of the publish step.
    pub publish: PublishStatus,
}

impl RunSummary {
    /// Return `true` when every artifact was bundled and nothing blocked
    /// the publish step.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.report.is_complete() && !matches!(self.publish, PublishStatus::Blocked { .. })
    }

    /// Convert a partial success into [`PackagerError::ArtifactsFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ArtifactsFailed`] if any artifact failed.
    pub fn check(&self) -> Result<()> {
        if self.report.is_complete() {
            Ok(())
        } else {
            Err(PackagerError::ArtifactsFailed {
                failed: self.report.failures.len(),
                total: self.report.total(),
            })
        }
    }
}

fn staging_root(config: &PackagerConfig) -> Result<(Utf8PathBuf, Option<tempfile::TempDir>)> {
    if let Some(dir) = &config.staging_dir {
        return Ok((dir.clone(), None));
    }
    let temp = tempfile::Builder::new()
        .prefix("release-packager-")
        .tempdir()?;
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf())
        .map_err(|err| PackagerError::Io(err.into_io_error()))?;
    Ok((root, Some(temp)))
}

/// Keep only the globbed archives that belong to this run.
///
/// Archives with the same name prefix left behind by an earlier run are
/// reported and skipped rather than uploaded.
fn verified_artifacts(
    output_dir: &Utf8Path,
    prefix: &str,
    distribution: &DistributionSet,
) -> Result<Vec<Utf8PathBuf>> {
    let expected = distribution.artifact_paths();
    let found = collect_archives(output_dir, prefix)?;
    for stale in found.iter().filter(|path| !expected.contains(path)) {
        warn!("ignoring stale archive {stale}");
    }
    Ok(expected)
}

/// Resolve, package, and (unless dry-running) publish one release.
///
/// # Errors
///
/// Returns [`PackagerError`] for run-fatal problems: no version context,
/// an unreadable or empty input directory, unwritable output directories,
/// or a failed publish. Per-artifact failures are reported in the summary;
/// use [`RunSummary::check`] to turn them into an error.
pub fn run_pipeline(
    request: &RunRequest<'_>,
    publisher: &dyn ReleasePublisher,
) -> Result<RunSummary> {
    let config = request.config;
    let version = resolve(request.tag_name, request.commit_sha)?;
    let verdict = classify(&version);
    info!("release version {version} ({}, {verdict})", version.source());

    let mut own_dirs = vec![config.output_dir.as_path()];
    if let Some(staging) = &config.staging_dir {
        own_dirs.push(staging.as_path());
    }
    let inputs = exclude_nested(discover_binaries(&config.input_dir)?, &own_dirs);
    if inputs.is_empty() {
        return Err(PackagerError::NoArtifacts {
            input_dir: config.input_dir.clone(),
        });
    }

    let (staging, _staging_guard) = staging_root(config)?;
    let builder = BundleBuilder::new(
        config.program.clone(),
        version.clone(),
        staging,
        config.output_dir.clone(),
    );
    builder.prepare().map_err(PackagerError::Prepare)?;

    let report = package_all(&builder, &config.program, &inputs, config.jobs)?;
    let distribution = DistributionSet::new(&version, verdict, &report);

    let publish = if !report.is_complete() && config.failure_policy == FailurePolicy::FailFast {
        warn!(
            "{} artifact(s) failed; publishing blocked by {} policy",
            report.failures.len(),
            config.failure_policy
        );
        PublishStatus::Blocked {
            failed: report.failures.len(),
        }
    } else if distribution.is_empty() {
        warn!("no archives to publish");
        PublishStatus::Blocked {
            failed: report.failures.len(),
        }
    } else if request.mode.is_dry_run() {
        let publish_request = distribution.publish_request();
        info!(
            "dry run: would publish {} archive(s) to {}",
            publish_request.artifact_paths.len(),
            publish_request.tag
        );
        PublishStatus::DryRun(publish_request)
    } else {
        let prefix = format!("{}_{}_", config.program, version);
        let artifact_paths = verified_artifacts(&config.output_dir, &prefix, &distribution)?;
        let publish_request =
            PublishRequest::new(distribution.tag.clone(), artifact_paths, verdict);
        PublishStatus::Published(publish_distribution(publisher, &publish_request)?)
    };

    Ok(RunSummary {
        version,
        report,
        distribution,
        publish,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
