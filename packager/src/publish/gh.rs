//! [`ReleasePublisher`] backed by the GitHub CLI.
//!
//! Authentication is left entirely to `gh`; this module only builds the
//! command lines and interprets their results.

use super::{PublishError, PublishRequest, ReleasePublisher, ReleaseRecord};
use crate::exec::{CommandExecutor, display_command};
use camino::Utf8Path;
use log::debug;
use serde::Deserialize;
use std::process::Output;

const GH: &str = "gh";

/// Fragment of `gh release view` stderr for an unknown tag.
const NOT_FOUND_MARKER: &str = "release not found";

/// Publishes releases with `gh release ...`.
///
/// # Examples
///
/// ```no_run
/// use release_packager::exec::SystemCommandExecutor;
/// use release_packager::publish::ReleasePublisher;
/// use release_packager::publish::gh::GhReleasePublisher;
///
/// let publisher = GhReleasePublisher::new(SystemCommandExecutor, Some("TabbyML/tabby".to_owned()));
/// let existing = publisher.find_release("v0.3.0")?;
/// # Ok::<(), release_packager::publish::PublishError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GhReleasePublisher<E> {
    executor: E,
    repo: Option<String>,
}

impl<E: CommandExecutor> GhReleasePublisher<E> {
    /// Create a publisher. `repo` is passed as `--repo` when set; otherwise
    /// `gh` infers the repository from the working directory.
    #[must_use]
    pub const fn new(executor: E, repo: Option<String>) -> Self {
        Self { executor, repo }
    }

    fn gh(&self, args: &[&str]) -> Result<Output, PublishError> {
        let mut full: Vec<&str> = args.to_vec();
        if let Some(repo) = self.repo.as_deref() {
            full.extend(["--repo", repo]);
        }
        debug!("running {}", display_command(GH, &full));
        Ok(self.executor.run(GH, &full)?)
    }

    fn gh_checked(&self, args: &[&str]) -> Result<Output, PublishError> {
        let output = self.gh(args)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(command_failed(args, &output))
        }
    }
}

/// The subset of `gh release view --json` output the upsert needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewedRelease {
    tag_name: String,
    is_prerelease: bool,
    #[serde(default)]
    assets: Vec<ViewedAsset>,
}

#[derive(Debug, Deserialize)]
struct ViewedAsset {
    name: String,
}

fn command_failed(args: &[&str], output: &Output) -> PublishError {
    PublishError::CommandFailed {
        command: display_command(GH, args),
        status: output
            .status
            .code()
            .map_or_else(|| "signal".to_owned(), |code| code.to_string()),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    }
}

fn bool_flag(name: &str, value: bool) -> String {
    format!("--{name}={value}")
}

impl<E: CommandExecutor> ReleasePublisher for GhReleasePublisher<E> {
    fn find_release(&self, tag: &str) -> Result<Option<ReleaseRecord>, PublishError> {
        let args = ["release", "view", tag, "--json", "tagName,isPrerelease,assets"];
        let output = self.gh(&args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.to_lowercase().contains(NOT_FOUND_MARKER) {
                return Ok(None);
            }
            return Err(command_failed(&args, &output));
        }

        let viewed: ViewedRelease =
            serde_json::from_slice(&output.stdout).map_err(|e| PublishError::UnexpectedOutput {
                command: display_command(GH, &args),
                reason: e.to_string(),
            })?;
        Ok(Some(ReleaseRecord {
            tag: viewed.tag_name,
            prerelease: viewed.is_prerelease,
            assets: viewed.assets.into_iter().map(|asset| asset.name).collect(),
        }))
    }

    fn create_release(&self, request: &PublishRequest) -> Result<(), PublishError> {
        let prerelease = bool_flag("prerelease", request.prerelease);
        let latest = bool_flag("latest", request.make_latest);
        let tag = request.tag.as_str();
        self.gh_checked(&[
            "release",
            "create",
            tag,
            "--title",
            tag,
            "--notes",
            "",
            &prerelease,
            &latest,
        ])?;
        Ok(())
    }

    fn update_release(&self, request: &PublishRequest) -> Result<(), PublishError> {
        let prerelease = bool_flag("prerelease", request.prerelease);
        let latest = bool_flag("latest", request.make_latest);
        self.gh_checked(&["release", "edit", &request.tag, &prerelease, &latest])?;
        Ok(())
    }

    fn delete_asset(&self, tag: &str, asset_name: &str) -> Result<(), PublishError> {
        self.gh_checked(&["release", "delete-asset", tag, asset_name, "--yes"])?;
        Ok(())
    }

    fn upload_asset(&self, tag: &str, path: &Utf8Path) -> Result<(), PublishError> {
        self.gh_checked(&["release", "upload", tag, path.as_str(), "--clobber"])?;
        Ok(())
    }
}
