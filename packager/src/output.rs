//! Human-facing reporting for the packager CLI.
//!
//! Everything here writes to an injected `Write` so the binary can target
//! stderr while tests capture the text.

use crate::pipeline::{PublishStatus, RunSummary};
use std::fmt::Display;
use std::io::Write;

/// Write `message` and a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// Pluralised archive count, e.g. `1 archive` or `3 archives`.
///
/// # Examples
///
/// ```
/// use release_packager::output::archive_count;
///
/// assert_eq!(archive_count(1), "1 archive");
/// assert_eq!(archive_count(2), "2 archives");
/// ```
#[must_use]
pub fn archive_count(count: usize) -> String {
    if count == 1 {
        "1 archive".to_owned()
    } else {
        format!("{count} archives")
    }
}

/// Print the outcome of a run.
///
/// Failures are always printed; the rest is suppressed when `quiet`.
pub fn write_summary(summary: &RunSummary, quiet: bool, stderr: &mut dyn Write) {
    if !quiet {
        write_stderr_line(
            stderr,
            format!(
                "Packaged {} for {} ({}):",
                archive_count(summary.report.bundles.len()),
                summary.version,
                summary.distribution.verdict
            ),
        );
        for bundle in &summary.report.bundles {
            write_stderr_line(stderr, format!("  {}", bundle.artifact_path));
        }
    }

    if !summary.report.failures.is_empty() {
        write_stderr_line(
            stderr,
            format!(
                "Failed to package {} of {} artifact(s):",
                summary.report.failures.len(),
                summary.report.total()
            ),
        );
        for failure in &summary.report.failures {
            write_stderr_line(stderr, format!("  {failure}"));
        }
    }

    match &summary.publish {
        PublishStatus::Blocked { failed } => write_stderr_line(
            stderr,
            format!("Publishing skipped: {failed} artifact(s) failed"),
        ),
        PublishStatus::DryRun(request) if !quiet => {
            write_stderr_line(stderr, "Dry run - release not published. Request:");
            match request.to_json() {
                Ok(json) => write_stderr_line(stderr, json),
                Err(err) => write_stderr_line(stderr, format!("  <unavailable: {err}>")),
            }
        }
        PublishStatus::Published(outcome) if !quiet => {
            let action = if outcome.created { "Created" } else { "Updated" };
            write_stderr_line(
                stderr,
                format!(
                    "{action} release {}: uploaded {}, removed {} old asset(s)",
                    summary.distribution.tag,
                    archive_count(outcome.uploaded_assets.len()),
                    outcome.removed_assets.len()
                ),
            );
        }
        PublishStatus::DryRun(_) | PublishStatus::Published(_) => {}
    }
}
