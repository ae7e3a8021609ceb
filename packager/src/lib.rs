//! Release packager library.
//!
//! This crate turns a directory of per-platform binaries named
//! `<program>_<platform>[.ext]` into versioned release archives and
//! publishes them as a single release. It is used by the
//! `release-packager` CLI binary and can be driven programmatically for
//! testing or custom release workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Naming, versioning, stability, and bundle construction
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration file and CLI overlay
//! - [`discovery`] - Input-directory scan for binaries
//! - [`error`] - Run-level error type
//! - [`exec`] - External command execution
//! - [`output`] - Human-facing reporting
//! - [`pipeline`] - Parallel packaging and publish orchestration
//! - [`publish`] - Release upsert and the `gh` publisher

pub mod artefact;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod output;
pub mod pipeline;
pub mod publish;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
