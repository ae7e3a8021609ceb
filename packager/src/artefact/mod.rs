//! Artefact naming, version policy, and archive construction.
//!
//! This module implements the type-safe domain model for turning
//! per-platform binaries into release archives.
//!
//! # Sub-modules
//!
//! - [`archive`] — Archive format selection and the zip / tar.gz writers.
//! - [`bundle`] — Staging, renaming, archiving, and moving one binary.
//! - [`bundle_error`] — Error types for bundle construction.
//! - [`error`] — Semantic error types for validation failures.
//! - [`naming`] — Bundle and archive naming policy (`BundleName`).
//! - [`platform`] — File name decomposition (`PlatformArtifact`).
//! - [`program_name`] — Program name newtype (`ProgramName`).
//! - [`stability`] — Stable versus prerelease classification.
//! - [`version`] — Release version resolution (`ReleaseVersion`).

pub mod archive;
pub mod bundle;
pub mod bundle_error;
pub mod error;
pub mod naming;
pub mod platform;
pub mod program_name;
pub mod stability;
pub mod version;
