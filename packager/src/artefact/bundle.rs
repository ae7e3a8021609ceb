//! Bundle construction: stage, rename, archive, and move one binary.
//!
//! Each bundle is built in its own staging directory named
//! `<program>_<version>_<platform>`, archived, and moved into the shared
//! output directory. The staging directory is removed on every exit path,
//! including failures, so reruns start from a clean slate.

use super::archive::{
    ArchiveEntry, ArchiveFormat, EXECUTABLE_MODE, REGULAR_FILE_MODE, create_archive,
};
use super::bundle_error::{BundleError, BundleStage};
use super::naming::{BundleName, bundled_binary_name};
use super::platform::SourceArtifact;
use super::program_name::ProgramName;
use super::version::ReleaseVersion;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;

/// A finished archive in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBundle {
    /// `<program>_<version>_<platform>`; also the archive's top-level folder.
    pub directory_name: String,
    /// Location of the archive in the output directory.
    pub artifact_path: Utf8PathBuf,
    /// Name of the binary inside the archive, e.g. `tabby.exe`.
    pub contained_binary: String,
    /// Container format of the archive.
    pub format: ArchiveFormat,
    /// Platform the binary targets.
    pub platform_id: String,
}

/// Builds release bundles for one program and version.
///
/// # Examples
///
/// ```no_run
/// use camino::{Utf8Path, Utf8PathBuf};
/// use release_packager::artefact::bundle::BundleBuilder;
/// use release_packager::artefact::platform::SourceArtifact;
/// use release_packager::artefact::program_name::ProgramName;
/// use release_packager::artefact::version::resolve;
///
/// let program = ProgramName::try_from("tabby")?;
/// let version = resolve("v0.3.0", "")?;
/// let builder = BundleBuilder::new(
///     program.clone(),
///     version,
///     Utf8PathBuf::from("staging"),
///     Utf8PathBuf::from("dist"),
/// );
/// builder.prepare()?;
///
/// let source = SourceArtifact::from_path(
///     Utf8Path::new("bin/tabby_aarch64-apple-darwin"),
///     &program,
/// )?;
/// let bundle = builder.build(&source)?;
/// assert!(bundle.artifact_path.as_str().ends_with(".tar.gz"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    program: ProgramName,
    version: ReleaseVersion,
    staging_root: Utf8PathBuf,
    output_dir: Utf8PathBuf,
}

impl BundleBuilder {
    /// Create a builder that stages under `staging_root` and writes
    /// archives to `output_dir`.
    #[must_use]
    pub const fn new(
        program: ProgramName,
        version: ReleaseVersion,
        staging_root: Utf8PathBuf,
        output_dir: Utf8PathBuf,
    ) -> Self {
        Self {
            program,
            version,
            staging_root,
            output_dir,
        }
    }

    /// Ensure the staging root and output directory exist.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Io`] if either directory cannot be created.
    pub fn prepare(&self) -> Result<(), BundleError> {
        fs::create_dir_all(&self.staging_root)
            .map_err(BundleError::io(BundleStage::Stage, &self.staging_root))?;
        fs::create_dir_all(&self.output_dir)
            .map_err(BundleError::io(BundleStage::Move, &self.output_dir))
    }

    /// Package `source` into an archive in the output directory.
    ///
    /// Windows binaries (`.exe`) become `.zip` archives; every other binary
    /// is marked executable and becomes a `.tar.gz` archive.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] naming the failed stage. The staging
    /// directory is removed before returning either way.
    pub fn build(&self, source: &SourceArtifact) -> Result<ReleaseBundle, BundleError> {
        let artifact = &source.artifact;
        let format = ArchiveFormat::for_artifact(artifact);
        let name = BundleName::new(&self.program, &self.version, artifact);
        let directory_name = name.directory_name();

        let staging = StagingDir::create(self.staging_root.join(&directory_name))?;
        let contained_binary = bundled_binary_name(&self.program, artifact);
        let staged_binary = staging.path().join(&contained_binary);

        debug!("copying {} to {staged_binary}", source.path);
        fs::copy(&source.path, &staged_binary)
            .map_err(BundleError::io(BundleStage::Copy, &staged_binary))?;

        let mode = if format.requires_executable() {
            mark_executable(&staged_binary)?;
            EXECUTABLE_MODE
        } else {
            REGULAR_FILE_MODE
        };

        let archive_name = name.archive_file_name(format);
        let staged_archive = staging.path().join(&archive_name);
        let entry = ArchiveEntry {
            source: staged_binary,
            name: contained_binary.clone(),
            mode,
        };
        create_archive(format, &staged_archive, &directory_name, &[entry]).map_err(|source| {
            BundleError::Archive {
                path: staged_archive.clone(),
                source,
            }
        })?;

        let artifact_path = self.output_dir.join(&archive_name);
        move_file(&staged_archive, &artifact_path)?;
        debug!("bundled {} into {artifact_path}", artifact.raw_file_name());

        Ok(ReleaseBundle {
            directory_name,
            artifact_path,
            contained_binary,
            format,
            platform_id: artifact.platform_id().to_owned(),
        })
    }
}

/// A staging directory that is removed when dropped.
struct StagingDir {
    path: Utf8PathBuf,
}

impl StagingDir {
    /// Create `path`, reusing it if a previous run left it behind.
    fn create(path: Utf8PathBuf) -> Result<Self, BundleError> {
        fs::create_dir_all(&path).map_err(BundleError::io(BundleStage::Stage, &path))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove staging directory {}: {e}", self.path),
        }
    }
}

/// Add the owner, group, and world execute bits to `path`.
#[cfg(unix)]
fn mark_executable(path: &Utf8Path) -> Result<(), BundleError> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .map_err(BundleError::io(BundleStage::Permissions, path))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions).map_err(BundleError::io(BundleStage::Permissions, path))
}

/// Non-Unix hosts have no execute bit; the archive header carries the mode.
#[cfg(not(unix))]
fn mark_executable(_path: &Utf8Path) -> Result<(), BundleError> {
    Ok(())
}

/// Move `from` to `to`, falling back to copy-and-delete across devices.
fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<(), BundleError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!("rename {from} -> {to} failed ({rename_err}); copying instead");
            fs::copy(from, to).map_err(BundleError::io(BundleStage::Move, to))?;
            fs::remove_file(from).map_err(BundleError::io(BundleStage::Move, from))
        }
    }
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
