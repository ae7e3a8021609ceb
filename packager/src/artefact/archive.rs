//! Archive format selection and archive writers.
//!
//! Windows binaries (`.exe`) ship as `.zip`; every other platform ships as
//! `.tar.gz` with the binary marked executable. Both writers place entries
//! under a single top-level folder named after the bundle, and both record
//! a fixed timestamp so rebuilding the same inputs yields the same entries.

use super::platform::PlatformArtifact;
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io;
use thiserror::Error;
use zip::write::SimpleFileOptions;

/// Extension that selects the zip format.
pub const WINDOWS_EXTENSION: &str = ".exe";

/// Unix mode for executables and directories inside archives.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Unix mode for non-executable files inside archives.
pub const REGULAR_FILE_MODE: u32 = 0o644;

/// The archive container used for a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// `.zip`, used for Windows binaries.
    Zip,
    /// `.tar.gz`, used for every other platform.
    TarGz,
}

impl ArchiveFormat {
    /// Choose the format from the binary's extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_packager::artefact::archive::ArchiveFormat;
    ///
    /// assert_eq!(ArchiveFormat::for_extension(".exe"), ArchiveFormat::Zip);
    /// assert_eq!(ArchiveFormat::for_extension(""), ArchiveFormat::TarGz);
    /// ```
    #[must_use]
    pub fn for_extension(extension: &str) -> Self {
        if extension == WINDOWS_EXTENSION {
            Self::Zip
        } else {
            Self::TarGz
        }
    }

    /// Choose the format for a decomposed binary.
    #[must_use]
    pub fn for_artifact(artifact: &PlatformArtifact) -> Self {
        Self::for_extension(artifact.extension())
    }

    /// File extension of the archive, including the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
        }
    }

    /// Whether bundled binaries must carry the execute permission.
    #[must_use]
    pub const fn requires_executable(self) -> bool {
        matches!(self, Self::TarGz)
    }

    /// Every supported format.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Zip, Self::TarGz]
    }
}

/// Errors raised while writing an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading a source file or writing the archive failed.
    #[error("archive I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip writer rejected an entry.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// A file to place in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk to read.
    pub source: Utf8PathBuf,
    /// Name of the entry relative to the archive's top-level folder.
    pub name: String,
    /// Unix permission bits recorded for the entry.
    pub mode: u32,
}

/// Write an archive of `format` at `output_path`.
///
/// Entries are stored as `<root>/<entry.name>` beneath a directory entry
/// for `root`.
///
/// # Errors
///
/// Returns [`ArchiveError`] if a source cannot be read or the archive
/// cannot be written.
pub fn create_archive(
    format: ArchiveFormat,
    output_path: &Utf8Path,
    root: &str,
    entries: &[ArchiveEntry],
) -> Result<(), ArchiveError> {
    match format {
        ArchiveFormat::Zip => create_zip_archive(output_path, root, entries),
        ArchiveFormat::TarGz => create_tar_gz_archive(output_path, root, entries),
    }
}

fn create_zip_archive(
    output_path: &Utf8Path,
    root: &str,
    entries: &[ArchiveEntry],
) -> Result<(), ArchiveError> {
    let output_file = fs::File::create(output_path)?;
    let mut writer = zip::ZipWriter::new(output_file);
    let base = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    writer.add_directory(format!("{root}/"), base.unix_permissions(EXECUTABLE_MODE))?;
    for entry in entries {
        writer.start_file(
            format!("{root}/{}", entry.name),
            base.unix_permissions(entry.mode),
        )?;
        let mut source = fs::File::open(&entry.source)?;
        io::copy(&mut source, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

fn create_tar_gz_archive(
    output_path: &Utf8Path,
    root: &str,
    entries: &[ArchiveEntry],
) -> Result<(), ArchiveError> {
    let output_file = fs::File::create(output_path)?;
    let encoder = GzEncoder::new(output_file, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    let mut dir_header = tar::Header::new_gnu();
    dir_header.set_entry_type(tar::EntryType::Directory);
    dir_header.set_size(0);
    dir_header.set_mode(EXECUTABLE_MODE);
    dir_header.set_mtime(0);
    archive.append_data(&mut dir_header, format!("{root}/"), io::empty())?;

    for entry in entries {
        let source = fs::File::open(&entry.source)?;
        let metadata = source.metadata()?;
        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&metadata, tar::HeaderMode::Deterministic);
        header.set_mode(entry.mode);
        archive.append_data(&mut header, format!("{root}/{}", entry.name), source)?;
    }

    archive.into_inner()?.finish()?;
    Ok(())
}
