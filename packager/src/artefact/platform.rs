//! Decomposition of binary file names into program, platform, and extension.
//!
//! The build collaborator emits one binary per platform named
//! `<program>_<platform>[.ext]`. Decomposition is pure: it never touches the
//! file system, and a name that lacks the program prefix is a caller error.

use super::error::{ArtefactError, Result};
use super::program_name::ProgramName;
use camino::{Utf8Path, Utf8PathBuf};

/// A binary file name split into its packaging-relevant components.
///
/// Invariant: `base_name + "_" + platform_id + extension == raw_file_name`.
///
/// # Examples
///
/// ```
/// use release_packager::artefact::platform::decompose;
/// use release_packager::artefact::program_name::ProgramName;
///
/// let program = ProgramName::try_from("tabby").expect("valid program");
/// let artifact = decompose("tabby_x86_64-windows-msvc.exe", &program)
///     .expect("well-formed name");
/// assert_eq!(artifact.platform_id(), "x86_64-windows-msvc");
/// assert_eq!(artifact.extension(), ".exe");
/// assert_eq!(artifact.reconstruct(), "tabby_x86_64-windows-msvc.exe");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformArtifact {
    raw_file_name: String,
    base_name: String,
    platform_id: String,
    extension: String,
}

impl PlatformArtifact {
    /// The file name exactly as supplied.
    #[must_use]
    pub fn raw_file_name(&self) -> &str {
        &self.raw_file_name
    }

    /// The program name the binary was built for.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// The platform identifier, e.g. `aarch64-apple-darwin`.
    #[must_use]
    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    /// The extension including its leading dot, or `""` when absent.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Rebuild the original file name from the decomposed parts.
    #[must_use]
    pub fn reconstruct(&self) -> String {
        format!("{}_{}{}", self.base_name, self.platform_id, self.extension)
    }
}

/// A decomposed binary together with where it lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArtifact {
    /// Location of the compiled binary.
    pub path: Utf8PathBuf,
    /// Decomposed file name.
    pub artifact: PlatformArtifact,
}

impl SourceArtifact {
    /// Decompose the file name of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::MalformedFileName`] when the path has no
    /// file name or the file name lacks the program prefix.
    pub fn from_path(path: &Utf8Path, program: &ProgramName) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| ArtefactError::MalformedFileName {
                file_name: path.to_string(),
                expected_prefix: program.binary_prefix(),
            })?;
        Ok(Self {
            path: path.to_owned(),
            artifact: decompose(file_name, program)?,
        })
    }
}

/// Return the extension of `file_name`, including the leading dot.
///
/// A name has an extension iff it contains a `.` other than a leading one;
/// the extension runs from the last `.` to the end.
///
/// # Examples
///
/// ```
/// use release_packager::artefact::platform::detect_extension;
///
/// assert_eq!(detect_extension("tabby_x86_64-windows-msvc.exe"), ".exe");
/// assert_eq!(detect_extension("tabby_aarch64-apple-darwin"), "");
/// assert_eq!(detect_extension(".hidden"), "");
/// ```
#[must_use]
pub fn detect_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index).1,
        _ => "",
    }
}

/// Split `raw_file_name` into a [`PlatformArtifact`].
///
/// # Errors
///
/// Returns [`ArtefactError::MalformedFileName`] if the name (without its
/// extension) does not start with `<program>_` followed by a non-empty
/// platform identifier.
pub fn decompose(raw_file_name: &str, program: &ProgramName) -> Result<PlatformArtifact> {
    let extension = detect_extension(raw_file_name);
    let name_without_ext = raw_file_name
        .strip_suffix(extension)
        .unwrap_or(raw_file_name);
    let prefix = program.binary_prefix();

    match name_without_ext.strip_prefix(prefix.as_str()) {
        Some(platform_id) if !platform_id.is_empty() => Ok(PlatformArtifact {
            raw_file_name: raw_file_name.to_owned(),
            base_name: program.as_str().to_owned(),
            platform_id: platform_id.to_owned(),
            extension: extension.to_owned(),
        }),
        _ => Err(ArtefactError::MalformedFileName {
            file_name: raw_file_name.to_owned(),
            expected_prefix: prefix,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tabby() -> ProgramName {
        ProgramName::try_from("tabby").expect("valid program")
    }

    #[rstest]
    #[case::windows("tabby_x86_64-windows-msvc.exe")]
    #[case::darwin("tabby_aarch64-apple-darwin")]
    #[case::linux_cuda("tabby_x86_64-manylinux2014-cuda117")]
    #[case::dotted_platform("tabby_x86_64.linux.bin")]
    #[case::underscored_platform("tabby_x86_64_linux")]
    fn decompose_round_trips(tabby: ProgramName, #[case] name: &str) {
        let artifact = decompose(name, &tabby).expect("well-formed");
        assert_eq!(artifact.reconstruct(), name);
        assert_eq!(artifact.raw_file_name(), name);
        assert_eq!(artifact.base_name(), "tabby");
    }

    #[rstest]
    #[case::plain("tabby_aarch64-apple-darwin")]
    #[case::no_dot_at_all("tabby")]
    #[case::leading_dot_only(".tabby_linux")]
    fn names_without_inner_dot_have_no_extension(#[case] name: &str) {
        assert_eq!(detect_extension(name), "");
    }

    #[rstest]
    #[case::exe("tabby_x86_64-windows-msvc.exe", ".exe")]
    #[case::last_dot_wins("tabby_linux.tar.gz", ".gz")]
    #[case::trailing_dot("tabby_linux.", ".")]
    fn extension_runs_from_last_dot(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(detect_extension(name), expected);
    }

    #[rstest]
    fn platform_id_excludes_prefix_and_extension(tabby: ProgramName) {
        let artifact = decompose("tabby_x86_64-windows-msvc.exe", &tabby).expect("valid");
        assert_eq!(artifact.platform_id(), "x86_64-windows-msvc");
        assert_eq!(artifact.extension(), ".exe");
    }

    #[rstest]
    #[case::other_program("llama_aarch64-apple-darwin")]
    #[case::missing_underscore("tabbyaarch64-apple-darwin")]
    #[case::empty_platform("tabby_")]
    #[case::empty_platform_with_ext("tabby_.exe")]
    #[case::prefix_not_at_start("my-tabby_linux")]
    fn rejects_names_without_program_prefix(tabby: ProgramName, #[case] name: &str) {
        let err = decompose(name, &tabby).expect_err("malformed");
        assert_eq!(
            err,
            ArtefactError::MalformedFileName {
                file_name: name.to_owned(),
                expected_prefix: "tabby_".to_owned(),
            }
        );
    }

    #[rstest]
    fn source_artifact_uses_file_name_component(tabby: ProgramName) {
        let path = Utf8Path::new("/dist/bin/tabby_aarch64-apple-darwin");
        let source = SourceArtifact::from_path(path, &tabby).expect("valid");
        assert_eq!(source.path, path);
        assert_eq!(source.artifact.platform_id(), "aarch64-apple-darwin");
    }
}
