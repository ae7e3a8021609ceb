//! Naming policy for release bundles and archives.
//!
//! Every bundle is named `<program>_<version>_<platform>` and its archive
//! appends the format's extension, e.g.
//! `tabby_v0.3.0_aarch64-apple-darwin.tar.gz`.

use super::archive::ArchiveFormat;
use super::platform::PlatformArtifact;
use super::program_name::ProgramName;
use super::version::ReleaseVersion;
use std::fmt;

/// A fully-qualified bundle name.
///
/// # Examples
///
/// ```
/// use release_packager::artefact::archive::ArchiveFormat;
/// use release_packager::artefact::naming::BundleName;
/// use release_packager::artefact::platform::decompose;
/// use release_packager::artefact::program_name::ProgramName;
/// use release_packager::artefact::version::resolve;
///
/// let program = ProgramName::try_from("tabby").expect("valid program");
/// let artifact = decompose("tabby_aarch64-apple-darwin", &program).expect("valid name");
/// let version = resolve("v0.3.0", "").expect("tag present");
///
/// let name = BundleName::new(&program, &version, &artifact);
/// assert_eq!(name.directory_name(), "tabby_v0.3.0_aarch64-apple-darwin");
/// assert_eq!(
///     name.archive_file_name(ArchiveFormat::TarGz),
///     "tabby_v0.3.0_aarch64-apple-darwin.tar.gz"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleName {
    program: String,
    version: String,
    platform_id: String,
}

impl BundleName {
    /// Create a bundle name from validated components.
    #[must_use]
    pub fn new(
        program: &ProgramName,
        version: &ReleaseVersion,
        artifact: &PlatformArtifact,
    ) -> Self {
        Self {
            program: program.as_str().to_owned(),
            version: version.value().to_owned(),
            platform_id: artifact.platform_id().to_owned(),
        }
    }

    /// Name of the staging directory and of the archive's top-level folder.
    #[must_use]
    pub fn directory_name(&self) -> String {
        self.to_string()
    }

    /// File name of the archive for `format`.
    #[must_use]
    pub fn archive_file_name(&self, format: ArchiveFormat) -> String {
        format!("{self}{}", format.extension())
    }

    /// Return the platform component.
    #[must_use]
    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.program, self.version, self.platform_id)
    }
}

/// File name of the binary inside a bundle: the program name with the
/// original extension preserved.
#[must_use]
pub fn bundled_binary_name(program: &ProgramName, artifact: &PlatformArtifact) -> String {
    format!("{program}{}", artifact.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::platform::decompose;
    use crate::artefact::version::resolve;
    use rstest::{fixture, rstest};

    #[fixture]
    fn program() -> ProgramName {
        ProgramName::try_from("tabby").expect("valid")
    }

    #[rstest]
    fn windows_archive_is_zip(program: ProgramName) {
        let artifact = decompose("tabby_x86_64-windows-msvc.exe", &program).expect("valid");
        let version = resolve("v0.3.0", "").expect("valid");
        let name = BundleName::new(&program, &version, &artifact);
        assert_eq!(
            name.archive_file_name(ArchiveFormat::for_artifact(&artifact)),
            "tabby_v0.3.0_x86_64-windows-msvc.zip"
        );
    }

    #[rstest]
    fn commit_fallback_appears_in_name(program: ProgramName) {
        let artifact = decompose("tabby_aarch64-apple-darwin", &program).expect("valid");
        let version = resolve("", "deadbeefcafe0000").expect("valid");
        let name = BundleName::new(&program, &version, &artifact);
        assert_eq!(name.directory_name(), "tabby_deadbeef_aarch64-apple-darwin");
        assert_eq!(name.platform_id(), "aarch64-apple-darwin");
    }

    #[rstest]
    #[case::exe("tabby_x86_64-windows-msvc.exe", "tabby.exe")]
    #[case::none("tabby_aarch64-apple-darwin", "tabby")]
    fn bundled_binary_keeps_extension(
        program: ProgramName,
        #[case] raw: &str,
        #[case] expected: &str,
    ) {
        let artifact = decompose(raw, &program).expect("valid");
        assert_eq!(bundled_binary_name(&program, &artifact), expected);
    }
}
