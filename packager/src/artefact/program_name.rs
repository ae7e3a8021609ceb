//! Program name newtype used as the file name prefix of every binary.
//!
//! The build collaborator names binaries `<program>_<platform>[.ext]`, so
//! the program name must be a single, non-empty path component.

use super::error::{ArtefactError, Result};
use std::fmt;

/// A validated program name such as `tabby`.
///
/// # Examples
///
/// ```
/// use release_packager::artefact::program_name::ProgramName;
///
/// let program: ProgramName = "tabby".try_into().expect("valid program name");
/// assert_eq!(program.binary_prefix(), "tabby_");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramName(String);

impl ProgramName {
    /// Return the program name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the prefix every input binary must start with.
    #[must_use]
    pub fn binary_prefix(&self) -> String {
        format!("{}_", self.0)
    }
}

impl TryFrom<&str> for ProgramName {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        validate_program_name(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ProgramName {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        validate_program_name(&value)?;
        Ok(Self(value))
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_program_name(value: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(ArtefactError::InvalidProgramName {
            value: value.to_owned(),
            reason: reason.to_owned(),
        })
    };

    if value.is_empty() {
        return reject("name must not be empty");
    }
    if value.starts_with('.') {
        return reject("name must not start with '.'");
    }
    if value.contains(['/', '\\']) {
        return reject("name must not contain path separators");
    }
    if value.chars().any(char::is_whitespace) {
        return reject("name must not contain whitespace");
    }
    Ok(())
}
