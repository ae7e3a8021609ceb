//! Input-directory scan for compiled binaries.
//!
//! Binaries may sit directly in the input directory or one level down (CI
//! artifact downloads typically create a folder per job), so the scan is
//! recursive. Hidden files and directories are skipped. Names are not
//! validated here: a malformed name is a per-artifact failure reported by
//! the pipeline.
//!
//! The output directory may live inside the input directory, so the
//! pipeline drops anything under its own output and staging roots with
//! [`exclude_nested`] before packaging.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while scanning the input directory.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The input directory does not exist or is not a directory.
    #[error("input directory not found: {0}")]
    MissingInputDir(Utf8PathBuf),

    /// The scan pattern was invalid.
    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A directory entry could not be read.
    #[error("failed to read input entry: {0}")]
    Glob(#[from] glob::GlobError),

    /// A discovered path is not valid UTF-8.
    #[error("input path is not valid UTF-8: {0}")]
    NonUtf8Path(#[from] camino::FromPathBufError),
}

fn is_hidden(root: &Utf8Path, path: &Utf8Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|component| component.as_str().starts_with('.'))
}

/// List every regular, non-hidden file under `input_dir`, sorted by path.
///
/// # Errors
///
/// Returns [`DiscoveryError::MissingInputDir`] if `input_dir` is not a
/// directory, or another variant if the scan itself fails.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use release_packager::discovery::discover_binaries;
///
/// for path in discover_binaries(Utf8Path::new("binaries"))? {
///     println!("{path}");
/// }
/// # Ok::<(), release_packager::discovery::DiscoveryError>(())
/// ```
pub fn discover_binaries(input_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, DiscoveryError> {
    if !input_dir.is_dir() {
        return Err(DiscoveryError::MissingInputDir(input_dir.to_owned()));
    }

    let pattern = format!("{}/**/*", glob::Pattern::escape(input_dir.as_str()));
    let mut found = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = Utf8PathBuf::try_from(entry?)?;
        if !path.is_file() || is_hidden(input_dir, &path) {
            continue;
        }
        found.push(path);
    }
    found.sort();
    debug!("discovered {} file(s) under {input_dir}", found.len());
    Ok(found)
}

/// Drop every path that lies under one of `roots`.
///
/// Both sides are canonicalised, so `./dist/a.tar.gz` is recognised as
/// lying under `dist`. Roots that do not exist yet cannot contain anything
/// and are ignored; a path that cannot be canonicalised is kept.
///
/// # Examples
///
/// ```no_run
/// use camino::{Utf8Path, Utf8PathBuf};
/// use release_packager::discovery::exclude_nested;
///
/// let found = vec![
///     Utf8PathBuf::from("./tabby_aarch64-apple-darwin"),
///     Utf8PathBuf::from("./dist/tabby_v0.3.0_aarch64-apple-darwin.tar.gz"),
/// ];
/// let inputs = exclude_nested(found, &[Utf8Path::new("dist")]);
/// assert_eq!(inputs, vec![Utf8PathBuf::from("./tabby_aarch64-apple-darwin")]);
/// ```
#[must_use]
pub fn exclude_nested(paths: Vec<Utf8PathBuf>, roots: &[&Utf8Path]) -> Vec<Utf8PathBuf> {
    let resolved_roots: Vec<PathBuf> = roots
        .iter()
        .filter_map(|root| root.canonicalize().ok())
        .collect();
    if resolved_roots.is_empty() {
        return paths;
    }

    paths
        .into_iter()
        .filter(|path| {
            let Ok(resolved) = path.canonicalize() else {
                return true;
            };
            let nested = resolved_roots.iter().any(|root| resolved.starts_with(root));
            if nested {
                debug!("skipping {path}: inside an output or staging directory");
            }
            !nested
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Input {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn input() -> Input {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
        Input { _dir: dir, root }
    }

    fn names(root: &Utf8Path, paths: &[Utf8PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|path| path.strip_prefix(root).expect("under root").to_string())
            .collect()
    }

    #[rstest]
    fn finds_flat_and_nested_binaries_in_order(input: Input) {
        fs::write(input.root.join("tabby_x86_64-unknown-linux-gnu"), b"elf").expect("write");
        fs::create_dir(input.root.join("windows")).expect("mkdir");
        fs::write(
            input.root.join("windows/tabby_x86_64-pc-windows-msvc.exe"),
            b"pe",
        )
        .expect("write");

        let found = discover_binaries(&input.root).expect("scan");

        assert_eq!(
            names(&input.root, &found),
            vec![
                "tabby_x86_64-unknown-linux-gnu",
                "windows/tabby_x86_64-pc-windows-msvc.exe",
            ]
        );
    }

    #[rstest]
    fn skips_hidden_entries_and_directories(input: Input) {
        fs::write(input.root.join(".DS_Store"), b"").expect("write");
        fs::create_dir(input.root.join(".cache")).expect("mkdir");
        fs::write(input.root.join(".cache/tabby_linux"), b"").expect("write");
        fs::create_dir(input.root.join("empty")).expect("mkdir");

        assert!(discover_binaries(&input.root).expect("scan").is_empty());
    }

    #[rstest]
    fn keeps_malformed_names_for_the_pipeline_to_report(input: Input) {
        fs::write(input.root.join("README"), b"").expect("write");

        let found = discover_binaries(&input.root).expect("scan");

        assert_eq!(names(&input.root, &found), vec!["README"]);
    }

    #[rstest]
    fn missing_directory_is_an_error(input: Input) {
        let missing = input.root.join("absent");

        let err = discover_binaries(&missing).expect_err("missing dir");

        assert!(matches!(err, DiscoveryError::MissingInputDir(ref path) if *path == missing));
    }

    #[rstest]
    fn nested_roots_are_excluded(input: Input) {
        fs::write(input.root.join("tabby_aarch64-apple-darwin"), b"elf").expect("write");
        fs::create_dir(input.root.join("dist")).expect("mkdir");
        fs::write(
            input.root.join("dist/tabby_v0.3.0_aarch64-apple-darwin.tar.gz"),
            b"archive",
        )
        .expect("write");
        let found = discover_binaries(&input.root).expect("scan");
        let dist = input.root.join("dist");
        let staging = input.root.join("staging");

        let kept = exclude_nested(found, &[&dist, &staging]);

        assert_eq!(names(&input.root, &kept), vec!["tabby_aarch64-apple-darwin"]);
    }

    #[rstest]
    fn absent_roots_exclude_nothing(input: Input) {
        fs::write(input.root.join("tabby_aarch64-apple-darwin"), b"elf").expect("write");
        let found = discover_binaries(&input.root).expect("scan");
        let dist = input.root.join("dist");

        let kept = exclude_nested(found.clone(), &[&dist]);

        assert_eq!(kept, found);
    }
}
