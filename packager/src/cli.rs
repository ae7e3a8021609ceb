//! CLI argument definitions for the release packager.
//!
//! Every setting except the trigger inputs can also come from a TOML file
//! given with `--config`; flags on the command line take precedence.

use crate::pipeline::FailurePolicy;
use crate::publish::TriggerContext;
use camino::Utf8PathBuf;
use clap::Parser;

/// Package per-platform binaries into versioned release archives.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "release-packager")]
#[command(version, about)]
#[command(long_about = concat!(
    "Package per-platform binaries into versioned release archives.\n\n",
    "Binaries named <program>_<platform>[.ext] are renamed to <program>[.ext], ",
    "placed in a folder named <program>_<version>_<platform>, and archived as ",
    ".zip (Windows .exe) or .tar.gz (everything else). The version is the tag ",
    "name, or the first eight characters of the commit when no tag is given.\n\n",
    "Only runs triggered by a push publish; every other trigger, and --dry-run, ",
    "packages and reports the release request without sending it.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package and publish a tagged release:\n",
    "    $ release-packager -p tabby -i binaries -o dist --tag v0.3.0 --trigger push\n\n",
    "  Package an untagged build without publishing:\n",
    "    $ release-packager -p tabby -i binaries -o dist --commit \"$GITHUB_SHA\"\n\n",
    "  Read settings from a file:\n",
    "    $ release-packager --config packager.toml --tag v0.3.0 --trigger push",
))]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Program name; binaries must be named `<program>_<platform>[.ext]`.
    #[arg(short, long, value_name = "NAME")]
    pub program: Option<String>,

    /// Directory holding the compiled binaries.
    #[arg(short, long, value_name = "DIR")]
    pub input_dir: Option<Utf8PathBuf>,

    /// Directory receiving the archives.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Root for per-bundle staging directories [default: a temporary directory].
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<Utf8PathBuf>,

    /// Tag name of the triggering ref; empty for untagged builds.
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Commit SHA, used for the version when no tag is given.
    #[arg(long, value_name = "SHA")]
    pub commit: Option<String>,

    /// Event that started the run; only `push` publishes.
    #[arg(long, value_enum, default_value_t = TriggerContext::Manual)]
    pub trigger: TriggerContext,

    /// What to do when some artifacts fail [default: fail-fast].
    #[arg(long, value_enum, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicy>,

    /// Number of parallel packaging jobs [default: one per CPU].
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Repository to publish to, as OWNER/NAME [default: inferred by gh].
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Package and report without publishing, whatever the trigger.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// The tag name, or `""` when none was given.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.tag.as_deref().unwrap_or_default()
    }

    /// The commit SHA, or `""` when none was given.
    #[must_use]
    pub fn commit_sha(&self) -> &str {
        self.commit.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
