//! Release packager CLI entrypoint.
//!
//! This binary packages per-platform binaries into versioned archives and,
//! for push-triggered runs, publishes them as a GitHub release through the
//! `gh` CLI.

use clap::Parser;
use release_packager::cli::Cli;
use release_packager::config::PackagerConfig;
use release_packager::error::Result;
use release_packager::exec::SystemCommandExecutor;
use release_packager::output::{write_stderr_line, write_summary};
use release_packager::pipeline::{RunRequest, run_pipeline};
use release_packager::publish::PublishMode;
use release_packager::publish::gh::GhReleasePublisher;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = PackagerConfig::from_cli(cli)?;
    let mode = PublishMode::for_trigger(cli.trigger, cli.dry_run);

    if !cli.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Packaging {} binaries from {} into {} ({} trigger{})...",
                config.program,
                config.input_dir,
                config.output_dir,
                cli.trigger,
                if mode.is_dry_run() { ", dry run" } else { "" }
            ),
        );
    }

    let publisher = GhReleasePublisher::new(SystemCommandExecutor, config.repo.clone());
    let request = RunRequest {
        config: &config,
        tag_name: cli.tag_name(),
        commit_sha: cli.commit_sha(),
        mode,
    };
    let summary = run_pipeline(&request, &publisher)?;
    write_summary(&summary, cli.quiet, stderr);
    summary.check()
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
