//! Unit tests for parallel packaging and publish gating.

use super::*;
use crate::artefact::bundle_error::BundleStage;
use crate::publish::MockReleasePublisher;
use crate::publish::memory::{InMemoryReleaseStore, StoreCall};
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn binaries(&self) -> Utf8PathBuf {
        self.root.join("binaries")
    }

    fn dist(&self) -> Utf8PathBuf {
        self.root.join("dist")
    }

    fn binary(&self, name: &str) -> Utf8PathBuf {
        let dir = self.binaries();
        fs::create_dir_all(&dir).expect("mkdir binaries");
        let path = dir.join(name);
        fs::write(&path, format!("binary {name}")).expect("write binary");
        path
    }

    fn builder(&self) -> BundleBuilder {
        let builder = BundleBuilder::new(
            program(),
            resolve("v0.3.0", "").expect("version"),
            self.root.join("staging"),
            self.dist(),
        );
        builder.prepare().expect("prepare");
        builder
    }

    fn config(&self, failure_policy: FailurePolicy) -> PackagerConfig {
        PackagerConfig {
            program: program(),
            input_dir: self.binaries(),
            output_dir: self.dist(),
            staging_dir: Some(self.root.join("staging")),
            failure_policy,
            jobs: Some(2),
            repo: None,
        }
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
    Workspace { _dir: dir, root }
}

fn program() -> ProgramName {
    ProgramName::try_from("tabby").expect("valid program")
}

fn push_request<'a>(config: &'a PackagerConfig, tag_name: &'a str) -> RunRequest<'a> {
    RunRequest {
        config,
        tag_name,
        commit_sha: "",
        mode: PublishMode::Publish,
    }
}

fn platforms(report: &PackagingReport) -> Vec<&str> {
    report
        .bundles
        .iter()
        .map(|bundle| bundle.platform_id.as_str())
        .collect()
}

#[rstest]
#[case::global_pool(None)]
#[case::single_thread(Some(1))]
#[case::wide_pool(Some(4))]
fn package_all_bundles_every_well_formed_input(workspace: Workspace, #[case] jobs: Option<usize>) {
    let inputs = vec![
        workspace.binary("tabby_x86_64-unknown-linux-gnu"),
        workspace.binary("tabby_aarch64-apple-darwin"),
        workspace.binary("tabby_x86_64-pc-windows-msvc.exe"),
    ];

    let report = package_all(&workspace.builder(), &program(), &inputs, jobs).expect("package");

    assert!(report.is_complete());
    assert_eq!(
        platforms(&report),
        [
            "aarch64-apple-darwin",
            "x86_64-pc-windows-msvc",
            "x86_64-unknown-linux-gnu"
        ]
    );
    assert!(
        workspace
            .dist()
            .join("tabby_v0.3.0_x86_64-pc-windows-msvc.zip")
            .is_file()
    );
}

#[rstest]
fn malformed_names_fail_without_stopping_siblings(workspace: Workspace) {
    let inputs = vec![
        workspace.binary("notes.txt"),
        workspace.binary("tabby_x86_64-unknown-linux-gnu"),
    ];

    let report = package_all(&workspace.builder(), &program(), &inputs, None).expect("package");

    assert_eq!(report.total(), 2);
    assert_eq!(platforms(&report), ["x86_64-unknown-linux-gnu"]);
    let [failure] = report.failures.as_slice() else {
        panic!("expected one failure, got {:?}", report.failures);
    };
    assert_eq!(failure.file_name(), "notes.txt");
    assert_eq!(failure.error.stage(), "decompose");
    assert!(
        failure
            .to_string()
            .starts_with("notes.txt (decompose): malformed binary name")
    );
}

#[rstest]
fn duplicate_platforms_keep_the_first_input(workspace: Workspace) {
    let first = workspace.binary("tabby_x86_64-pc-windows-msvc");
    let second = workspace.binary("tabby_x86_64-pc-windows-msvc.exe");

    let report = package_all(
        &workspace.builder(),
        &program(),
        &[first.clone(), second.clone()],
        Some(2),
    )
    .expect("package");

    assert_eq!(report.bundles.len(), 1);
    let [failure] = report.failures.as_slice() else {
        panic!("expected one failure, got {:?}", report.failures);
    };
    assert_eq!(failure.source_path, second);
    assert!(matches!(
        &failure.error,
        ArtifactError::DuplicatePlatform { platform_id, first: claimed }
            if platform_id == "x86_64-pc-windows-msvc" && *claimed == first
    ));
}

#[rstest]
fn bundle_failures_name_their_stage(workspace: Workspace) {
    let present = workspace.binary("tabby_aarch64-apple-darwin");
    let vanished = workspace.binaries().join("tabby_x86_64-unknown-linux-gnu");

    let report = package_all(
        &workspace.builder(),
        &program(),
        &[present, vanished.clone()],
        None,
    )
    .expect("package");

    assert_eq!(platforms(&report), ["aarch64-apple-darwin"]);
    let [failure] = report.failures.as_slice() else {
        panic!("expected one failure, got {:?}", report.failures);
    };
    assert_eq!(failure.source_path, vanished);
    assert!(matches!(
        &failure.error,
        ArtifactError::Bundle(err) if err.stage() == BundleStage::Copy
    ));
    assert_eq!(failure.error.stage(), "copy");
}

#[rstest]
#[case(FailurePolicy::FailFast, "fail-fast")]
#[case(FailurePolicy::OmitFailed, "omit-failed")]
fn failure_policy_displays_kebab_case(#[case] policy: FailurePolicy, #[case] expected: &str) {
    assert_eq!(policy.to_string(), expected);
}

#[test]
fn failure_policy_defaults_to_fail_fast() {
    assert_eq!(FailurePolicy::default(), FailurePolicy::FailFast);
}

#[rstest]
fn fail_fast_blocks_publishing(workspace: Workspace) {
    workspace.binary("tabby_x86_64-unknown-linux-gnu");
    workspace.binary("README");
    let config = workspace.config(FailurePolicy::FailFast);
    let publisher = MockReleasePublisher::new();

    let summary = run_pipeline(&push_request(&config, "v0.3.0"), &publisher).expect("run");

    assert_eq!(summary.publish, PublishStatus::Blocked { failed: 1 });
    assert!(!summary.is_success());
    assert!(matches!(
        summary.check(),
        Err(PackagerError::ArtifactsFailed {
            failed: 1,
            total: 2
        })
    ));
}

#[rstest]
fn omit_failed_publishes_the_remaining_archives(workspace: Workspace) {
    workspace.binary("tabby_x86_64-unknown-linux-gnu");
    workspace.binary("README");
    let config = workspace.config(FailurePolicy::OmitFailed);
    let store = InMemoryReleaseStore::new();

    let summary = run_pipeline(&push_request(&config, "v0.3.0"), &store).expect("run");

    let PublishStatus::Published(outcome) = &summary.publish else {
        panic!("expected a publish, got {:?}", summary.publish);
    };
    assert!(outcome.created);
    assert_eq!(
        outcome.uploaded_assets,
        ["tabby_v0.3.0_x86_64-unknown-linux-gnu.tar.gz"]
    );
    assert!(!summary.is_success());
    assert!(summary.check().is_err());
}

#[rstest]
fn omit_failed_with_nothing_left_is_blocked(workspace: Workspace) {
    workspace.binary("README");
    let config = workspace.config(FailurePolicy::OmitFailed);
    let publisher = MockReleasePublisher::new();

    let summary = run_pipeline(&push_request(&config, "v0.3.0"), &publisher).expect("run");

    assert_eq!(summary.publish, PublishStatus::Blocked { failed: 1 });
    assert!(summary.distribution.is_empty());
}

#[rstest]
fn dry_run_never_calls_the_publisher(workspace: Workspace) {
    workspace.binary("tabby_aarch64-apple-darwin");
    let config = workspace.config(FailurePolicy::FailFast);
    let publisher = MockReleasePublisher::new();
    let request = RunRequest {
        mode: PublishMode::DryRun,
        ..push_request(&config, "v1.2.3-rc.1")
    };

    let summary = run_pipeline(&request, &publisher).expect("run");

    let PublishStatus::DryRun(publish_request) = &summary.publish else {
        panic!("expected a dry run, got {:?}", summary.publish);
    };
    assert_eq!(publish_request.tag, "v1.2.3-rc.1");
    assert!(publish_request.prerelease);
    assert!(!publish_request.make_latest);
    assert!(summary.is_success());
    assert!(
        workspace
            .dist()
            .join("tabby_v1.2.3-rc.1_aarch64-apple-darwin.tar.gz")
            .is_file()
    );
}

#[rstest]
fn reruns_ignore_archives_nested_in_the_input_directory(workspace: Workspace) {
    fs::write(workspace.root.join("tabby_aarch64-apple-darwin"), b"binary").expect("write binary");
    let config = PackagerConfig {
        input_dir: workspace.root.clone(),
        ..workspace.config(FailurePolicy::FailFast)
    };
    let store = InMemoryReleaseStore::new();

    for _ in 0..2 {
        let summary = run_pipeline(&push_request(&config, "v0.3.0"), &store).expect("run");
        assert!(summary.is_success());
        assert_eq!(platforms(&summary.report), ["aarch64-apple-darwin"]);
    }

    let release = store.release("v0.3.0").expect("release exists");
    assert_eq!(
        release.assets,
        ["tabby_v0.3.0_aarch64-apple-darwin.tar.gz"]
    );
}

#[rstest]
fn stale_archives_are_not_uploaded(workspace: Workspace) {
    workspace.binary("tabby_x86_64-unknown-linux-gnu");
    fs::create_dir_all(workspace.dist()).expect("mkdir dist");
    fs::write(
        workspace.dist().join("tabby_v0.3.0_riscv64gc-unknown-linux-gnu.tar.gz"),
        b"left over",
    )
    .expect("write stale archive");
    let config = workspace.config(FailurePolicy::FailFast);
    let store = InMemoryReleaseStore::new();

    run_pipeline(&push_request(&config, "v0.3.0"), &store).expect("run");

    let uploads: Vec<_> = store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StoreCall::Upload(..)))
        .collect();
    assert_eq!(
        uploads,
        [StoreCall::Upload(
            "v0.3.0".to_owned(),
            "tabby_v0.3.0_x86_64-unknown-linux-gnu.tar.gz".to_owned()
        )]
    );
}

#[rstest]
fn missing_version_context_stops_before_discovery(workspace: Workspace) {
    let config = workspace.config(FailurePolicy::FailFast);
    let publisher = MockReleasePublisher::new();

    let err = run_pipeline(&push_request(&config, "  "), &publisher).expect_err("no version");

    assert!(matches!(
        err,
        PackagerError::Artefact(ArtefactError::MissingVersionContext)
    ));
    assert!(!workspace.dist().exists());
}

#[rstest]
fn empty_input_directory_is_an_error(workspace: Workspace) {
    fs::create_dir_all(workspace.binaries()).expect("mkdir binaries");
    let config = workspace.config(FailurePolicy::FailFast);
    let publisher = MockReleasePublisher::new();

    let err = run_pipeline(&push_request(&config, "v0.3.0"), &publisher).expect_err("empty");

    assert!(matches!(err, PackagerError::NoArtifacts { .. }));
}

#[rstest]
fn default_staging_uses_a_temporary_directory(workspace: Workspace) {
    workspace.binary("tabby_aarch64-apple-darwin");
    let config = PackagerConfig {
        staging_dir: None,
        ..workspace.config(FailurePolicy::FailFast)
    };
    let publisher = MockReleasePublisher::new();
    let request = RunRequest {
        mode: PublishMode::DryRun,
        ..push_request(&config, "v0.3.0")
    };

    let summary = run_pipeline(&request, &publisher).expect("run");

    assert!(summary.is_success());
    assert!(!workspace.root.join("staging").exists());
}

#[rstest]
fn publish_failure_is_fatal_but_keeps_the_archives(workspace: Workspace) {
    workspace.binary("tabby_aarch64-apple-darwin");
    let config = workspace.config(FailurePolicy::FailFast);
    let store = InMemoryReleaseStore::rejecting_uploads();

    let err = run_pipeline(&push_request(&config, "v0.3.0"), &store).expect_err("upload fails");

    assert!(matches!(err, PackagerError::Publish(_)));
    assert!(
        workspace
            .dist()
            .join("tabby_v0.3.0_aarch64-apple-darwin.tar.gz")
            .is_file()
    );
}
