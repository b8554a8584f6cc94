// tests/orchestrator_run.rs

//! End-to-end orchestration over a mock filesystem with fake collaborators.

use std::path::Path;
use std::sync::Arc;

use backstop::config::ConfigFile;
use backstop::engine::{Orchestrator, RunOptions, RunSummary};
use backstop::fs::FileSystem;
use backstop::fs::mock::MockFileSystem;
use backstop::graph::{ExecutionPlan, PlanOutcome, build_dependency_map, plan_execution};
use backstop::pipeline::state::{JobStatus, RunVerdict, SkipLevel};
use backstop::services::Collaborators;
use backstop::types::MirrorFailurePolicy;
use backstop_test_utils::builders::{ConfigBuilder, JobBuilder};
use backstop_test_utils::fakes::{FakeBehaviour, FakeHandles, fake_collaborators};
use backstop_test_utils::{init_tracing, with_timeout};

fn mock_with_sources(paths: &[&str]) -> Arc<MockFileSystem> {
    let fs = MockFileSystem::new();
    for path in paths {
        fs.add_file(format!("{path}/data.bin"), b"payload".to_vec());
    }
    Arc::new(fs)
}

fn plan_for(cfg: &ConfigFile, requested: &[&str]) -> ExecutionPlan {
    let map = build_dependency_map(&cfg.job);
    let requested: Vec<String> = requested.iter().map(|s| s.to_string()).collect();
    match plan_execution(&requested, &map).expect("planning") {
        PlanOutcome::Ordered(plan) => plan,
        PlanOutcome::Cycle { message, .. } => panic!("unexpected cycle: {message}"),
    }
}

async fn run_with(
    cfg: ConfigFile,
    requested: &[&str],
    fs: Arc<MockFileSystem>,
    behaviour: FakeBehaviour,
) -> (RunSummary, FakeHandles) {
    init_tracing();
    let plan = plan_for(&cfg, requested);
    let (collaborators, handles) =
        fake_collaborators(fs.clone(), behaviour);
    let orchestrator = Orchestrator::new(
        cfg,
        RunOptions { simulate: false },
        fs,
        collaborators,
    );
    let summary = with_timeout(orchestrator.run(&plan)).await.expect("run");
    (summary, handles)
}

fn status_of(summary: &RunSummary, job: &str) -> JobStatus {
    summary
        .states
        .get(job)
        .unwrap_or_else(|| panic!("no state recorded for '{job}'"))
        .status
}

#[tokio::test]
async fn chain_runs_in_dependency_order() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/b"]);

    let (summary, handles) = run_with(cfg, &["b"], fs, FakeBehaviour::default()).await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Success);
    assert_eq!(status_of(&summary, "b"), JobStatus::Success);
    assert_eq!(summary.verdict, RunVerdict::Success);
    assert_eq!(
        handles.archived.lock().unwrap().clone(),
        vec!["a".to_string(), "b".to_string()]
    );
    // Both outcomes were dispatched to the notifier.
    assert_eq!(handles.notifications.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn archive_failure_gates_dependents_transitively() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .with_job(
            "c",
            JobBuilder::new().source("/data/c").depends_on("b").build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/b", "/data/c"]);

    let (summary, handles) = run_with(
        cfg,
        &["c"],
        fs,
        FakeBehaviour::default().failing_archive("a"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Failed);
    assert_eq!(status_of(&summary, "b"), JobStatus::Skipped);
    // "c" is gated by the *skip* recorded for "b", not by "a" directly.
    assert_eq!(status_of(&summary, "c"), JobStatus::Skipped);
    let c_reason = summary.states.get("c").unwrap().reason.clone().unwrap();
    assert!(c_reason.contains("'b'"), "got: {c_reason}");

    assert_eq!(summary.verdict, RunVerdict::Failure);
    // Only "a" ever reached the archiver, and its failure was still
    // dispatched to the notifier.
    assert_eq!(handles.archived.lock().unwrap().clone(), vec!["a"]);
    assert!(
        handles
            .notifications
            .lock()
            .unwrap()
            .contains(&("a".to_string(), JobStatus::Failed))
    );
}

#[tokio::test]
async fn disabled_prerequisite_skips_dependent_at_run_time() {
    // Validation only warns about the disabled prerequisite; the plan is
    // still built, and gating happens in the pre-execution check.
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new().source("/data/a").enabled(false).build(),
        )
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/b"]);

    let (summary, handles) = run_with(cfg, &["b"], fs, FakeBehaviour::default()).await;

    let a_state = summary.states.get("a").unwrap();
    assert_eq!(a_state.status, JobStatus::Skipped);
    assert_eq!(a_state.skip_level, Some(SkipLevel::Info));

    assert_eq!(status_of(&summary, "b"), JobStatus::Skipped);
    assert!(handles.archived.lock().unwrap().is_empty());

    // The disabled skip itself is benign, but the gated dependent is not.
    assert_eq!(summary.verdict, RunVerdict::SuccessWithWarnings);
}

#[tokio::test]
async fn archiver_warnings_escalate_but_do_not_gate() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/b"]);

    let (summary, handles) = run_with(
        cfg,
        &["b"],
        fs,
        FakeBehaviour::default().warning_archive("a"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Warnings);
    assert_eq!(status_of(&summary, "b"), JobStatus::Success);
    assert_eq!(summary.verdict, RunVerdict::SuccessWithWarnings);
    assert_eq!(handles.archived.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn treat_warnings_as_success_suppresses_escalation() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .treat_warnings_as_success(true)
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, _) = run_with(
        cfg,
        &["a"],
        fs,
        FakeBehaviour::default().warning_archive("a"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Success);
    assert_eq!(summary.verdict, RunVerdict::Success);
}

#[tokio::test]
async fn independent_jobs_still_run_after_a_failure() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job("z", JobBuilder::new().source("/data/z").build())
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/z"]);

    let (summary, handles) = run_with(
        cfg,
        &["a", "z"],
        fs,
        FakeBehaviour::default().failing_archive("a"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Failed);
    assert_eq!(status_of(&summary, "z"), JobStatus::Success);
    assert_eq!(summary.verdict, RunVerdict::Failure);
    assert_eq!(handles.archived.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn checksum_sidecar_is_written_next_to_the_archive() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, _) = run_with(cfg, &["a"], fs.clone(), FakeBehaviour::default()).await;

    let archive = summary
        .states
        .get("a")
        .unwrap()
        .archive_path
        .clone()
        .expect("archive path recorded");
    assert!(fs.is_file(&archive));
    let sidecar = backstop::checksum::sidecar_path(&archive);
    assert!(fs.is_file(&sidecar), "missing sidecar {:?}", sidecar);
}

#[tokio::test]
async fn mirror_failure_warns_but_other_mirrors_are_attempted() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new()
                .source("/data/a")
                .mirror("/mnt/bad")
                .mirror("/mnt/good")
                .on_mirror_failure(MirrorFailurePolicy::Warn)
                .build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, handles) = run_with(
        cfg,
        &["a"],
        fs.clone(),
        FakeBehaviour::default().failing_mirror("/mnt/bad"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Warnings);
    assert_eq!(handles.uploads.lock().unwrap().len(), 2);

    // The good mirror received its copy.
    let archive = summary.states.get("a").unwrap().archive_path.clone().unwrap();
    let name = archive.file_name().unwrap();
    assert!(fs.is_file(&Path::new("/mnt/good").join(name)));
}

#[tokio::test]
async fn mirror_failure_can_fail_the_job() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new()
                .source("/data/a")
                .mirror("/mnt/bad")
                .on_mirror_failure(MirrorFailurePolicy::Fail)
                .build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, _) = run_with(
        cfg,
        &["a"],
        fs,
        FakeBehaviour::default().failing_mirror("/mnt/bad"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Failed);
    assert_eq!(summary.verdict, RunVerdict::Failure);
}

#[tokio::test]
async fn snapshot_sessions_are_created_and_released() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new().source("/data/a").use_snapshot(true).build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, handles) = run_with(cfg, &["a"], fs, FakeBehaviour::default()).await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Success);
    assert_eq!(handles.snapshots_created.lock().unwrap().clone(), vec!["a"]);
    assert_eq!(handles.snapshots_released.lock().unwrap().clone(), vec!["a"]);
}

#[tokio::test]
async fn snapshot_failure_honours_the_continue_policy() {
    use backstop::types::SnapshotFailurePolicy;

    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new()
                .source("/data/a")
                .use_snapshot(true)
                .on_snapshot_failure(SnapshotFailurePolicy::Continue)
                .build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, handles) = run_with(
        cfg,
        &["a"],
        fs,
        FakeBehaviour::default().failing_snapshot("a"),
    )
    .await;

    // Archived from live paths, with a warning.
    assert_eq!(status_of(&summary, "a"), JobStatus::Warnings);
    assert_eq!(handles.archived.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn snapshot_failure_fails_the_job_by_default() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new().source("/data/a").use_snapshot(true).build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a"]);

    let (summary, handles) = run_with(
        cfg,
        &["a"],
        fs,
        FakeBehaviour::default().failing_snapshot("a"),
    )
    .await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Failed);
    assert!(handles.archived.lock().unwrap().is_empty());
}

#[tokio::test]
async fn retention_prunes_oldest_archives_beyond_the_limit() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new().source("/data/a").retention(2).build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a"]);
    // Three pre-existing archives; timestamps sort lexicographically.
    for stamp in ["20240101_000000", "20240201_000000", "20240301_000000"] {
        fs.add_file(format!("/backups/a_{stamp}.tar.gz"), b"old".to_vec());
    }

    let (summary, _) = run_with(cfg, &["a"], fs.clone(), FakeBehaviour::default()).await;

    assert_eq!(status_of(&summary, "a"), JobStatus::Success);
    // 4 candidates, keep 2: the two oldest are gone, the newest old one and
    // the fresh archive remain.
    assert!(!fs.exists(Path::new("/backups/a_20240101_000000.tar.gz")));
    assert!(!fs.exists(Path::new("/backups/a_20240201_000000.tar.gz")));
    assert!(fs.exists(Path::new("/backups/a_20240301_000000.tar.gz")));
    let archive = summary.states.get("a").unwrap().archive_path.clone().unwrap();
    assert!(fs.exists(&archive));
}

#[tokio::test]
async fn unprocessed_prerequisite_in_a_handcrafted_plan_is_skipped() {
    // A plan that omits a prerequisite (normally impossible through the
    // planner) must gate the dependent instead of crashing.
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/b"]);

    init_tracing();
    let plan = ExecutionPlan {
        jobs: vec!["b".to_string()],
    };
    let (collaborators, handles) =
        fake_collaborators(fs.clone(), FakeBehaviour::default());
    let orchestrator = Orchestrator::new(
        cfg,
        RunOptions { simulate: false },
        fs,
        collaborators,
    );
    let summary = with_timeout(orchestrator.run(&plan)).await.expect("run");

    let b_state = summary.states.get("b").unwrap();
    assert_eq!(b_state.status, JobStatus::Skipped);
    assert_eq!(b_state.skip_level, Some(SkipLevel::Error));
    assert!(handles.archived.lock().unwrap().is_empty());
    assert_eq!(summary.verdict, RunVerdict::SuccessWithWarnings);
}

#[tokio::test]
async fn simulate_mode_runs_the_machinery_without_mutations() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .build();
    let fs = mock_with_sources(&["/data/a", "/data/b"]);

    init_tracing();
    let plan = plan_for(&cfg, &["b"]);
    let orchestrator = Orchestrator::new(
        cfg,
        RunOptions { simulate: true },
        fs.clone(),
        Collaborators::simulated(),
    );
    let summary = with_timeout(orchestrator.run(&plan)).await.expect("run");

    assert_eq!(status_of(&summary, "a"), JobStatus::Success);
    assert_eq!(status_of(&summary, "b"), JobStatus::Success);
    assert_eq!(summary.verdict, RunVerdict::Success);

    // Nothing was created: not even the destination directory.
    assert!(!fs.exists(Path::new("/backups")));
}
