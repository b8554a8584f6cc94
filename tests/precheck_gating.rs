// tests/precheck_gating.rs

//! Pre-execution checks: disabled jobs, path gates, dependency gating.

use std::sync::Arc;

use backstop::config::resolve_job;
use backstop::fs::mock::MockFileSystem;
use backstop::pipeline::precheck::{Decision, check};
use backstop::pipeline::state::{JobRunState, JobStatus, RunStateTable, SkipLevel};
use backstop_test_utils::builders::{ConfigBuilder, JobBuilder};

fn mock_with_sources(paths: &[&str]) -> Arc<MockFileSystem> {
    let fs = MockFileSystem::new();
    for path in paths {
        fs.add_file(format!("{path}/data.bin"), b"x".to_vec());
    }
    Arc::new(fs)
}

#[test]
fn disabled_job_is_skipped_at_info_level() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new().source("/data/a").enabled(false).build(),
        )
        .build();
    let effective = resolve_job("a", &cfg, false).unwrap();
    let fs = mock_with_sources(&["/data/a"]);

    let decision = check(&effective, &RunStateTable::new(), fs.as_ref());
    assert!(matches!(
        decision,
        Decision::Skip {
            level: SkipLevel::Info,
            ..
        }
    ));
}

#[test]
fn missing_primary_path_gate_skips_at_warn_level() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new()
                .source("/data/absent")
                .run_only_if_path_exists(true)
                .build(),
        )
        .build();
    let effective = resolve_job("a", &cfg, false).unwrap();
    let fs = Arc::new(MockFileSystem::new());

    let decision = check(&effective, &RunStateTable::new(), fs.as_ref());
    match decision {
        Decision::Skip { reason, level } => {
            assert_eq!(level, SkipLevel::Warn);
            assert!(reason.contains("does not exist"));
        }
        Decision::Proceed => panic!("expected a skip"),
    }
}

#[test]
fn path_gate_is_not_consulted_when_disabled_check_fires_first() {
    // Checks short-circuit: a disabled job reports "disabled", not the
    // missing path.
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job(
            "a",
            JobBuilder::new()
                .source("/data/absent")
                .enabled(false)
                .run_only_if_path_exists(true)
                .build(),
        )
        .build();
    let effective = resolve_job("a", &cfg, false).unwrap();
    let fs = Arc::new(MockFileSystem::new());

    match check(&effective, &RunStateTable::new(), fs.as_ref()) {
        Decision::Skip { reason, level } => {
            assert_eq!(level, SkipLevel::Info);
            assert!(reason.contains("disabled"));
        }
        Decision::Proceed => panic!("expected a skip"),
    }
}

fn dependent_config() -> backstop::config::EffectiveJobConfig {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job(
            "b",
            JobBuilder::new().source("/data/b").depends_on("a").build(),
        )
        .build();
    resolve_job("b", &cfg, false).unwrap()
}

#[test]
fn unprocessed_prerequisite_skips_at_error_level() {
    let effective = dependent_config();
    let fs = mock_with_sources(&["/data/b"]);

    // "a" never recorded a state (e.g. it was filtered out of the plan).
    match check(&effective, &RunStateTable::new(), fs.as_ref()) {
        Decision::Skip { reason, level } => {
            assert_eq!(level, SkipLevel::Error);
            assert!(reason.contains("not processed"));
        }
        Decision::Proceed => panic!("expected a skip"),
    }
}

#[test]
fn failed_prerequisite_skips_dependent() {
    let effective = dependent_config();
    let fs = mock_with_sources(&["/data/b"]);

    let mut table = RunStateTable::new();
    table.record("a", JobRunState::completed(JobStatus::Failed));

    match check(&effective, &table, fs.as_ref()) {
        Decision::Skip { reason, level } => {
            assert_eq!(level, SkipLevel::Warn);
            assert!(reason.contains("failed"));
        }
        Decision::Proceed => panic!("expected a skip"),
    }
}

#[test]
fn skipped_prerequisite_gates_like_a_failed_one() {
    let effective = dependent_config();
    let fs = mock_with_sources(&["/data/b"]);

    let mut table = RunStateTable::new();
    table.record("a", JobRunState::skipped("disabled", SkipLevel::Info));

    assert!(matches!(
        check(&effective, &table, fs.as_ref()),
        Decision::Skip { .. }
    ));
}

#[test]
fn prerequisite_with_warnings_counts_as_completed() {
    let effective = dependent_config();
    let fs = mock_with_sources(&["/data/b"]);

    let mut table = RunStateTable::new();
    table.record("a", JobRunState::completed(JobStatus::Warnings));

    assert_eq!(check(&effective, &table, fs.as_ref()), Decision::Proceed);
}

#[test]
fn successful_prerequisite_lets_the_job_proceed() {
    let effective = dependent_config();
    let fs = mock_with_sources(&["/data/b"]);

    let mut table = RunStateTable::new();
    table.record("a", JobRunState::completed(JobStatus::Success));

    assert_eq!(check(&effective, &table, fs.as_ref()), Decision::Proceed);
}

#[test]
fn dependencies_are_checked_in_declaration_order() {
    let cfg = ConfigBuilder::new()
        .destination("/backups")
        .with_job("a", JobBuilder::new().source("/data/a").build())
        .with_job("b", JobBuilder::new().source("/data/b").build())
        .with_job(
            "c",
            JobBuilder::new()
                .source("/data/c")
                .depends_on("a")
                .depends_on("b")
                .build(),
        )
        .build();
    let effective = resolve_job("c", &cfg, false).unwrap();
    let fs = mock_with_sources(&["/data/c"]);

    // Both prerequisites are bad; the first declared one wins the reason.
    let mut table = RunStateTable::new();
    table.record("a", JobRunState::completed(JobStatus::Failed));
    table.record("b", JobRunState::completed(JobStatus::Failed));

    match check(&effective, &table, fs.as_ref()) {
        Decision::Skip { reason, .. } => assert!(reason.contains("'a'")),
        Decision::Proceed => panic!("expected a skip"),
    }
}
