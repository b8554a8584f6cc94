// src/pipeline/state.rs

//! Per-job run state and the run-level state table.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Terminal status of a job for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// All stages completed cleanly.
    Success,
    /// Completed, but at least one stage reported a warning.
    Warnings,
    /// A stage failed; remaining productive stages were aborted.
    Failed,
    /// The job never proceeded past its pre-execution check, or a stage
    /// classified the condition as skip-worthy rather than a failure.
    Skipped,
}

impl JobStatus {
    /// Worst-of combination used for stage escalation. A status never
    /// de-escalates: once a job is failed it stays failed.
    pub fn escalate(self, other: JobStatus) -> JobStatus {
        use JobStatus::*;
        match (self, other) {
            (Failed, _) | (_, Failed) => Failed,
            (Skipped, _) | (_, Skipped) => Skipped,
            (Warnings, _) | (_, Warnings) => Warnings,
            (Success, Success) => Success,
        }
    }

    /// Whether this status satisfies a dependent's gating check.
    ///
    /// Warnings count as completed successfully; Failed and Skipped do not.
    pub fn completed_successfully(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Warnings)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Success => "success",
            JobStatus::Warnings => "warnings",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// How loudly a skip is reported, and whether it taints the run verdict.
///
/// `Info` marks a skip that reflects operator intent (the job is disabled);
/// `Warn`/`Error` mark skips the operator probably wants to know about
/// (missing path gate, unprocessed or failed prerequisite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipLevel {
    Info,
    Warn,
    Error,
}

/// Outcome record for one job, created when the job reaches the front of the
/// plan and written to the table exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct JobRunState {
    pub status: JobStatus,
    pub reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub archive_path: Option<PathBuf>,
    pub attempts_made: u32,
    pub skip_level: Option<SkipLevel>,
}

impl JobRunState {
    /// A terminal record with the given status and no further detail.
    pub fn completed(status: JobStatus) -> Self {
        let now = Utc::now();
        Self {
            status,
            reason: None,
            started_at: now,
            finished_at: Some(now),
            archive_path: None,
            attempts_made: 0,
            skip_level: None,
        }
    }

    pub fn skipped(reason: impl Into<String>, level: SkipLevel) -> Self {
        let now = Utc::now();
        Self {
            status: JobStatus::Skipped,
            reason: Some(reason.into()),
            started_at: now,
            finished_at: Some(now),
            archive_path: None,
            attempts_made: 0,
            skip_level: Some(level),
        }
    }
}

/// The per-run success-state table.
///
/// Owned by the orchestrator and passed by reference to the pre-execution
/// checker; deliberately not a module-level singleton. Each job's entry is
/// recorded before the next job in the plan starts, which is what makes
/// dependency gating sound under strictly sequential execution.
#[derive(Debug, Default, Serialize)]
pub struct RunStateTable {
    states: BTreeMap<String, JobRunState>,
}

impl RunStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, state: JobRunState) {
        self.states.insert(name.into(), state);
    }

    pub fn get(&self, name: &str) -> Option<&JobRunState> {
        self.states.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JobRunState)> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Run-level verdict, reduced from all terminal job statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunVerdict {
    Success,
    SuccessWithWarnings,
    Failure,
}

impl RunVerdict {
    /// Process exit code for this verdict.
    pub fn exit_code(self) -> i32 {
        match self {
            RunVerdict::Success => 0,
            RunVerdict::SuccessWithWarnings => 1,
            RunVerdict::Failure => 2,
        }
    }
}

impl std::fmt::Display for RunVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunVerdict::Success => "success",
            RunVerdict::SuccessWithWarnings => "success (with warnings)",
            RunVerdict::Failure => "failure",
        };
        f.write_str(s)
    }
}

/// Reduce the state table to a run verdict.
///
/// Any failed job means failure. Warnings, and skips at warn/error level,
/// reduce to success-with-warnings; an info-level skip (job disabled by its
/// owner) does not taint the run. An empty table is a success.
pub fn reduce_verdict(table: &RunStateTable) -> RunVerdict {
    let mut warnings = false;

    for (_, state) in table.iter() {
        match state.status {
            JobStatus::Failed => return RunVerdict::Failure,
            JobStatus::Warnings => warnings = true,
            JobStatus::Skipped => {
                if state.skip_level != Some(SkipLevel::Info) {
                    warnings = true;
                }
            }
            JobStatus::Success => {}
        }
    }

    if warnings {
        RunVerdict::SuccessWithWarnings
    } else {
        RunVerdict::Success
    }
}
