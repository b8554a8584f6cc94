// src/types.rs

//! Small shared enums used by both the configuration model and the pipeline.

use serde::Deserialize;

/// What to do when one of a job's source paths does not exist at run time.
///
/// - `Fail`: the job fails (default).
/// - `Skip`: the job is skipped without being treated as a failure.
/// - `Warn`: missing sources are dropped and the job continues with the
///   remaining ones; the job status is escalated to warnings. If *no* source
///   exists the job still fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMissingPolicy {
    Fail,
    Skip,
    Warn,
}

impl Default for SourceMissingPolicy {
    fn default() -> Self {
        SourceMissingPolicy::Fail
    }
}

/// What to do when snapshot acquisition fails for a job that requested one.
///
/// - `Fail`: the job fails (default).
/// - `Continue`: archive directly from the original source paths and escalate
///   the job status to warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFailurePolicy {
    Fail,
    Continue,
}

impl Default for SnapshotFailurePolicy {
    fn default() -> Self {
        SnapshotFailurePolicy::Fail
    }
}

/// How a failed mirror transfer affects the job status.
///
/// Remaining mirrors are always attempted either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorFailurePolicy {
    Warn,
    Fail,
}

impl Default for MirrorFailurePolicy {
    fn default() -> Self {
        MirrorFailurePolicy::Warn
    }
}
