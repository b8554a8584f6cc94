// src/engine/mod.rs

//! Run orchestration.
//!
//! The orchestrator walks the execution plan strictly sequentially: jobs may
//! share host resources (archiver processes, destination directories,
//! snapshot slots), and dependency gating relies on a prerequisite's
//! terminal state being recorded before its dependent's pre-execution check
//! runs. Parallelizing independent branches of the DAG would require
//! protecting the state table and holding each job until its prerequisites'
//! states are durably recorded.

use serde::Serialize;

use crate::pipeline::state::{RunStateTable, RunVerdict};

pub mod orchestrator;

pub use orchestrator::Orchestrator;

/// Options that influence how a run behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log mutating operations instead of performing them.
    pub simulate: bool,
}

/// Everything recorded about a finished run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub verdict: RunVerdict,
    pub simulate: bool,
    pub states: RunStateTable,
}
