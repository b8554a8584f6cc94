// src/engine/orchestrator.rs

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::model::ConfigFile;
use crate::config::resolve::resolve_job;
use crate::engine::{RunOptions, RunSummary};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::graph::ExecutionPlan;
use crate::pipeline::precheck::{self, Decision};
use crate::pipeline::runner::run_job;
use crate::pipeline::state::{JobRunState, RunStateTable, SkipLevel, reduce_verdict};
use crate::services::Collaborators;

/// Owns the per-run state table and drives every planned job through its
/// pre-execution check and pipeline, one at a time, in plan order.
#[derive(Debug)]
pub struct Orchestrator {
    config: ConfigFile,
    options: RunOptions,
    fs: Arc<dyn FileSystem>,
    collaborators: Collaborators,
    state: RunStateTable,
}

impl Orchestrator {
    pub fn new(
        config: ConfigFile,
        options: RunOptions,
        fs: Arc<dyn FileSystem>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            config,
            options,
            fs,
            collaborators,
            state: RunStateTable::new(),
        }
    }

    /// Execute the plan and reduce the recorded states to a summary.
    ///
    /// Job failures never abort the run; they are recorded and gate
    /// dependents through the pre-execution check. An `Err` from this
    /// method means the run itself was malformed (a planned job missing
    /// from the config), which cannot happen when the plan came from the
    /// same validated config.
    pub async fn run(mut self, plan: &ExecutionPlan) -> Result<RunSummary> {
        info!(
            jobs = plan.jobs.len(),
            simulate = self.options.simulate,
            "run starting"
        );

        for name in plan.jobs.iter() {
            let effective = resolve_job(name, &self.config, self.options.simulate)?;

            match precheck::check(&effective, &self.state, self.fs.as_ref()) {
                Decision::Skip { reason, level } => {
                    match level {
                        SkipLevel::Info => {
                            info!(job = %name, reason = %reason, "job skipped")
                        }
                        SkipLevel::Warn => {
                            warn!(job = %name, reason = %reason, "job skipped")
                        }
                        SkipLevel::Error => {
                            error!(job = %name, reason = %reason, "job skipped")
                        }
                    }
                    self.state.record(name, JobRunState::skipped(reason, level));
                }
                Decision::Proceed => {
                    debug!(job = %name, "pre-execution checks passed");
                    let state =
                        run_job(&effective, self.fs.as_ref(), &mut self.collaborators).await;
                    self.state.record(name, state);
                }
            }
        }

        let verdict = reduce_verdict(&self.state);
        info!(verdict = %verdict, "run finished");

        Ok(RunSummary {
            verdict,
            simulate: self.options.simulate,
            states: self.state,
        })
    }
}
