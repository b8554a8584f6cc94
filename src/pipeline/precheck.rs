// src/pipeline/precheck.rs

//! Pre-execution check: decides whether a job proceeds into the pipeline.

use tracing::{debug, error, warn};

use crate::config::resolve::EffectiveJobConfig;
use crate::fs::FileSystem;
use crate::pipeline::state::{RunStateTable, SkipLevel};

/// Decision for one job, evaluated just before its pipeline would start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip { reason: String, level: SkipLevel },
}

/// Evaluate the pre-execution checks for a job.
///
/// Checks short-circuit: the first failing condition determines the outcome.
///
/// 1. Disabled job → skip (info level; this is operator intent).
/// 2. `run_only_if_path_exists` with an absent primary source → skip (warn).
/// 3. Dependency gating, in declaration order:
///    - a prerequisite with no recorded state was never processed in this
///      run (e.g. filtered out of the plan) → skip (error level);
///    - a prerequisite recorded as failed *or skipped* → skip (warn level).
///      Success and warnings both count as completed. Skips recorded here
///      gate further dependents down the chain the same way.
pub fn check(cfg: &EffectiveJobConfig, table: &RunStateTable, fs: &dyn FileSystem) -> Decision {
    if !cfg.enabled {
        debug!(job = %cfg.name, "job is disabled; skipping");
        return Decision::Skip {
            reason: "job is disabled".to_string(),
            level: SkipLevel::Info,
        };
    }

    if cfg.run_only_if_path_exists {
        if let Some(primary) = cfg.source_paths.first() {
            if !fs.exists(primary) {
                warn!(
                    job = %cfg.name,
                    path = ?primary,
                    "primary source path does not exist; skipping job"
                );
                return Decision::Skip {
                    reason: format!("primary source path {:?} does not exist", primary),
                    level: SkipLevel::Warn,
                };
            }
        }
    }

    for dep in cfg.depends_on.iter() {
        match table.get(dep) {
            None => {
                error!(
                    job = %cfg.name,
                    prerequisite = %dep,
                    "prerequisite has no recorded state; skipping job"
                );
                return Decision::Skip {
                    reason: format!("prerequisite '{}' was not processed in this run", dep),
                    level: SkipLevel::Error,
                };
            }
            Some(state) if !state.status.completed_successfully() => {
                warn!(
                    job = %cfg.name,
                    prerequisite = %dep,
                    prerequisite_status = %state.status,
                    "prerequisite did not complete successfully; skipping job"
                );
                return Decision::Skip {
                    reason: format!(
                        "prerequisite '{}' finished as {}",
                        dep, state.status
                    ),
                    level: SkipLevel::Warn,
                };
            }
            Some(_) => {}
        }
    }

    Decision::Proceed
}
