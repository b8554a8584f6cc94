// src/lib.rs

pub mod checksum;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod services;
pub mod types;

use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Orchestrator, RunOptions, RunSummary};
use crate::errors::{BackstopError, Result};
use crate::fs::RealFileSystem;
use crate::graph::{ExecutionPlan, PlanOutcome, build_dependency_map, plan_execution};
use crate::services::Collaborators;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and graph validation
/// - job selection (explicit jobs, `--set`, or all enabled jobs)
/// - execution planning
/// - the orchestrator and its collaborators
///
/// Returns the process exit code: 0 success, 1 success with warnings,
/// 2 failure. Structural errors (bad config, invalid graph) surface as
/// `Err` and are mapped to exit code 2 by `main`.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_and_validate(&args.config)?;

    let requested = select_jobs(&args, &cfg)?;
    if requested.is_empty() {
        warn!("no jobs selected (all jobs disabled?); nothing to do");
        return Ok(0);
    }

    let map = build_dependency_map(&cfg.job);
    let plan = match plan_execution(&requested, &map)? {
        PlanOutcome::Ordered(plan) => plan,
        PlanOutcome::Cycle { message, .. } => {
            return Err(BackstopError::GraphInvalid(message));
        }
    };

    info!(order = ?plan.jobs, "execution plan computed");

    if args.dry_run {
        print_dry_run(&cfg, &plan, &requested);
        return Ok(0);
    }

    let fs: Arc<dyn fs::FileSystem> = Arc::new(RealFileSystem);
    let collaborators = if args.simulate {
        Collaborators::simulated()
    } else {
        Collaborators::production(Arc::clone(&fs))
    };

    let options = RunOptions {
        simulate: args.simulate,
    };

    let orchestrator = Orchestrator::new(cfg.clone(), options, Arc::clone(&fs), collaborators);
    let summary = orchestrator.run(&plan).await?;

    print_summary(&summary);
    write_report(&cfg, &fs, &summary);

    Ok(summary.verdict.exit_code())
}

/// Resolve the requested job set from CLI arguments.
///
/// - Explicit job names are taken as-is (the planner pulls in their
///   prerequisites).
/// - `--set NAME` expands to the set's jobs.
/// - Neither: all enabled jobs.
fn select_jobs(args: &CliArgs, cfg: &ConfigFile) -> Result<Vec<String>> {
    if !args.jobs.is_empty() {
        for name in args.jobs.iter() {
            if !cfg.job.contains_key(name) {
                return Err(BackstopError::JobNotFound(name.clone()));
            }
        }
        return Ok(args.jobs.clone());
    }

    if let Some(set_name) = &args.set {
        let set = cfg.set.get(set_name).ok_or_else(|| {
            BackstopError::ConfigError(format!("set '{}' is not defined", set_name))
        })?;
        return Ok(set.jobs.clone());
    }

    Ok(cfg
        .job
        .iter()
        .filter(|(_, job)| job.enabled)
        .map(|(name, _)| name.clone())
        .collect())
}

/// Print the validated plan without executing anything.
fn print_dry_run(cfg: &ConfigFile, plan: &ExecutionPlan, requested: &[String]) {
    println!("backstop dry-run");
    println!("  requested: {:?}", requested);
    println!();

    println!("execution order ({} jobs):", plan.jobs.len());
    for (idx, name) in plan.jobs.iter().enumerate() {
        println!("  {}. {}", idx + 1, name);
        if let Some(job) = cfg.job.get(name) {
            if !job.enabled {
                println!("      enabled: false (will be skipped)");
            }
            if !job.depends_on.is_empty() {
                println!("      depends_on: {:?}", job.depends_on);
            }
            println!("      source_paths: {:?}", job.source_paths);
            if let Some(dest) = job
                .destination_dir
                .as_ref()
                .or(cfg.global.destination_dir.as_ref())
            {
                println!("      destination: {:?}", dest);
            }
            if !job.mirrors.is_empty() {
                println!("      mirrors: {:?}", job.mirrors);
            }
        }
    }
}

/// Human-readable end-of-run summary on stdout.
fn print_summary(summary: &RunSummary) {
    println!();
    println!("backstop run summary{}", if summary.simulate { " (simulate)" } else { "" });
    for (name, state) in summary.states.iter() {
        match &state.reason {
            Some(reason) => println!("  {:<24} {:<10} {}", name, state.status, reason),
            None => println!("  {:<24} {}", name, state.status),
        }
    }
    println!("overall: {}", summary.verdict);
}

/// Best-effort JSON report; failures warn and never affect the verdict.
fn write_report(cfg: &ConfigFile, fs: &Arc<dyn fs::FileSystem>, summary: &RunSummary) {
    if let Some(report_dir) = &cfg.global.report_dir {
        if summary.simulate {
            info!(report_dir = ?report_dir, "simulate: would write run report");
            return;
        }
        if let Err(err) = services::write_run_report(fs, report_dir, summary) {
            warn!(error = %err, "failed to write run report");
        }
    }
}
