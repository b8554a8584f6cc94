// src/config/validate.rs

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BackstopError, Result};
use crate::graph::{Severity, build_dependency_map, validate_graph};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BackstopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.global, raw.set, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_global_config(cfg)?;
    validate_jobs(cfg)?;
    validate_sets(cfg)?;
    validate_dependency_graph(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(BackstopError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.global.max_attempts == 0 {
        return Err(BackstopError::ConfigError(
            "[global].max_attempts must be >= 1 (got 0)".to_string(),
        ));
    }

    if !cfg.global.archive_command.contains("{archive}") {
        return Err(BackstopError::ConfigError(format!(
            "[global].archive_command must contain the {{archive}} placeholder (got '{}')",
            cfg.global.archive_command
        )));
    }

    Ok(())
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        if job.source_paths.is_empty() {
            return Err(BackstopError::ConfigError(format!(
                "job '{}' has no source_paths",
                name
            )));
        }

        if job.destination_dir.is_none() && cfg.global.destination_dir.is_none() {
            return Err(BackstopError::ConfigError(format!(
                "job '{}' has no destination_dir and [global].destination_dir is unset",
                name
            )));
        }

        if let Some(cmd) = &job.archive_command {
            if !cmd.contains("{archive}") {
                return Err(BackstopError::ConfigError(format!(
                    "job '{}' archive_command must contain the {{archive}} placeholder",
                    name
                )));
            }
        }

        if job.max_attempts == Some(0) {
            return Err(BackstopError::ConfigError(format!(
                "job '{}' max_attempts must be >= 1 (got 0)",
                name
            )));
        }
    }
    Ok(())
}

fn validate_sets(cfg: &RawConfigFile) -> Result<()> {
    for (name, set) in cfg.set.iter() {
        if set.jobs.is_empty() {
            return Err(BackstopError::ConfigError(format!(
                "set '{}' lists no jobs",
                name
            )));
        }
        for job in set.jobs.iter() {
            if !cfg.job.contains_key(job) {
                return Err(BackstopError::ConfigError(format!(
                    "set '{}' references unknown job '{}'",
                    name, job
                )));
            }
        }
    }
    Ok(())
}

/// Build the dependency map over *all* defined jobs and run the graph
/// validator.
///
/// Warnings (e.g. disabled prerequisites) are logged and do not block the
/// run; any error-severity message aborts before planning.
fn validate_dependency_graph(cfg: &RawConfigFile) -> Result<()> {
    let map = build_dependency_map(&cfg.job);
    let messages = validate_graph(&cfg.job, &map);

    let mut errors = Vec::new();
    for msg in messages {
        match msg.severity {
            Severity::Warning => {
                warn!(advice = %msg.advice, "{}", msg.text);
            }
            Severity::Error => {
                errors.push(format!("  - {} ({})", msg.text, msg.advice));
            }
        }
    }

    if !errors.is_empty() {
        return Err(BackstopError::GraphInvalid(errors.join("\n")));
    }

    Ok(())
}
