// src/config/resolve.rs

//! Resolution of the effective per-job configuration.
//!
//! The pipeline never reads `JobConfig`/`GlobalSection` directly; it receives
//! an [`EffectiveJobConfig`] with every fallback already applied. Facts
//! derived during a job's run (snapshot-mapped paths, the archive path) flow
//! through stage return values, so the resolved config stays read-only.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::ConfigFile;
use crate::errors::{BackstopError, Result};
use crate::graph::map::normalized_deps;
use crate::types::{MirrorFailurePolicy, SnapshotFailurePolicy, SourceMissingPolicy};

/// Fully resolved configuration for a single job execution.
#[derive(Debug, Clone)]
pub struct EffectiveJobConfig {
    pub name: String,
    pub enabled: bool,
    pub depends_on: Vec<String>,
    pub source_paths: Vec<PathBuf>,
    pub destination_dir: PathBuf,
    pub archive_command: String,
    pub archive_extension: String,
    pub run_only_if_path_exists: bool,
    pub on_source_missing: SourceMissingPolicy,
    pub use_snapshot: bool,
    pub on_snapshot_failure: SnapshotFailurePolicy,
    pub checksum: bool,
    pub verify_archive: bool,
    pub mirrors: Vec<PathBuf>,
    pub on_mirror_failure: MirrorFailurePolicy,
    pub retention_count: u32,
    pub treat_warnings_as_success: bool,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub simulate: bool,
}

/// Merge job, global and CLI layers for one job.
///
/// Fails only if the job is unknown or resolves to no destination; the
/// latter is already rejected at config validation, so hitting it here means
/// the caller bypassed `load_and_validate`.
pub fn resolve_job(name: &str, cfg: &ConfigFile, simulate: bool) -> Result<EffectiveJobConfig> {
    let job = cfg
        .job
        .get(name)
        .ok_or_else(|| BackstopError::JobNotFound(name.to_string()))?;

    let destination_dir = job
        .destination_dir
        .clone()
        .or_else(|| cfg.global.destination_dir.clone())
        .ok_or_else(|| {
            BackstopError::ConfigError(format!("job '{}' has no destination_dir", name))
        })?;

    Ok(EffectiveJobConfig {
        name: name.to_string(),
        enabled: job.enabled,
        depends_on: normalized_deps(&job.depends_on),
        source_paths: job.source_paths.clone(),
        destination_dir,
        archive_command: job
            .archive_command
            .clone()
            .unwrap_or_else(|| cfg.global.archive_command.clone()),
        archive_extension: job
            .archive_extension
            .clone()
            .unwrap_or_else(|| cfg.global.archive_extension.clone()),
        run_only_if_path_exists: job.run_only_if_path_exists,
        on_source_missing: job.on_source_missing,
        use_snapshot: job.use_snapshot,
        on_snapshot_failure: job.on_snapshot_failure,
        checksum: job.checksum,
        verify_archive: job.verify_archive,
        mirrors: job.mirrors.clone(),
        on_mirror_failure: job.on_mirror_failure,
        retention_count: job.retention_count.unwrap_or(cfg.global.retention_count),
        treat_warnings_as_success: job
            .treat_warnings_as_success
            .unwrap_or(cfg.global.treat_warnings_as_success),
        max_attempts: job.max_attempts.unwrap_or(cfg.global.max_attempts).max(1),
        retry_delay: Duration::from_secs(
            job.retry_delay_secs.unwrap_or(cfg.global.retry_delay_secs),
        ),
        simulate,
    })
}
