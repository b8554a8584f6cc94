// src/services/notify.rs

//! Notification dispatch and the optional JSON run report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::engine::RunSummary;
use crate::fs::FileSystem;
use crate::pipeline::state::{JobRunState, JobStatus};
use crate::services::NotificationDispatcher;

/// Dispatcher that emits one structured log line per finished job.
///
/// A mail/webhook dispatcher would implement the same trait; either way the
/// core treats delivery as fire-and-forget.
#[derive(Debug, Default)]
pub struct LogNotificationDispatcher;

impl NotificationDispatcher for LogNotificationDispatcher {
    fn notify(&mut self, job: &str, state: &JobRunState) -> crate::errors::Result<()> {
        match state.status {
            JobStatus::Success => info!(
                job = %job,
                status = %state.status,
                archive = ?state.archive_path,
                "job finished"
            ),
            JobStatus::Warnings | JobStatus::Skipped => warn!(
                job = %job,
                status = %state.status,
                reason = state.reason.as_deref().unwrap_or(""),
                "job finished"
            ),
            JobStatus::Failed => tracing::error!(
                job = %job,
                status = %state.status,
                reason = state.reason.as_deref().unwrap_or(""),
                "job finished"
            ),
        }
        Ok(())
    }
}

/// Write the machine-readable run report into `report_dir`.
///
/// Best-effort: the caller logs a warning on failure and never lets it
/// affect the run verdict.
pub fn write_run_report(
    fs: &Arc<dyn FileSystem>,
    report_dir: &Path,
    summary: &RunSummary,
) -> Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = report_dir.join(format!("backstop_run_{}.json", timestamp));

    let body = serde_json::to_string_pretty(summary).context("serializing run report")?;

    fs.create_dir_all(report_dir)
        .with_context(|| format!("creating report directory {:?}", report_dir))?;
    fs.write(&path, body.as_bytes())
        .with_context(|| format!("writing run report {:?}", path))?;

    info!(report = ?path, "wrote run report");
    Ok(path)
}
