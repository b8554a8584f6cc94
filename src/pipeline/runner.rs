// src/pipeline/runner.rs

//! Drives a single job through its pipeline stages.
//!
//! Stage order: path validation → snapshot acquisition → archive creation →
//! checksum/verification → mirror transfer → retention → notification.
//! Each stage may escalate the job status but never un-escalate it; the
//! final status is the worst outcome across all stages. Retention and
//! notification are best-effort and run even when an earlier stage failed.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::checksum;
use crate::config::resolve::EffectiveJobConfig;
use crate::fs::FileSystem;
use crate::pipeline::paths::{PathCheckOutcome, ValidatedPaths, validate_paths};
use crate::pipeline::state::{JobRunState, JobStatus, SkipLevel};
use crate::services::{ArchiveRequest, Collaborators, SnapshotSession};
use crate::types::{MirrorFailurePolicy, SnapshotFailurePolicy};

/// Outcome of the productive stages (everything before retention).
struct ProductiveOutcome {
    status: JobStatus,
    reasons: Vec<String>,
    archive_path: Option<PathBuf>,
    attempts_made: u32,
    /// Present once path validation has passed; retention needs it.
    destination: Option<PathBuf>,
    skip_level: Option<SkipLevel>,
}

/// Execute the pipeline for one job that passed its pre-execution check.
pub async fn run_job(
    cfg: &EffectiveJobConfig,
    fs: &dyn FileSystem,
    collab: &mut Collaborators,
) -> JobRunState {
    let started_at = Utc::now();
    info!(job = %cfg.name, simulate = cfg.simulate, "job pipeline starting");

    let mut outcome = productive_stages(cfg, fs, collab).await;

    // Retention is attempted even for failed jobs, as long as the
    // destination was validated; its failures only ever warn.
    if let Some(destination) = outcome.destination.clone() {
        match apply_retention(cfg, fs, &destination) {
            Ok(0) => {}
            Ok(pruned) => info!(job = %cfg.name, pruned, "retention pruned old archives"),
            Err(err) => {
                warn!(job = %cfg.name, error = %err, "retention failed");
                outcome.status = outcome.status.escalate(JobStatus::Warnings);
                outcome.reasons.push(format!("retention failed: {}", err));
            }
        }
    }

    let state = JobRunState {
        status: outcome.status,
        reason: if outcome.reasons.is_empty() {
            None
        } else {
            Some(outcome.reasons.join("; "))
        },
        started_at,
        finished_at: Some(Utc::now()),
        archive_path: outcome.archive_path,
        attempts_made: outcome.attempts_made,
        skip_level: outcome.skip_level,
    };

    // Fire-and-forget: a failed notification never changes the recorded
    // status.
    if let Err(err) = collab.notifier.notify(&cfg.name, &state) {
        warn!(job = %cfg.name, error = %err, "notification dispatch failed");
    }

    state
}

async fn productive_stages(
    cfg: &EffectiveJobConfig,
    fs: &dyn FileSystem,
    collab: &mut Collaborators,
) -> ProductiveOutcome {
    let mut status = JobStatus::Success;
    let mut reasons: Vec<String> = Vec::new();

    // Stage: path validation.
    let paths = match validate_paths(cfg, fs) {
        PathCheckOutcome::Ready { paths, warnings } => {
            for w in warnings {
                status = status.escalate(JobStatus::Warnings);
                reasons.push(w);
            }
            paths
        }
        PathCheckOutcome::SkipJob { reason } => {
            info!(job = %cfg.name, reason = %reason, "job skipped by path validation");
            return ProductiveOutcome {
                status: JobStatus::Skipped,
                reasons: vec![reason],
                archive_path: None,
                attempts_made: 0,
                destination: None,
                skip_level: Some(SkipLevel::Warn),
            };
        }
        PathCheckOutcome::FailJob { reason } => {
            return ProductiveOutcome {
                status: JobStatus::Failed,
                reasons: vec![reason],
                archive_path: None,
                attempts_made: 0,
                destination: None,
                skip_level: None,
            };
        }
    };

    let destination = paths.destination.clone();

    // Stage: snapshot acquisition.
    let (archive_sources, session) = match acquire_snapshot(cfg, &paths, collab) {
        SnapshotStage::Mapped { sources, session } => (sources, session),
        SnapshotStage::ContinueWithout { reason } => {
            status = status.escalate(JobStatus::Warnings);
            reasons.push(reason);
            (paths.sources.clone(), None)
        }
        SnapshotStage::Fail { reason } => {
            return ProductiveOutcome {
                status: JobStatus::Failed,
                reasons: vec![reason],
                archive_path: None,
                attempts_made: 0,
                destination: Some(destination),
                skip_level: None,
            };
        }
    };

    // Stage: archive creation. The snapshot is released afterwards no matter
    // how archiving went.
    let archive = archive_file_path(cfg);
    let request = ArchiveRequest {
        job: cfg.name.clone(),
        sources: archive_sources,
        archive: archive.clone(),
        command_template: cfg.archive_command.clone(),
        max_attempts: cfg.max_attempts,
        retry_delay: cfg.retry_delay,
    };

    let archive_result = collab.archiver.create_archive(request).await;

    if let Some(session) = session {
        release_snapshot(cfg, session, collab, &mut status, &mut reasons);
    }

    let mut attempts_made = 0;
    match archive_result {
        Ok(result) => {
            attempts_made = result.attempts_made;
            match result.exit_code {
                0 => {}
                1 => {
                    if cfg.treat_warnings_as_success {
                        debug!(
                            job = %cfg.name,
                            "archiver warnings treated as success per configuration"
                        );
                    } else {
                        status = status.escalate(JobStatus::Warnings);
                        reasons.push("archiver reported warnings (exit code 1)".to_string());
                    }
                }
                code => {
                    return ProductiveOutcome {
                        status: JobStatus::Failed,
                        reasons: vec![format!(
                            "archiver failed with exit code {} after {} attempt(s)",
                            code, result.attempts_made
                        )],
                        archive_path: None,
                        attempts_made: result.attempts_made,
                        destination: Some(destination),
                        skip_level: None,
                    };
                }
            }
        }
        Err(err) => {
            return ProductiveOutcome {
                status: JobStatus::Failed,
                reasons: vec![format!("archiver could not run: {}", err)],
                archive_path: None,
                attempts_made,
                destination: Some(destination),
                skip_level: None,
            };
        }
    }

    // Stage: checksum and optional verification.
    if cfg.checksum {
        if cfg.simulate {
            info!(job = %cfg.name, "simulate: would write checksum sidecar");
        } else {
            match checksum::write_sidecar(fs, &archive) {
                Ok(digest) => {
                    debug!(job = %cfg.name, digest = %digest, "checksum written");
                    if cfg.verify_archive {
                        match checksum::verify_sidecar(fs, &archive) {
                            Ok(true) => {
                                debug!(job = %cfg.name, "archive verification passed");
                            }
                            Ok(false) => {
                                return ProductiveOutcome {
                                    status: JobStatus::Failed,
                                    reasons: vec![
                                        "archive verification failed: checksum mismatch"
                                            .to_string(),
                                    ],
                                    archive_path: Some(archive),
                                    attempts_made,
                                    destination: Some(destination),
                                    skip_level: None,
                                };
                            }
                            Err(err) => {
                                status = status.escalate(JobStatus::Warnings);
                                reasons.push(format!("archive verification errored: {}", err));
                            }
                        }
                    }
                }
                Err(err) => {
                    status = status.escalate(JobStatus::Warnings);
                    reasons.push(format!("checksum write failed: {}", err));
                }
            }
        }
    }

    // Stage: mirror transfer. Every mirror is attempted; failures aggregate
    // per the configured policy.
    let mut failed_mirrors = Vec::new();
    for mirror in cfg.mirrors.iter() {
        if let Err(err) = collab.transfer.upload(&archive, mirror) {
            warn!(job = %cfg.name, mirror = ?mirror, error = %err, "mirror transfer failed");
            failed_mirrors.push(format!("{:?}: {}", mirror, err));
        }
    }
    if !failed_mirrors.is_empty() {
        let reason = format!("mirror transfer failed for {}", failed_mirrors.join(", "));
        match cfg.on_mirror_failure {
            MirrorFailurePolicy::Warn => {
                status = status.escalate(JobStatus::Warnings);
                reasons.push(reason);
            }
            MirrorFailurePolicy::Fail => {
                return ProductiveOutcome {
                    status: JobStatus::Failed,
                    reasons: vec![reason],
                    archive_path: Some(archive),
                    attempts_made,
                    destination: Some(destination),
                    skip_level: None,
                };
            }
        }
    }

    ProductiveOutcome {
        status,
        reasons,
        archive_path: Some(archive),
        attempts_made,
        destination: Some(destination),
        skip_level: None,
    }
}

enum SnapshotStage {
    Mapped {
        sources: Vec<PathBuf>,
        session: Option<SnapshotSession>,
    },
    ContinueWithout {
        reason: String,
    },
    Fail {
        reason: String,
    },
}

fn acquire_snapshot(
    cfg: &EffectiveJobConfig,
    paths: &ValidatedPaths,
    collab: &mut Collaborators,
) -> SnapshotStage {
    if !cfg.use_snapshot {
        return SnapshotStage::Mapped {
            sources: paths.sources.clone(),
            session: None,
        };
    }

    match collab.snapshots.create_snapshot(&cfg.name, &paths.sources) {
        Ok(session) => {
            debug!(job = %cfg.name, session = %session.id, "snapshot acquired");
            SnapshotStage::Mapped {
                sources: session.mapped_paths.clone(),
                session: Some(session),
            }
        }
        Err(err) => match cfg.on_snapshot_failure {
            SnapshotFailurePolicy::Fail => SnapshotStage::Fail {
                reason: format!("snapshot acquisition failed: {}", err),
            },
            SnapshotFailurePolicy::Continue => {
                warn!(
                    job = %cfg.name,
                    error = %err,
                    "snapshot acquisition failed; archiving from live paths"
                );
                SnapshotStage::ContinueWithout {
                    reason: format!("snapshot failed, archived live paths: {}", err),
                }
            }
        },
    }
}

fn release_snapshot(
    cfg: &EffectiveJobConfig,
    session: SnapshotSession,
    collab: &mut Collaborators,
    status: &mut JobStatus,
    reasons: &mut Vec<String>,
) {
    if let Err(err) = collab.snapshots.release(session) {
        warn!(job = %cfg.name, error = %err, "snapshot release failed");
        *status = status.escalate(JobStatus::Warnings);
        reasons.push(format!("snapshot release failed: {}", err));
    }
}

/// Archive path: `<destination>/<job>_<utc-timestamp>.<ext>`.
///
/// The timestamp embeds lexicographic = chronological ordering, which
/// retention relies on.
fn archive_file_path(cfg: &EffectiveJobConfig) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    cfg.destination_dir
        .join(format!("{}_{}.{}", cfg.name, timestamp, cfg.archive_extension))
}

/// Prune the oldest archives of this job beyond `retention_count`, together
/// with their checksum sidecars. `retention_count == 0` keeps everything.
fn apply_retention(
    cfg: &EffectiveJobConfig,
    fs: &dyn FileSystem,
    destination: &Path,
) -> anyhow::Result<usize> {
    if cfg.retention_count == 0 {
        return Ok(0);
    }

    let prefix = format!("{}_", cfg.name);
    let suffix = format!(".{}", cfg.archive_extension);

    let mut archives: Vec<PathBuf> = fs
        .read_dir(destination)?
        .into_iter()
        .filter(|p| fs.is_file(p))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(&suffix))
                .unwrap_or(false)
        })
        .collect();

    archives.sort();

    let keep = cfg.retention_count as usize;
    if archives.len() <= keep {
        return Ok(0);
    }

    let prune_count = archives.len() - keep;
    let mut pruned = 0;

    for old in archives.into_iter().take(prune_count) {
        if cfg.simulate {
            info!(job = %cfg.name, archive = ?old, "simulate: would prune old archive");
            pruned += 1;
            continue;
        }

        fs.remove_file(&old)?;
        let sidecar = checksum::sidecar_path(&old);
        if fs.exists(&sidecar) {
            fs.remove_file(&sidecar)?;
        }
        debug!(job = %cfg.name, archive = ?old, "pruned old archive");
        pruned += 1;
    }

    Ok(pruned)
}
