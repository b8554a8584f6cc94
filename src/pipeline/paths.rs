// src/pipeline/paths.rs

//! Path validation: the first pipeline stage after a job proceeds.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::resolve::EffectiveJobConfig;
use crate::fs::FileSystem;
use crate::types::SourceMissingPolicy;

/// Paths a job will actually operate on, after missing-source policy has
/// been applied.
#[derive(Debug, Clone)]
pub struct ValidatedPaths {
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
}

/// Outcome of the path validation stage.
///
/// `SkipJob` is distinguished from `FailJob`: both abort the remaining
/// stages, but a skip reflects a configured policy (`on_source_missing =
/// "skip"`) rather than an error.
#[derive(Debug, Clone)]
pub enum PathCheckOutcome {
    Ready {
        paths: ValidatedPaths,
        warnings: Vec<String>,
    },
    SkipJob {
        reason: String,
    },
    FailJob {
        reason: String,
    },
}

/// Validate source and destination paths for one job.
///
/// - Missing sources are handled per `on_source_missing` (fail / skip /
///   warn-and-drop). A job with no existing source always fails.
/// - The destination directory is created if absent and probed for
///   writability (both skipped in simulate mode).
/// - Anti-recursion: the destination must not be nested inside any source,
///   otherwise every run would archive the archives of the previous one.
pub fn validate_paths(cfg: &EffectiveJobConfig, fs: &dyn FileSystem) -> PathCheckOutcome {
    let mut warnings = Vec::new();

    let (existing, missing): (Vec<PathBuf>, Vec<PathBuf>) = cfg
        .source_paths
        .iter()
        .cloned()
        .partition(|path| fs.exists(path));

    if !missing.is_empty() {
        let listed = missing
            .iter()
            .map(|p| format!("{:?}", p))
            .collect::<Vec<_>>()
            .join(", ");

        match cfg.on_source_missing {
            SourceMissingPolicy::Fail => {
                return PathCheckOutcome::FailJob {
                    reason: format!("source path(s) not found: {}", listed),
                };
            }
            SourceMissingPolicy::Skip => {
                return PathCheckOutcome::SkipJob {
                    reason: format!("source path(s) not found: {}", listed),
                };
            }
            SourceMissingPolicy::Warn => {
                if existing.is_empty() {
                    return PathCheckOutcome::FailJob {
                        reason: format!("no source path exists: {}", listed),
                    };
                }
                warn!(
                    job = %cfg.name,
                    missing = %listed,
                    "dropping missing source path(s) and continuing"
                );
                warnings.push(format!("missing source path(s) dropped: {}", listed));
            }
        }
    }

    let destination = cfg.destination_dir.clone();

    // Checked before the destination is created, so a misconfigured job
    // leaves no directory behind inside its own sources.
    for source in existing.iter() {
        if is_nested(fs, &destination, source) {
            return PathCheckOutcome::FailJob {
                reason: format!(
                    "destination {:?} is nested inside source {:?}",
                    destination, source
                ),
            };
        }
    }

    if !fs.exists(&destination) {
        if cfg.simulate {
            info!(
                job = %cfg.name,
                destination = ?destination,
                "simulate: would create destination directory"
            );
        } else if let Err(err) = fs.create_dir_all(&destination) {
            return PathCheckOutcome::FailJob {
                reason: format!("cannot create destination {:?}: {}", destination, err),
            };
        }
    }

    if !cfg.simulate {
        if let Err(err) = probe_writable(fs, &destination) {
            return PathCheckOutcome::FailJob {
                reason: format!("destination {:?} is not writable: {}", destination, err),
            };
        }
    }

    debug!(
        job = %cfg.name,
        sources = existing.len(),
        destination = ?destination,
        "paths validated"
    );

    PathCheckOutcome::Ready {
        paths: ValidatedPaths {
            sources: existing,
            destination,
        },
        warnings,
    }
}

/// Write and remove a probe file to confirm the destination accepts writes.
fn probe_writable(fs: &dyn FileSystem, destination: &Path) -> anyhow::Result<()> {
    let probe = destination.join(".backstop-probe");
    fs.write(&probe, b"probe")?;
    fs.remove_file(&probe)?;
    Ok(())
}

/// Whether `child` lives inside `parent`.
///
/// Compares canonicalized paths when both resolve (they exist at this
/// point in the happy path); falls back to a lexical prefix check so the
/// test seam and simulate mode behave sensibly for paths that were never
/// created.
fn is_nested(fs: &dyn FileSystem, child: &Path, parent: &Path) -> bool {
    match (fs.canonicalize(child), fs.canonicalize(parent)) {
        (Ok(child), Ok(parent)) => child.starts_with(&parent),
        _ => child.starts_with(parent),
    }
}
