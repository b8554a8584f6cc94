// src/services/sim.rs

//! Simulate-mode collaborators.
//!
//! Each one logs what the production implementation would have done and
//! reports success, so a `--simulate` run exercises the whole planning and
//! gating machinery without touching archives, snapshots or mirrors.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::Result;
use crate::services::{
    ArchiveEngine, ArchiveOutcome, ArchiveRequest, SnapshotProvider, SnapshotSession,
    TransferAgent,
};

#[derive(Debug, Default)]
pub struct SimulatedSnapshotProvider;

impl SnapshotProvider for SimulatedSnapshotProvider {
    fn create_snapshot(&mut self, job: &str, paths: &[PathBuf]) -> Result<SnapshotSession> {
        info!(job = %job, paths = paths.len(), "simulate: would create snapshot");
        Ok(SnapshotSession {
            id: "simulated".to_string(),
            job: job.to_string(),
            mapped_paths: paths.to_vec(),
        })
    }

    fn release(&mut self, session: SnapshotSession) -> Result<()> {
        info!(job = %session.job, "simulate: would release snapshot");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SimulatedArchiveEngine;

impl ArchiveEngine for SimulatedArchiveEngine {
    fn create_archive(
        &mut self,
        request: ArchiveRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<ArchiveOutcome>> + Send + '_>,
    > {
        Box::pin(async move {
            info!(
                job = %request.job,
                archive = ?request.archive,
                sources = request.sources.len(),
                "simulate: would create archive"
            );
            Ok(ArchiveOutcome {
                exit_code: 0,
                attempts_made: 1,
            })
        })
    }
}

#[derive(Debug, Default)]
pub struct SimulatedTransferAgent;

impl TransferAgent for SimulatedTransferAgent {
    fn upload(&mut self, archive: &Path, mirror: &Path) -> Result<()> {
        info!(archive = ?archive, mirror = ?mirror, "simulate: would copy archive to mirror");
        Ok(())
    }
}
