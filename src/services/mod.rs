// src/services/mod.rs

//! External collaborators behind narrow, result-bearing contracts.
//!
//! The pipeline core never talks to an archiver binary, a snapshot facility
//! or a mirror target directly; it calls these traits and interprets the
//! structured results. Production implementations live in the submodules;
//! `--simulate` swaps in the implementations from [`sim`], and tests
//! provide their own fakes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pipeline::state::JobRunState;

pub mod archiver;
pub mod notify;
pub mod sim;
pub mod snapshot;
pub mod transfer;

pub use archiver::CommandArchiveEngine;
pub use notify::{LogNotificationDispatcher, write_run_report};
pub use snapshot::PassthroughSnapshotProvider;
pub use transfer::CopyTransferAgent;

/// Handle for an acquired snapshot.
///
/// The core only consumes the mapped paths; whatever else a provider needs
/// to release the snapshot later is keyed by `id`.
#[derive(Debug, Clone)]
pub struct SnapshotSession {
    pub id: String,
    pub job: String,
    pub mapped_paths: Vec<PathBuf>,
}

/// Maps source paths onto a point-in-time view before archiving.
pub trait SnapshotProvider: Send {
    fn create_snapshot(&mut self, job: &str, paths: &[PathBuf]) -> Result<SnapshotSession>;
    fn release(&mut self, session: SnapshotSession) -> Result<()>;
}

/// One archiver invocation, fully resolved.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub job: String,
    pub sources: Vec<PathBuf>,
    pub archive: PathBuf,
    pub command_template: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

/// Result of an archiver run.
///
/// Exit code semantics (interpreted by the pipeline, not the engine):
/// 0 = success, 1 = warnings, anything else = failure.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveOutcome {
    pub exit_code: i32,
    pub attempts_made: u32,
}

/// Creates the archive for a job.
///
/// An `Err` means the engine could not run at all (spawn failure); a
/// non-zero exit code travels through `ArchiveOutcome`.
pub trait ArchiveEngine: Send {
    fn create_archive(
        &mut self,
        request: ArchiveRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ArchiveOutcome>> + Send + '_>>;
}

/// Copies a finished archive to a mirror target.
pub trait TransferAgent: Send {
    fn upload(&mut self, archive: &Path, mirror: &Path) -> Result<()>;
}

/// Delivers the per-job outcome after the pipeline finishes.
///
/// Fire-and-forget from the core's perspective: failures are logged and
/// never change a job's recorded status.
pub trait NotificationDispatcher: Send {
    fn notify(&mut self, job: &str, state: &JobRunState) -> Result<()>;
}

/// The collaborator bundle handed to the orchestrator.
pub struct Collaborators {
    pub snapshots: Box<dyn SnapshotProvider>,
    pub archiver: Box<dyn ArchiveEngine>,
    pub transfer: Box<dyn TransferAgent>,
    pub notifier: Box<dyn NotificationDispatcher>,
}

impl Collaborators {
    /// Production wiring: shell-out archiver, passthrough snapshots, local
    /// copy transfer, log-based notifications.
    pub fn production(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            snapshots: Box::new(PassthroughSnapshotProvider::new()),
            archiver: Box::new(CommandArchiveEngine::new()),
            transfer: Box::new(CopyTransferAgent::new(fs)),
            notifier: Box::new(LogNotificationDispatcher),
        }
    }

    /// Simulate-mode wiring: nothing is archived, copied or released; every
    /// collaborator logs its intent and reports success.
    pub fn simulated() -> Self {
        Self {
            snapshots: Box::new(sim::SimulatedSnapshotProvider),
            archiver: Box::new(sim::SimulatedArchiveEngine),
            transfer: Box::new(sim::SimulatedTransferAgent),
            notifier: Box::new(LogNotificationDispatcher),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
