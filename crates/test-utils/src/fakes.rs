#![allow(dead_code)]

//! Fake collaborators for pipeline and orchestrator tests.
//!
//! The fake archive engine writes a small file through the filesystem seam
//! so that checksum/verify/transfer/retention stages have something real to
//! operate on (typically a `MockFileSystem`).

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use backstop::errors::Result;
use backstop::fs::FileSystem;
use backstop::pipeline::state::{JobRunState, JobStatus};
use backstop::services::{
    ArchiveEngine, ArchiveOutcome, ArchiveRequest, Collaborators, NotificationDispatcher,
    SnapshotProvider, SnapshotSession, TransferAgent,
};

/// Shared handles into the fakes, for assertions after a run.
#[derive(Clone, Default)]
pub struct FakeHandles {
    /// Job names, in archiver invocation order.
    pub archived: Arc<Mutex<Vec<String>>>,
    /// (archive, mirror) pairs attempted.
    pub uploads: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    /// (job, status) pairs notified.
    pub notifications: Arc<Mutex<Vec<(String, JobStatus)>>>,
    /// Snapshot sessions created / released, by job name.
    pub snapshots_created: Arc<Mutex<Vec<String>>>,
    pub snapshots_released: Arc<Mutex<Vec<String>>>,
}

/// Per-test behaviour knobs for the fakes.
#[derive(Clone, Default)]
pub struct FakeBehaviour {
    /// Jobs whose archiver exits with code 2.
    pub fail_jobs: HashSet<String>,
    /// Jobs whose archiver exits with code 1 (warnings).
    pub warn_jobs: HashSet<String>,
    /// Jobs whose archiver cannot even spawn (`Err`).
    pub error_jobs: HashSet<String>,
    /// Jobs whose snapshot acquisition fails.
    pub snapshot_fail_jobs: HashSet<String>,
    /// Mirror directories whose transfers fail.
    pub fail_mirrors: HashSet<PathBuf>,
}

impl FakeBehaviour {
    pub fn failing_archive(mut self, job: &str) -> Self {
        self.fail_jobs.insert(job.to_string());
        self
    }

    pub fn warning_archive(mut self, job: &str) -> Self {
        self.warn_jobs.insert(job.to_string());
        self
    }

    pub fn erroring_archive(mut self, job: &str) -> Self {
        self.error_jobs.insert(job.to_string());
        self
    }

    pub fn failing_snapshot(mut self, job: &str) -> Self {
        self.snapshot_fail_jobs.insert(job.to_string());
        self
    }

    pub fn failing_mirror(mut self, mirror: impl Into<PathBuf>) -> Self {
        self.fail_mirrors.insert(mirror.into());
        self
    }
}

/// Build a full collaborator bundle out of fakes.
pub fn fake_collaborators(
    fs: Arc<dyn FileSystem>,
    behaviour: FakeBehaviour,
) -> (Collaborators, FakeHandles) {
    let handles = FakeHandles::default();

    let collaborators = Collaborators {
        snapshots: Box::new(FakeSnapshotProvider {
            behaviour: behaviour.clone(),
            handles: handles.clone(),
        }),
        archiver: Box::new(FakeArchiveEngine {
            fs: Arc::clone(&fs),
            behaviour: behaviour.clone(),
            handles: handles.clone(),
        }),
        transfer: Box::new(FakeTransferAgent {
            fs,
            behaviour,
            handles: handles.clone(),
        }),
        notifier: Box::new(CollectingNotifier {
            handles: handles.clone(),
        }),
    };

    (collaborators, handles)
}

pub struct FakeArchiveEngine {
    fs: Arc<dyn FileSystem>,
    behaviour: FakeBehaviour,
    handles: FakeHandles,
}

impl ArchiveEngine for FakeArchiveEngine {
    fn create_archive(
        &mut self,
        request: ArchiveRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ArchiveOutcome>> + Send + '_>> {
        let fs = Arc::clone(&self.fs);
        let behaviour = self.behaviour.clone();
        let archived = Arc::clone(&self.handles.archived);

        Box::pin(async move {
            archived.lock().unwrap().push(request.job.clone());

            if behaviour.error_jobs.contains(&request.job) {
                return Err(anyhow!("simulated archiver spawn failure").into());
            }

            let exit_code = if behaviour.fail_jobs.contains(&request.job) {
                2
            } else if behaviour.warn_jobs.contains(&request.job) {
                1
            } else {
                0
            };

            if exit_code <= 1 {
                fs.write(&request.archive, b"fake archive contents")?;
            }

            Ok(ArchiveOutcome {
                exit_code,
                attempts_made: 1,
            })
        })
    }
}

pub struct FakeSnapshotProvider {
    behaviour: FakeBehaviour,
    handles: FakeHandles,
}

impl SnapshotProvider for FakeSnapshotProvider {
    fn create_snapshot(&mut self, job: &str, paths: &[PathBuf]) -> Result<SnapshotSession> {
        if self.behaviour.snapshot_fail_jobs.contains(job) {
            return Err(anyhow!("simulated snapshot failure").into());
        }
        self.handles
            .snapshots_created
            .lock()
            .unwrap()
            .push(job.to_string());
        Ok(SnapshotSession {
            id: format!("fake-{}", job),
            job: job.to_string(),
            mapped_paths: paths.to_vec(),
        })
    }

    fn release(&mut self, session: SnapshotSession) -> Result<()> {
        self.handles
            .snapshots_released
            .lock()
            .unwrap()
            .push(session.job);
        Ok(())
    }
}

pub struct FakeTransferAgent {
    fs: Arc<dyn FileSystem>,
    behaviour: FakeBehaviour,
    handles: FakeHandles,
}

impl TransferAgent for FakeTransferAgent {
    fn upload(&mut self, archive: &Path, mirror: &Path) -> Result<()> {
        self.handles
            .uploads
            .lock()
            .unwrap()
            .push((archive.to_path_buf(), mirror.to_path_buf()));

        if self.behaviour.fail_mirrors.contains(mirror) {
            return Err(anyhow!("simulated transfer failure to {:?}", mirror).into());
        }

        let file_name = archive
            .file_name()
            .ok_or_else(|| anyhow!("archive path {:?} has no file name", archive))?;
        self.fs.copy(archive, &mirror.join(file_name))?;
        Ok(())
    }
}

pub struct CollectingNotifier {
    handles: FakeHandles,
}

impl NotificationDispatcher for CollectingNotifier {
    fn notify(&mut self, job: &str, state: &JobRunState) -> Result<()> {
        self.handles
            .notifications
            .lock()
            .unwrap()
            .push((job.to_string(), state.status));
        Ok(())
    }
}
