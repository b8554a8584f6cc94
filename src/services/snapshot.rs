// src/services/snapshot.rs

//! Default snapshot provider.

use std::path::PathBuf;

use tracing::debug;

use crate::errors::Result;
use crate::services::{SnapshotProvider, SnapshotSession};

/// Provider used when no snapshot technology is available on the host.
///
/// Returns the source paths unchanged, so archiving reads the live
/// filesystem. Platform-specific providers (LVM, ZFS, VSS) implement the
/// same trait and substitute mounted snapshot paths instead.
#[derive(Debug, Default)]
pub struct PassthroughSnapshotProvider {
    counter: u64,
}

impl PassthroughSnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotProvider for PassthroughSnapshotProvider {
    fn create_snapshot(&mut self, job: &str, paths: &[PathBuf]) -> Result<SnapshotSession> {
        self.counter += 1;
        let id = format!("passthrough-{}", self.counter);
        debug!(job = %job, session = %id, "passthrough snapshot: using live paths");
        Ok(SnapshotSession {
            id,
            job: job.to_string(),
            mapped_paths: paths.to_vec(),
        })
    }

    fn release(&mut self, session: SnapshotSession) -> Result<()> {
        debug!(job = %session.job, session = %session.id, "passthrough snapshot released");
        Ok(())
    }
}
