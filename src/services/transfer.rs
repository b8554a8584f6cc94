// src/services/transfer.rs

//! Local mirror transfer agent.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::services::TransferAgent;

/// Copies archives to local or mounted mirror directories through the
/// filesystem seam. Remote protocols (SFTP, object storage) would implement
/// the same trait.
#[derive(Debug)]
pub struct CopyTransferAgent {
    fs: Arc<dyn FileSystem>,
}

impl CopyTransferAgent {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl TransferAgent for CopyTransferAgent {
    fn upload(&mut self, archive: &Path, mirror: &Path) -> Result<()> {
        let file_name = archive
            .file_name()
            .ok_or_else(|| anyhow!("archive path {:?} has no file name", archive))?;
        let target = mirror.join(file_name);

        self.fs
            .create_dir_all(mirror)
            .with_context(|| format!("creating mirror directory {:?}", mirror))?;
        self.fs
            .copy(archive, &target)
            .with_context(|| format!("copying archive to mirror {:?}", target))?;

        info!(archive = ?archive, mirror = ?mirror, "archive copied to mirror");
        Ok(())
    }
}
