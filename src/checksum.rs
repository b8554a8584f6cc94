// src/checksum.rs

//! Archive checksum generation and verification using `blake3`.
//!
//! Checksums are stored next to the archive in a `<archive>.blake3` sidecar
//! file containing the hex digest.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Path of the checksum sidecar for a given archive.
pub fn sidecar_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".blake3");
    PathBuf::from(name)
}

/// Compute the hash of a single file through the filesystem seam.
pub fn hash_file(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut reader = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;

    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash the archive and write the sidecar file. Returns the hex digest.
pub fn write_sidecar(fs: &dyn FileSystem, archive: &Path) -> Result<String> {
    let digest = hash_file(fs, archive)?;
    let sidecar = sidecar_path(archive);
    fs.write(&sidecar, digest.as_bytes())
        .with_context(|| format!("writing checksum sidecar {:?}", sidecar))?;
    debug!(archive = ?archive, digest = %digest, "wrote checksum sidecar");
    Ok(digest)
}

/// Re-hash the archive and compare against its sidecar.
///
/// Errors if the sidecar is missing or unreadable; `Ok(false)` means the
/// digests differ.
pub fn verify_sidecar(fs: &dyn FileSystem, archive: &Path) -> Result<bool> {
    let sidecar = sidecar_path(archive);
    let recorded = fs
        .read_to_string(&sidecar)
        .with_context(|| format!("reading checksum sidecar {:?}", sidecar))?;
    let recorded = recorded.trim();
    if recorded.is_empty() {
        return Err(anyhow!("checksum sidecar {:?} is empty", sidecar));
    }

    let actual = hash_file(fs, archive)?;
    Ok(actual == recorded)
}
