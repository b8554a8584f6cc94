// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{MirrorFailurePolicy, SnapshotFailurePolicy, SourceMissingPolicy};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [global]
/// destination_dir = "/backups"
///
/// [set.nightly]
/// jobs = ["db", "www"]
///
/// [job.db]
/// source_paths = ["/var/lib/db"]
///
/// [job.www]
/// source_paths = ["/srv/www"]
/// depends_on = ["db"]
/// ```
///
/// All sections except `[job.<name>]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global defaults from `[global]`.
    #[serde(default)]
    pub global: GlobalSection,

    /// Named job groups from `[set.<name>]`.
    #[serde(default)]
    pub set: BTreeMap<String, SetConfig>,

    /// All jobs from `[job.<name>]`.
    ///
    /// Keys are the *job names* (e.g. `"db"`, `"www"`).
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// A configuration that has passed structural validation.
///
/// Produced via `ConfigFile::try_from(raw)`; see `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub global: GlobalSection,
    pub set: BTreeMap<String, SetConfig>,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        global: GlobalSection,
        set: BTreeMap<String, SetConfig>,
        job: BTreeMap<String, JobConfig>,
    ) -> Self {
        Self { global, set, job }
    }
}

/// `[global]` section: defaults that individual jobs may override.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalSection {
    /// Default destination directory for archives.
    ///
    /// May be omitted if every job sets its own `destination_dir`.
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,

    /// Archiver command template. `{archive}` expands to the archive path,
    /// `{sources}` to the (quoted) source paths.
    #[serde(default = "default_archive_command")]
    pub archive_command: String,

    /// Extension used when naming archive files (without a leading dot).
    #[serde(default = "default_archive_extension")]
    pub archive_extension: String,

    /// Treat archiver exit code 1 as plain success instead of warnings.
    #[serde(default)]
    pub treat_warnings_as_success: bool,

    /// How many archives to keep per job; `0` keeps everything.
    #[serde(default)]
    pub retention_count: u32,

    /// How often the archiver is invoked before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds to wait between archiver attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Directory for the optional JSON run report; no report if unset.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

fn default_archive_command() -> String {
    "tar -czf {archive} {sources}".to_string()
}

fn default_archive_extension() -> String {
    "tar.gz".to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_delay_secs() -> u64 {
    30
}

impl Default for GlobalSection {
    fn default() -> Self {
        Self {
            destination_dir: None,
            archive_command: default_archive_command(),
            archive_extension: default_archive_extension(),
            treat_warnings_as_success: false,
            retention_count: 0,
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            report_dir: None,
        }
    }
}

/// `[set.<name>]` section: a named group of jobs selectable via `--set`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SetConfig {
    /// The job names belonging to this set.
    #[serde(default)]
    pub jobs: Vec<String>,
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Disabled jobs stay in the dependency graph but are skipped at run
    /// time, and their dependents are skipped with them.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Names of jobs that must complete successfully before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// The paths to back up.
    pub source_paths: Vec<PathBuf>,

    /// Per-job destination override; falls back to `global.destination_dir`.
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,

    /// Per-job archiver command override.
    #[serde(default)]
    pub archive_command: Option<String>,

    /// Per-job archive extension override.
    #[serde(default)]
    pub archive_extension: Option<String>,

    /// Skip this job (instead of running it) when its first source path does
    /// not exist. Checked before dependency gating is reported.
    #[serde(default)]
    pub run_only_if_path_exists: bool,

    /// Policy for source paths missing at validation time.
    #[serde(default)]
    pub on_source_missing: SourceMissingPolicy,

    /// Ask the snapshot provider to map source paths before archiving.
    #[serde(default)]
    pub use_snapshot: bool,

    /// Policy when snapshot acquisition fails.
    #[serde(default)]
    pub on_snapshot_failure: SnapshotFailurePolicy,

    /// Write a blake3 checksum sidecar next to the archive.
    #[serde(default = "default_checksum")]
    pub checksum: bool,

    /// Re-hash the archive after creation and compare with the sidecar.
    #[serde(default)]
    pub verify_archive: bool,

    /// Directories the finished archive is copied to.
    #[serde(default)]
    pub mirrors: Vec<PathBuf>,

    /// Policy when a mirror transfer fails.
    #[serde(default)]
    pub on_mirror_failure: MirrorFailurePolicy,

    /// Per-job retention override; falls back to `global.retention_count`.
    #[serde(default)]
    pub retention_count: Option<u32>,

    /// Per-job override of `global.treat_warnings_as_success`.
    #[serde(default)]
    pub treat_warnings_as_success: Option<bool>,

    /// Per-job override of `global.max_attempts`.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Per-job override of `global.retry_delay_secs`.
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

fn default_checksum() -> bool {
    true
}
