#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use backstop::config::{ConfigFile, GlobalSection, JobConfig, RawConfigFile, SetConfig};
use backstop::types::{MirrorFailurePolicy, SnapshotFailurePolicy, SourceMissingPolicy};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigBuilder {
    raw: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile {
                global: GlobalSection::default(),
                set: BTreeMap::new(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw.global.destination_dir = Some(path.into());
        self
    }

    pub fn retention(mut self, count: u32) -> Self {
        self.raw.global.retention_count = count;
        self
    }

    pub fn treat_warnings_as_success(mut self, val: bool) -> Self {
        self.raw.global.treat_warnings_as_success = val;
        self
    }

    pub fn report_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw.global.report_dir = Some(path.into());
        self
    }

    pub fn with_set(mut self, name: &str, jobs: &[&str]) -> Self {
        self.raw.set.insert(
            name.to_string(),
            SetConfig {
                jobs: jobs.iter().map(|j| j.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.raw.job.insert(name.to_string(), job);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.raw).expect("Failed to build valid config from builder")
    }

    /// Like `build`, but surfaces validation errors for negative tests.
    pub fn try_build(self) -> backstop::errors::Result<ConfigFile> {
        ConfigFile::try_from(self.raw)
    }

    /// Access the raw (unvalidated) job table, e.g. for direct graph tests.
    pub fn into_jobs(self) -> BTreeMap<String, JobConfig> {
        self.raw.job
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobBuilder {
    job: JobConfig,
}

impl JobBuilder {
    pub fn new() -> Self {
        Self {
            job: JobConfig {
                enabled: true,
                depends_on: vec![],
                source_paths: vec![],
                destination_dir: None,
                archive_command: None,
                archive_extension: None,
                run_only_if_path_exists: false,
                on_source_missing: SourceMissingPolicy::Fail,
                use_snapshot: false,
                on_snapshot_failure: SnapshotFailurePolicy::Fail,
                checksum: true,
                verify_archive: false,
                mirrors: vec![],
                on_mirror_failure: MirrorFailurePolicy::Warn,
                retention_count: None,
                treat_warnings_as_success: None,
                max_attempts: None,
                retry_delay_secs: None,
            },
        }
    }

    pub fn enabled(mut self, val: bool) -> Self {
        self.job.enabled = val;
        self
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.job.depends_on.push(dep.to_string());
        self
    }

    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.job.source_paths.push(path.into());
        self
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.job.destination_dir = Some(path.into());
        self
    }

    pub fn run_only_if_path_exists(mut self, val: bool) -> Self {
        self.job.run_only_if_path_exists = val;
        self
    }

    pub fn on_source_missing(mut self, policy: SourceMissingPolicy) -> Self {
        self.job.on_source_missing = policy;
        self
    }

    pub fn use_snapshot(mut self, val: bool) -> Self {
        self.job.use_snapshot = val;
        self
    }

    pub fn on_snapshot_failure(mut self, policy: SnapshotFailurePolicy) -> Self {
        self.job.on_snapshot_failure = policy;
        self
    }

    pub fn checksum(mut self, val: bool) -> Self {
        self.job.checksum = val;
        self
    }

    pub fn verify_archive(mut self, val: bool) -> Self {
        self.job.verify_archive = val;
        self
    }

    pub fn mirror(mut self, path: impl Into<PathBuf>) -> Self {
        self.job.mirrors.push(path.into());
        self
    }

    pub fn on_mirror_failure(mut self, policy: MirrorFailurePolicy) -> Self {
        self.job.on_mirror_failure = policy;
        self
    }

    pub fn retention(mut self, count: u32) -> Self {
        self.job.retention_count = Some(count);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.job.max_attempts = Some(attempts);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self::new()
    }
}
