// src/services/archiver.rs

//! Production archive engine: shells out to a configurable archiver command.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::services::{ArchiveEngine, ArchiveOutcome, ArchiveRequest};

/// Runs the configured archiver command template via the platform shell,
/// retrying failed attempts up to `max_attempts` with `retry_delay` between
/// them. Exit codes 0 and 1 end the retry loop immediately (1 is the
/// conventional "completed with warnings" code of archivers like 7-Zip and
/// GNU tar).
#[derive(Debug, Default)]
pub struct CommandArchiveEngine;

impl CommandArchiveEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveEngine for CommandArchiveEngine {
    fn create_archive(
        &mut self,
        request: ArchiveRequest,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = crate::errors::Result<ArchiveOutcome>> + Send + '_>,
    > {
        Box::pin(async move {
            let mut attempts = 0;
            loop {
                attempts += 1;
                let exit_code = run_archiver_once(&request, attempts).await?;

                if exit_code == 0 || exit_code == 1 || attempts >= request.max_attempts {
                    return Ok(ArchiveOutcome {
                        exit_code,
                        attempts_made: attempts,
                    });
                }

                warn!(
                    job = %request.job,
                    exit_code,
                    attempt = attempts,
                    max_attempts = request.max_attempts,
                    delay_secs = request.retry_delay.as_secs(),
                    "archiver attempt failed; retrying after delay"
                );
                tokio::time::sleep(request.retry_delay).await;
            }
        })
    }
}

async fn run_archiver_once(request: &ArchiveRequest, attempt: u32) -> Result<i32> {
    let cmd_line = expand_command(request)?;

    info!(
        job = %request.job,
        attempt,
        cmd = %cmd_line,
        "starting archiver process"
    );

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&cmd_line);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning archiver for job '{}'", request.job))?;

    // Always consume both pipes so buffers don't fill; log at debug.
    if let Some(stdout) = child.stdout.take() {
        let job = request.job.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(job = %job, "archiver stdout: {}", line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let job = request.job.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(job = %job, "archiver stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for archiver of job '{}'", request.job))?;

    let code = status.code().unwrap_or(-1);
    info!(
        job = %request.job,
        attempt,
        exit_code = code,
        success = status.success(),
        "archiver process exited"
    );

    Ok(code)
}

/// Expand `{archive}` and `{sources}` in the command template.
fn expand_command(request: &ArchiveRequest) -> Result<String> {
    if request.sources.is_empty() {
        return Err(anyhow!(
            "job '{}' reached the archiver with no source paths",
            request.job
        ));
    }

    let archive = shell_quote(&request.archive);
    let sources = request
        .sources
        .iter()
        .map(|p| shell_quote(p))
        .collect::<Vec<_>>()
        .join(" ");

    Ok(request
        .command_template
        .replace("{archive}", &archive)
        .replace("{sources}", &sources))
}

/// Minimal single-quote shell quoting.
fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if cfg!(windows) {
        format!("\"{}\"", raw)
    } else {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
}
