use super::credentials::Credentials;
use super::rclone_monitor::{TransferMonitor, TransferSummary};
use crate::error::{Result, SyncError};
use crate::eventlog::{SyncPlan, TransferMode};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Everything one transfer needs, as typed fields.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub mode: TransferMode,
    pub source: PathBuf,
    pub destination: String,
    pub exclude: Option<String>,
    pub credentials: Credentials,
    pub region: Option<String>,
}

impl TransferRequest {
    pub fn from_plan(plan: &SyncPlan, credentials: Credentials, region: Option<String>) -> Self {
        Self {
            mode: plan.mode,
            source: plan.source.clone(),
            destination: plan.destination.clone(),
            exclude: plan.exclude.clone(),
            credentials,
            region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStatus {
    /// Process exit code; `-1` when killed by a signal.
    pub exit_code: i32,
    pub summary: TransferSummary,
}

impl TransferStatus {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Copies local files to the object store. Blocks until done.
#[async_trait]
pub trait TransferTool: Send + Sync {
    async fn run(&self, request: &TransferRequest) -> Result<TransferStatus>;
}

pub struct RcloneTransfer {
    program: String,
}

impl RcloneTransfer {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Build the command without shell interpolation. Secrets go through
    /// the environment so they never show up in the process list.
    pub fn command(&self, request: &TransferRequest) -> Command {
        let mut cmd = Command::new(&self.program);

        cmd.arg(request.mode.as_subcommand());
        cmd.arg(&request.source);
        cmd.arg(&request.destination);

        // Writers rewrite files in place; skip the "changed during upload" check
        cmd.args(["--local-no-check-updated", "-v"]);

        if let Some(pattern) = &request.exclude {
            cmd.arg("--exclude").arg(pattern);
        }

        if let Some(region) = &request.region {
            cmd.arg("--s3-region").arg(region);
        }

        cmd.env("RCLONE_S3_ACCESS_KEY_ID", &request.credentials.access_key_id);
        cmd.env("RCLONE_S3_SECRET_ACCESS_KEY", &request.credentials.secret_access_key);
        cmd.env("RCLONE_S3_SESSION_TOKEN", &request.credentials.session_token);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    fn io_error(&self, source: std::io::Error) -> SyncError {
        SyncError::Transfer {
            program: self.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl TransferTool for RcloneTransfer {
    async fn run(&self, request: &TransferRequest) -> Result<TransferStatus> {
        info!(
            "{} {} {} -> {} (exclude: {})",
            self.program,
            request.mode.as_subcommand(),
            request.source.display(),
            request.destination,
            request.exclude.as_deref().unwrap_or("none")
        );

        let mut child = self.command(request).spawn().map_err(|e| self.io_error(e))?;

        let mut stdout = child.stdout.take().map(|s| BufReader::new(s).split(b'\n'));
        let mut stderr = child.stderr.take().map(|s| BufReader::new(s).split(b'\n'));
        let mut monitor = TransferMonitor::new();

        // rclone logs to stderr and prints little on stdout; drain both
        while stdout.is_some() || stderr.is_some() {
            let (from_stdout, line) = tokio::select! {
                line = next_line(&mut stdout), if stdout.is_some() => (true, line),
                line = next_line(&mut stderr), if stderr.is_some() => (false, line),
            };
            match line {
                Some(line) => monitor.process_line(&line),
                None if from_stdout => stdout = None,
                None => stderr = None,
            }
        }

        let status = child.wait().await.map_err(|e| self.io_error(e))?;
        let exit_code = status.code().unwrap_or(-1);
        let summary = monitor.into_summary();

        debug!("{} exited with {} ({:?})", self.program, exit_code, summary);

        Ok(TransferStatus { exit_code, summary })
    }
}

// rclone prints file names verbatim and they need not be UTF-8. Decode
// lossily and keep draining.
async fn next_line<R>(lines: &mut Option<tokio::io::Split<R>>) -> Option<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let lines = lines.as_mut()?;
    match lines.next_segment().await {
        Ok(Some(bytes)) => Some(String::from_utf8_lossy(&bytes).trim_end_matches('\r').to_string()),
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read transfer output: {}", e);
            None
        }
    }
}
