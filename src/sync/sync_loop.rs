use super::credentials::CredentialSupplier;
use super::rclone::{TransferRequest, TransferTool};
use super::stop::StopMarker;
use super::{LoopState, LoopStatus, SharedStatus, SyncExit};
use crate::error::Result;
use crate::eventlog::{DirectoryLister, PlanOutcome, SyncPlanner};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    StopRequested,
    /// Nothing safe to transfer yet.
    Skipped(PlanOutcome),
    TransferFailed { exit_code: i32 },
    Synced { terminal: bool },
}

impl TickReport {
    /// True when the loop should exit successfully.
    pub fn is_done(&self) -> bool {
        matches!(self, TickReport::StopRequested | TickReport::Synced { terminal: true })
    }

    fn label(&self) -> &'static str {
        match self {
            TickReport::StopRequested => "stop-requested",
            TickReport::Skipped(outcome) => outcome.label(),
            TickReport::TransferFailed { .. } => "transfer-failed",
            TickReport::Synced { terminal: true } => "synced-final",
            TickReport::Synced { terminal: false } => "synced",
        }
    }
}

/// Serial polling loop: listing, planning, credentials, transfer, sleep.
pub struct SyncLoop {
    planner: SyncPlanner,
    lister: Arc<dyn DirectoryLister>,
    credentials: Arc<dyn CredentialSupplier>,
    transfer: Arc<dyn TransferTool>,
    stop: StopMarker,
    region: Option<String>,
    interval: Duration,
    status: SharedStatus,
}

impl SyncLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        planner: SyncPlanner,
        lister: Arc<dyn DirectoryLister>,
        credentials: Arc<dyn CredentialSupplier>,
        transfer: Arc<dyn TransferTool>,
        stop: StopMarker,
        region: Option<String>,
        interval: Duration,
        history_size: usize,
    ) -> Self {
        Self {
            planner,
            lister,
            credentials,
            transfer,
            stop,
            region,
            interval,
            status: Arc::new(RwLock::new(LoopStatus::new(history_size))),
        }
    }

    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn state(&self) -> LoopState {
        self.status.read().state
    }

    /// One pass. The stop marker is only looked at here, never mid-transfer.
    pub async fn tick(&self) -> Result<TickReport> {
        if self.stop.is_raised().await {
            info!("Stop marker {} present, stopping", self.stop.path().display());
            return Ok(TickReport::StopRequested);
        }

        let plan = match self.planner.plan(self.lister.as_ref()).await? {
            PlanOutcome::Ready(plan) => plan,
            other => return Ok(TickReport::Skipped(other)),
        };

        // Credentials expire; fetch them for every transfer.
        let credentials = self.credentials.fetch().await?;
        let request = TransferRequest::from_plan(&plan, credentials, self.region.clone());
        let status = self.transfer.run(&request).await?;

        if !status.success() {
            warn!(
                "Transfer exited with code {} ({} errors), retrying next tick",
                status.exit_code, status.summary.errors
            );
            return Ok(TickReport::TransferFailed { exit_code: status.exit_code });
        }

        info!(
            "Transfer complete: {}/{} files, {} copied, {} deleted",
            status.summary.files_transferred,
            status.summary.files_total,
            status.summary.copied,
            status.summary.deleted
        );
        Ok(TickReport::Synced { terminal: plan.is_terminal })
    }

    fn record(&self, result: &Result<TickReport>) {
        let mut status = self.status.write();
        status.ticks += 1;
        status.last_tick_at = Some(chrono::Utc::now());

        let (outcome, detail) = match result {
            Ok(report) => {
                if let TickReport::TransferFailed { exit_code } = report {
                    status.last_exit_code = Some(*exit_code);
                } else if let TickReport::Synced { .. } = report {
                    status.last_exit_code = Some(0);
                }
                let detail = match report {
                    TickReport::Skipped(PlanOutcome::NoJobDirectory { candidates }) => {
                        Some(format!("{} candidate directories", candidates))
                    }
                    TickReport::TransferFailed { exit_code } => Some(format!("exit code {}", exit_code)),
                    _ => None,
                };
                (report.label(), detail)
            }
            Err(e) => ("error", Some(e.to_string())),
        };

        status.last_outcome = Some(outcome.to_string());
        status.history.add(outcome, detail);
    }

    fn set_state(&self, state: LoopState) {
        self.status.write().state = state;
    }

    /// Tick at a fixed interval until the terminal sync succeeds or a stop
    /// is requested. Tick errors are logged and retried.
    pub async fn run_forever(&self) -> SyncExit {
        info!(
            "Syncing {} -> {} every {}",
            self.planner.source_dir().display(),
            self.planner.target_dir(),
            humantime::format_duration(self.interval)
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let result = self.tick().await;
            self.record(&result);

            match result {
                Ok(report) if report.is_done() => {
                    info!("Sync finished ({})", report.label());
                    self.set_state(LoopState::Stopped);
                    return SyncExit::Success;
                }
                Ok(_) => {}
                Err(e) => warn!("Sync tick failed, retrying next tick: {}", e),
            }
        }
    }

    /// Exactly one tick, whatever it finds.
    pub async fn run_once(&self) -> SyncExit {
        info!(
            "Syncing {} -> {} once",
            self.planner.source_dir().display(),
            self.planner.target_dir()
        );

        let result = self.tick().await;
        self.record(&result);
        self.set_state(LoopState::Stopped);

        match result {
            Ok(TickReport::TransferFailed { exit_code }) => {
                error!("Transfer failed with exit code {}", exit_code);
                SyncExit::TransferFailed
            }
            Ok(report) => {
                info!("Single sync finished ({})", report.label());
                SyncExit::Success
            }
            Err(e) => {
                error!("Sync failed: {}", e);
                SyncExit::Fatal
            }
        }
    }
}
