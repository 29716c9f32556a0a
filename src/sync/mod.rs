//! Sync loop and the collaborators it drives: credential supplier,
//! transfer tool and stop marker.

pub mod credentials;
pub mod history;
pub mod rclone;
pub mod rclone_monitor;
pub mod stop;
pub mod sync_loop;

pub use credentials::{CredentialSupplier, Credentials, ImdsCredentialSupplier};
pub use history::{TickHistory, TickRecord};
pub use rclone::{RcloneTransfer, TransferRequest, TransferStatus, TransferTool};
pub use rclone_monitor::{TransferMonitor, TransferSummary};
pub use stop::StopMarker;
pub use sync_loop::{SyncLoop, TickReport};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Running,
    /// Stop requested; takes effect at the next tick boundary.
    Stopping,
    Stopped,
}

/// Snapshot shared with the control server.
#[derive(Debug, Clone, Serialize)]
pub struct LoopStatus {
    pub state: LoopState,
    pub ticks: u64,
    pub last_outcome: Option<String>,
    pub last_exit_code: Option<i32>,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub history: TickHistory,
}

impl LoopStatus {
    pub fn new(history_size: usize) -> Self {
        Self {
            state: LoopState::Running,
            ticks: 0,
            last_outcome: None,
            last_exit_code: None,
            last_tick_at: None,
            history: TickHistory::new(history_size),
        }
    }
}

pub type SharedStatus = Arc<RwLock<LoopStatus>>;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncExit {
    /// Terminal sync done, stop requested, or a run-once tick completed.
    Success,
    /// Misconfiguration, or a tick error in run-once mode.
    Fatal,
    /// Transfer tool failed in run-once mode.
    TransferFailed,
}

impl SyncExit {
    pub fn code(&self) -> u8 {
        match self {
            SyncExit::Success => 0,
            SyncExit::Fatal => 1,
            SyncExit::TransferFailed => 2,
        }
    }
}

impl From<SyncExit> for std::process::ExitCode {
    fn from(exit: SyncExit) -> Self {
        std::process::ExitCode::from(exit.code())
    }
}
