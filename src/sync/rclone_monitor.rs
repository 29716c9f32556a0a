use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static FILES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Transferred:\s+(\d+)\s*/\s*(\d+),\s*(\d+)%").unwrap());
static ERRORS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"Errors:\s+(\d+)").unwrap());
static COPIED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"INFO\s*:\s*(.+?): Copied \(").unwrap());
static DELETED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"INFO\s*:\s*(.+?): Deleted").unwrap());

/// What one rclone run reported about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub files_transferred: u64,
    pub files_total: u64,
    pub copied: u64,
    pub deleted: u64,
    pub errors: u64,
    pub last_error: Option<String>,
}

/// Follows rclone's `-v` output, logging it and keeping a summary.
#[derive(Debug, Default)]
pub struct TransferMonitor {
    summary: TransferSummary,
}

impl TransferMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if line.contains("ERROR") {
            warn!("rclone: {}", line);
            self.summary.last_error = Some(line.to_string());
        } else {
            debug!("rclone: {}", line);
        }

        // Stats blocks repeat; the last one printed wins.
        if let Some(caps) = FILES_REGEX.captures(line) {
            self.summary.files_transferred = caps[1].parse().unwrap_or(0);
            self.summary.files_total = caps[2].parse().unwrap_or(0);
        } else if let Some(caps) = ERRORS_REGEX.captures(line) {
            self.summary.errors = caps[1].parse().unwrap_or(0);
        } else if let Some(caps) = COPIED_REGEX.captures(line) {
            self.summary.copied += 1;
            debug!("Uploaded {}", &caps[1]);
        } else if let Some(caps) = DELETED_REGEX.captures(line) {
            self.summary.deleted += 1;
            debug!("Removed remote {}", &caps[1]);
        }
    }

    pub fn summary(&self) -> &TransferSummary {
        &self.summary
    }

    pub fn into_summary(self) -> TransferSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_block() {
        let mut monitor = TransferMonitor::new();
        for line in [
            "Transferred:   \t    1.234 MiB / 1.234 MiB, 100%, 0 B/s, ETA -",
            "Errors:                 1 (retrying may help)",
            "Checks:                 2 / 2, 100%",
            "Transferred:            3 / 4, 75%",
            "Elapsed time:         1.2s",
        ] {
            monitor.process_line(line);
        }
        let summary = monitor.summary();
        assert_eq!(summary.files_transferred, 3);
        assert_eq!(summary.files_total, 4);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_byte_line_is_not_file_count() {
        let mut monitor = TransferMonitor::new();
        monitor.process_line("Transferred:   \t    0 B / 0 B, -, 0 B/s, ETA -");
        assert_eq!(monitor.summary().files_total, 0);
    }

    #[test]
    fn test_copied_and_deleted() {
        let mut monitor = TransferMonitor::new();
        monitor.process_line("2024/05/01 10:00:00 INFO  : events_0_app1: Copied (new)");
        monitor.process_line("2024/05/01 10:00:00 INFO  : events_1_app1: Copied (replaced existing)");
        monitor.process_line("2024/05/01 10:00:01 INFO  : events_0_app1.tmp: Deleted");
        let summary = monitor.into_summary();
        assert_eq!(summary.copied, 2);
        assert_eq!(summary.deleted, 1);
    }

    #[test]
    fn test_error_line_kept() {
        let mut monitor = TransferMonitor::new();
        monitor.process_line("2024/05/01 10:00:00 ERROR : Attempt 1/3 failed with 1 errors");
        assert!(monitor.summary().last_error.as_deref().unwrap().contains("Attempt 1/3"));
    }
}
