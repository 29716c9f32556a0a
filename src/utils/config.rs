use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between sync ticks
    pub interval_secs: u64,

    /// Sentinel file that stops the loop at the next tick
    pub stop_marker: PathBuf,

    /// Base URL of the instance metadata service
    pub imds_endpoint: String,

    /// Timeout for each metadata request
    pub imds_timeout_secs: u64,

    /// Transfer tool executable
    pub rclone_binary: String,

    /// Region override handed to the transfer tool
    pub s3_region: Option<String>,

    /// Ticks kept for the status endpoint
    pub history_size: usize,

    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            stop_marker: PathBuf::from("/tmp/eventlog-sync.stop"),
            imds_endpoint: "http://169.254.169.254".to_string(),
            imds_timeout_secs: 5,
            rclone_binary: "rclone".to_string(),
            s3_region: None,
            history_size: 50,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Defaults, then `eventlog-sync.toml` if present, then
    /// `EVENTLOG_SYNC_*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("eventlog-sync").required(false))
            .add_source(
                config::Environment::with_prefix("EVENTLOG_SYNC")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        // Name used by the deployment manifest
        if let Ok(region) = std::env::var("S3_REGION") {
            if !region.is_empty() {
                config.s3_region = Some(region);
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(config::ConfigError::Message("interval_secs must be positive".into()).into());
        }
        if self.imds_endpoint.is_empty() {
            return Err(config::ConfigError::Message("imds_endpoint must not be empty".into()).into());
        }
        if self.history_size == 0 {
            return Err(config::ConfigError::Message("history_size must be positive".into()).into());
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn imds_timeout(&self) -> Duration {
        Duration::from_secs(self.imds_timeout_secs)
    }
}

pub fn load_config() -> Result<Config> {
    Config::load()
}
