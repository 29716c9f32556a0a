use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential request failed: {0}")]
    Credentials(#[from] reqwest::Error),

    #[error("metadata service returned {status} for {url}")]
    CredentialStatus { url: String, status: u16 },

    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("failed to run transfer tool {program}: {source}")]
    Transfer {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stop marker {path}: {source}")]
    StopMarker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}
