use crate::error::{Result, SyncError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sentinel file whose presence halts the loop at the next tick.
#[derive(Debug, Clone)]
pub struct StopMarker {
    path: PathBuf,
}

impl StopMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_raised(&self) -> bool {
        match tokio::fs::try_exists(&self.path).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Cannot check stop marker {}: {}", self.path.display(), e);
                false
            }
        }
    }

    pub async fn raise(&self) -> Result<()> {
        let marker_err = |source: std::io::Error| SyncError::StopMarker {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(marker_err)?;
        }
        tokio::fs::write(&self.path, chrono::Utc::now().to_rfc3339())
            .await
            .map_err(marker_err)?;

        info!("Stop marker raised at {}", self.path.display());
        Ok(())
    }
}
