use super::{DirectoryListing, Entry};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Source of one-level directory snapshots.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    async fn list(&self, path: &Path) -> Result<DirectoryListing>;
}

/// Reads the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalLister;

impl LocalLister {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirectoryLister for LocalLister {
    async fn list(&self, path: &Path) -> Result<DirectoryListing> {
        let listing_err = |source: std::io::Error| SyncError::Listing {
            path: path.to_path_buf(),
            source,
        };

        let mut listing = DirectoryListing::new();
        let mut entries = fs::read_dir(path).await.map_err(listing_err)?;

        while let Some(entry) = entries.next_entry().await.map_err(listing_err)? {
            let name = entry.file_name().to_string_lossy().to_string();

            // Entries can vanish between read_dir and file_type while the
            // writer renames files; skip them, the next tick sees the result.
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    debug!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            if file_type.is_dir() {
                listing.insert(Entry::directory(name));
            } else {
                listing.insert(Entry::file(name));
            }
        }

        debug!("Listed {} entries in {}", listing.len(), path.display());
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventlog::EntryKind;

    #[tokio::test]
    async fn test_lists_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("spark-app1.inprogress"), b"{}").unwrap();
        std::fs::create_dir(dir.path().join("eventlog_v2_app2")).unwrap();

        let listing = LocalLister::new().list(dir.path()).await.unwrap();
        let entries: Vec<&Entry> = listing.entries().collect();

        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .any(|e| e.name == "eventlog_v2_app2" && e.kind == EntryKind::Directory));
        assert!(entries
            .iter()
            .any(|e| e.name == "spark-app1.inprogress" && e.kind == EntryKind::File));
    }

    #[tokio::test]
    async fn test_missing_directory_is_listing_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = LocalLister::new().list(&missing).await.unwrap_err();
        assert!(matches!(err, SyncError::Listing { .. }));
    }
}
