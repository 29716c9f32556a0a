//! Deciding, from directory snapshots, what event log output is safe to
//! upload.
//!
//! Everything in here works on directory snapshots and never touches the
//! network. Listings come in through [`DirectoryLister`].

pub mod classifier;
pub mod completion;
pub mod planner;
pub mod scanner;
pub mod segment;

pub use classifier::classify;
pub use completion::{is_v1_final, is_v2_final};
pub use planner::SyncPlanner;
pub use scanner::{DirectoryLister, LocalLister};
pub use segment::{active_segment, exclusion_for_segment};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Single-file log written straight into the sync root.
pub const V1_PREFIX: &str = "spark-";
/// Directory holding the rolling segments of one job.
pub const V2_DIR_PREFIX: &str = "eventlog_v2_";
pub const V2_STATUS_PREFIX: &str = "appstatus_";
pub const V2_SEGMENT_PREFIX: &str = "events_";
/// Removed by the writer, atomically, once a file is complete.
pub const IN_PROGRESS_SUFFIX: &str = ".inprogress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::File }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::Directory }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Unordered snapshot of one directory level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    entries: BTreeSet<Entry>,
}

impl DirectoryListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(Entry::file).collect()
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry);
    }

    pub fn with_directory(mut self, name: impl Into<String>) -> Self {
        self.insert(Entry::directory(name));
        self
    }

    pub fn with_file(mut self, name: impl Into<String>) -> Self {
        self.insert(Entry::file(name));
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::File)
            .map(|e| e.name.as_str())
    }

    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.is_dir())
            .map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Entry> for DirectoryListing {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatVersion {
    V1,
    V2,
    Unknown,
}

/// How the transfer tool treats the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Add and overwrite only.
    Copy,
    /// Also delete destination entries missing from the source.
    Mirror,
}

impl TransferMode {
    /// Subcommand name understood by rclone.
    pub fn as_subcommand(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Mirror => "sync",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub source: PathBuf,
    /// Remote path, e.g. `spark:bucket/logs`. Not necessarily a local path.
    pub destination: String,
    pub mode: TransferMode,
    pub exclude: Option<String>,
    pub is_terminal: bool,
}

/// Result of one planning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Both or neither format prefix present.
    Indeterminate,
    /// V1 log is still being written.
    NotFinalized,
    /// V2 layout without exactly one job directory.
    NoJobDirectory { candidates: usize },
    Ready(SyncPlan),
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&SyncPlan> {
        match self {
            PlanOutcome::Ready(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanOutcome::Indeterminate => "indeterminate",
            PlanOutcome::NotFinalized => "not-finalized",
            PlanOutcome::NoJobDirectory { .. } => "no-job-directory",
            PlanOutcome::Ready(_) => "ready",
        }
    }
}
