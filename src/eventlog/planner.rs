use super::{
    active_segment, classify, exclusion_for_segment, is_v1_final, is_v2_final, DirectoryLister,
    DirectoryListing, LogFormatVersion, PlanOutcome, SyncPlan, TransferMode, V2_DIR_PREFIX,
};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Turns directory snapshots into transfer plans.
#[derive(Debug, Clone)]
pub struct SyncPlanner {
    source_dir: PathBuf,
    target_dir: String,
}

impl SyncPlanner {
    pub fn new(source_dir: impl Into<PathBuf>, target_dir: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn target_dir(&self) -> &str {
        &self.target_dir
    }

    /// List the sync root (and the job directory for V2) and decide what to
    /// transfer this cycle.
    pub async fn plan<L: DirectoryLister + ?Sized>(&self, lister: &L) -> Result<PlanOutcome> {
        let root = lister.list(&self.source_dir).await?;

        match classify(&root) {
            LogFormatVersion::Unknown => {
                info!(
                    "Could not determine event log format in {} ({} entries), skipping",
                    self.source_dir.display(),
                    root.len()
                );
                Ok(PlanOutcome::Indeterminate)
            }
            LogFormatVersion::V1 => Ok(self.plan_v1(&root)),
            LogFormatVersion::V2 => {
                let job_dir = match single_job_dir(&root) {
                    Ok(name) => name,
                    Err(candidates) => {
                        info!(
                            "Could not find event log dir in {} ({} candidates)",
                            self.source_dir.display(),
                            candidates
                        );
                        return Ok(PlanOutcome::NoJobDirectory { candidates });
                    }
                };
                let job_listing = lister.list(&self.source_dir.join(job_dir)).await?;
                Ok(self.plan_v2(job_dir, &job_listing))
            }
        }
    }

    /// Single-file format. Only the finished file triggers a (terminal) copy.
    pub fn plan_v1(&self, root: &DirectoryListing) -> PlanOutcome {
        if !is_v1_final(root) {
            info!("Event log in {} not finalized, ignoring", self.source_dir.display());
            return PlanOutcome::NotFinalized;
        }

        // Copy, not mirror: the target root may hold other jobs' logs.
        PlanOutcome::Ready(SyncPlan {
            source: self.source_dir.clone(),
            destination: self.target_dir.clone(),
            mode: TransferMode::Copy,
            exclude: None,
            is_terminal: true,
        })
    }

    /// Rolling-segment format. Mirrors the job directory on every cycle,
    /// holding back the open segment until the status marker is final.
    pub fn plan_v2(&self, job_dir: &str, job_listing: &DirectoryListing) -> PlanOutcome {
        let is_final = is_v2_final(job_listing);

        let exclude = if is_final {
            None
        } else {
            match active_segment(job_listing) {
                Some(index) => {
                    debug!("Active segment in {} is {}", job_dir, index);
                    Some(exclusion_for_segment(index))
                }
                None => {
                    warn!("Could not determine active segment in {}, syncing without exclusion", job_dir);
                    None
                }
            }
        };

        PlanOutcome::Ready(SyncPlan {
            source: self.source_dir.join(job_dir),
            destination: join_remote(&self.target_dir, job_dir),
            mode: TransferMode::Mirror,
            exclude,
            is_terminal: is_final,
        })
    }
}

/// The one `eventlog_v2_*` directory, or the number of candidates found.
fn single_job_dir(root: &DirectoryListing) -> std::result::Result<&str, usize> {
    let candidates: Vec<&str> = root
        .directories()
        .filter(|name| name.starts_with(V2_DIR_PREFIX))
        .collect();

    match candidates.as_slice() {
        [only] => Ok(*only),
        other => Err(other.len()),
    }
}

fn join_remote(base: &str, child: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, child)
    } else {
        format!("{}/{}", base, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeLister {
        listings: HashMap<PathBuf, DirectoryListing>,
    }

    impl FakeLister {
        fn new() -> Self {
            Self { listings: HashMap::new() }
        }

        fn with(mut self, path: &str, listing: DirectoryListing) -> Self {
            self.listings.insert(PathBuf::from(path), listing);
            self
        }
    }

    #[async_trait]
    impl DirectoryLister for FakeLister {
        async fn list(&self, path: &Path) -> Result<DirectoryListing> {
            self.listings.get(path).cloned().ok_or_else(|| SyncError::Listing {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    fn planner() -> SyncPlanner {
        SyncPlanner::new("/var/log/spark", "spark:bucket/logs")
    }

    #[tokio::test]
    async fn test_v1_in_progress_has_no_plan() {
        let lister = FakeLister::new().with(
            "/var/log/spark",
            DirectoryListing::from_files(["spark-app1.inprogress"]),
        );
        let outcome = planner().plan(&lister).await.unwrap();
        assert_eq!(outcome, PlanOutcome::NotFinalized);
    }

    #[tokio::test]
    async fn test_v1_final_is_terminal_copy() {
        let lister = FakeLister::new().with(
            "/var/log/spark",
            DirectoryListing::from_files(["spark-app1"]),
        );
        let outcome = planner().plan(&lister).await.unwrap();
        assert_eq!(
            outcome,
            PlanOutcome::Ready(SyncPlan {
                source: PathBuf::from("/var/log/spark"),
                destination: "spark:bucket/logs".to_string(),
                mode: TransferMode::Copy,
                exclude: None,
                is_terminal: true,
            })
        );
    }

    #[tokio::test]
    async fn test_v2_running_excludes_active_segment() {
        let lister = FakeLister::new()
            .with(
                "/var/log/spark",
                DirectoryListing::new().with_directory("eventlog_v2_app1"),
            )
            .with(
                "/var/log/spark/eventlog_v2_app1",
                DirectoryListing::from_files(["events_0_app1", "events_1_app1"]),
            );

        let outcome = planner().plan(&lister).await.unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.source, PathBuf::from("/var/log/spark/eventlog_v2_app1"));
        assert_eq!(plan.destination, "spark:bucket/logs/eventlog_v2_app1");
        assert_eq!(plan.mode, TransferMode::Mirror);
        assert_eq!(plan.exclude.as_deref(), Some("events_1_*"));
        assert!(!plan.is_terminal);
    }

    #[tokio::test]
    async fn test_v2_final_is_terminal_mirror() {
        let lister = FakeLister::new()
            .with(
                "/var/log/spark",
                DirectoryListing::new().with_directory("eventlog_v2_app1"),
            )
            .with(
                "/var/log/spark/eventlog_v2_app1",
                DirectoryListing::from_files(["events_0_app1", "events_1_app1", "appstatus_app1"]),
            );

        let outcome = planner().plan(&lister).await.unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.mode, TransferMode::Mirror);
        assert_eq!(plan.exclude, None);
        assert!(plan.is_terminal);
    }

    #[test]
    fn test_v2_unresolvable_segment_syncs_everything() {
        let listing = DirectoryListing::from_files(["events_x_app1"]);
        let outcome = planner().plan_v2("eventlog_v2_app1", &listing);
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.exclude, None);
        assert!(!plan.is_terminal);
    }

    #[test]
    fn test_v2_padded_segment_excluded_as_written() {
        let listing = DirectoryListing::from_files(["events_00_app1", "events_01_app1"]);
        let outcome = planner().plan_v2("eventlog_v2_app1", &listing);
        assert_eq!(outcome.plan().unwrap().exclude.as_deref(), Some("events_01_*"));
    }

    #[test]
    fn test_v2_status_directory_is_not_final() {
        let listing = DirectoryListing::from_files(["events_0_app1"]).with_directory("appstatus_app1");
        let outcome = planner().plan_v2("eventlog_v2_app1", &listing);
        let plan = outcome.plan().unwrap();
        assert!(!plan.is_terminal);
        assert_eq!(plan.exclude.as_deref(), Some("events_0_*"));
    }

    #[test]
    fn test_v1_directory_named_like_log_is_not_final() {
        let root = DirectoryListing::from_files(["spark-app1.inprogress"]).with_directory("spark-tmp");
        assert_eq!(planner().plan_v1(&root), PlanOutcome::NotFinalized);
    }

    #[tokio::test]
    async fn test_v2_two_job_dirs_is_ambiguous() {
        let lister = FakeLister::new().with(
            "/var/log/spark",
            DirectoryListing::new()
                .with_directory("eventlog_v2_app1")
                .with_directory("eventlog_v2_app2"),
        );
        let outcome = planner().plan(&lister).await.unwrap();
        assert_eq!(outcome, PlanOutcome::NoJobDirectory { candidates: 2 });
    }

    #[tokio::test]
    async fn test_v2_prefix_on_file_only_has_no_job_dir() {
        let lister = FakeLister::new().with(
            "/var/log/spark",
            DirectoryListing::from_files(["eventlog_v2_app1"]),
        );
        let outcome = planner().plan(&lister).await.unwrap();
        assert_eq!(outcome, PlanOutcome::NoJobDirectory { candidates: 0 });
    }

    #[tokio::test]
    async fn test_unknown_format_is_indeterminate() {
        let lister = FakeLister::new().with("/var/log/spark", DirectoryListing::new());
        let outcome = planner().plan(&lister).await.unwrap();
        assert_eq!(outcome, PlanOutcome::Indeterminate);
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let lister = FakeLister::new();
        assert!(planner().plan(&lister).await.is_err());
    }

    #[tokio::test]
    async fn test_planning_is_idempotent() {
        let lister = FakeLister::new()
            .with(
                "/var/log/spark",
                DirectoryListing::new().with_directory("eventlog_v2_app1"),
            )
            .with(
                "/var/log/spark/eventlog_v2_app1",
                DirectoryListing::from_files(["events_9_app1", "events_10_app1"]),
            );

        let first = planner().plan(&lister).await.unwrap();
        let second = planner().plan(&lister).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.plan().unwrap().exclude.as_deref(), Some("events_10_*"));
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("spark:b", "d"), "spark:b/d");
        assert_eq!(join_remote("spark:b/", "d"), "spark:b/d");
    }
}
