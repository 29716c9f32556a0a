use super::{DirectoryListing, IN_PROGRESS_SUFFIX, V1_PREFIX, V2_STATUS_PREFIX};

// Writers rename the in-progress suffix away exactly once, so seeing a
// finished name is enough. No previous snapshot is needed. Directories
// never count.
fn has_final(listing: &DirectoryListing, prefix: &str) -> bool {
    listing
        .files()
        .any(|n| n.starts_with(prefix) && !n.ends_with(IN_PROGRESS_SUFFIX))
}

/// True once a `spark-*` file without the in-progress suffix exists in the
/// sync root.
pub fn is_v1_final(listing: &DirectoryListing) -> bool {
    has_final(listing, V1_PREFIX)
}

/// True once the job directory holds a finished `appstatus_*` marker.
pub fn is_v2_final(job_listing: &DirectoryListing) -> bool {
    has_final(job_listing, V2_STATUS_PREFIX)
}
