use super::{DirectoryListing, LogFormatVersion, V1_PREFIX, V2_DIR_PREFIX};

/// Decide which log format the sync root holds.
///
/// Exactly one of the two prefixes must be present; anything else is
/// `Unknown` and the caller skips the cycle.
pub fn classify(listing: &DirectoryListing) -> LogFormatVersion {
    let has_v1 = listing.names().any(|n| n.starts_with(V1_PREFIX));
    let has_v2 = listing.names().any(|n| n.starts_with(V2_DIR_PREFIX));

    match (has_v1, has_v2) {
        (true, false) => LogFormatVersion::V1,
        (false, true) => LogFormatVersion::V2,
        _ => LogFormatVersion::Unknown,
    }
}
