use super::{DirectoryListing, V2_SEGMENT_PREFIX};
use std::cmp::Ordering;

/// Index field of a segment file name, e.g. `events_12_app1` -> `"12"`.
/// Kept as written so the exclusion pattern matches the file literally.
fn segment_index(name: &str) -> Option<&str> {
    let rest = name.strip_prefix(V2_SEGMENT_PREFIX)?;
    let token = rest.split('_').next()?;
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        Some(token)
    } else {
        None
    }
}

// Numeric order on digit strings of any length. Equal values with different
// zero padding fall back to a plain string comparison.
fn compare_index(a: &str, b: &str) -> Ordering {
    let (a_digits, b_digits) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
    a_digits
        .len()
        .cmp(&b_digits.len())
        .then_with(|| a_digits.cmp(b_digits))
        .then_with(|| a.cmp(b))
}

/// Highest numbered segment in a V2 job directory.
///
/// Segments are created in increasing order and only the newest one is
/// open, so this is the file still being appended to. Returns `None` when
/// no segment carries a numeric index.
pub fn active_segment(job_listing: &DirectoryListing) -> Option<&str> {
    job_listing
        .names()
        .filter_map(segment_index)
        .max_by(|a, b| compare_index(a, b))
}

/// Pattern matching every file belonging to segment `index`.
pub fn exclusion_for_segment(index: &str) -> String {
    format!("{}{}_*", V2_SEGMENT_PREFIX, index)
}
