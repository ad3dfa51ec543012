//! Decides whether a discovered version or size supersedes a baseline

use std::str::FromStr;

use pep508_rs::pep440_rs::Version;
use tracing::{debug, warn};

use crate::version::parser::normalize_for_parse;

/// Baseline value meaning "never seen before"
pub const UNSEEN_VERSION: &str = "0.0.0";

/// Check whether `current` is newer than `baseline`.
///
/// Rules, in order:
/// 1. empty `current` is never newer
/// 2. empty or `0.0.0` baseline: always newer (first sighting)
/// 3. a side that normalizes to nothing loses
/// 4. PEP 440 release ordering of the normalized forms, so `1.2` equals
///    `1.2.0`
/// 5. if structured parsing fails, any textual difference counts as newer.
///    This can report downgrades and cosmetic renames as updates.
pub fn is_newer(current: &str, baseline: &str) -> bool {
    if current.is_empty() {
        warn!("Current version is empty, treating as invalid");
        return false;
    }

    if baseline.is_empty() || baseline == UNSEEN_VERSION {
        debug!(current, "No previous version recorded, current version is new");
        return true;
    }

    let current_norm = normalize_for_parse(current);
    let baseline_norm = normalize_for_parse(baseline);

    if current_norm.is_empty() {
        warn!(current, "Current version is invalid after normalization");
        return false;
    }
    if baseline_norm.is_empty() {
        warn!(baseline, "Previous version is invalid after normalization");
        return true;
    }

    match (
        Version::from_str(&current_norm),
        Version::from_str(&baseline_norm),
    ) {
        (Ok(parsed_current), Ok(parsed_baseline)) => {
            let newer = parsed_current > parsed_baseline;
            debug!(
                current = %parsed_current,
                baseline = %parsed_baseline,
                newer,
                "Compared parsed versions"
            );
            newer
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!(
                current,
                baseline, "{}, falling back to string comparison", e
            );
            current != baseline
        }
    }
}

/// Size-based change detection for artifacts without an extractable version.
///
/// A zero size is treated as "unknown" and never reported. Any other size that
/// differs from the recorded one counts as an update, which means downgrades
/// cannot be told apart from upgrades.
pub fn is_size_changed(current: u64, baseline: Option<u64>) -> bool {
    current != 0 && baseline != Some(current)
}
