//! Ad/tracker path heuristics
//!
//! A small fixed substring table, checked in order against the lowercased
//! request path. This is deliberately not a filter-list engine.

use std::fmt;

use serde::Serialize;

/// Kind of resource a path pattern points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerCategory {
    /// Ad-serving endpoints
    AdServing,
    /// Ad and analytics scripts
    Script,
    /// Measurement beacons and pixels
    Measurement,
}

impl fmt::Display for TrackerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdServing => f.write_str("ad-serving"),
            Self::Script => f.write_str("ad/analytics script"),
            Self::Measurement => f.write_str("measurement"),
        }
    }
}

/// Ordered pattern table.
const TRACKER_PATTERNS: &[(&str, TrackerCategory)] = &[
    ("/ads/", TrackerCategory::AdServing),
    ("/adserver/", TrackerCategory::AdServing),
    ("/advert", TrackerCategory::AdServing),
    ("/banner", TrackerCategory::AdServing),
    ("gpt.js", TrackerCategory::Script),
    ("adscript", TrackerCategory::Script),
    ("analytics.js", TrackerCategory::Script),
    ("/analytics", TrackerCategory::Measurement),
    ("/measure", TrackerCategory::Measurement),
    ("/track", TrackerCategory::Measurement),
    ("/pixel", TrackerCategory::Measurement),
];

/// Category of the first pattern found in `path`, if any.
pub fn classify(path: &str) -> Option<TrackerCategory> {
    if path.is_empty() {
        return None;
    }

    let lower = path.to_ascii_lowercase();
    TRACKER_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(*pattern))
        .map(|&(_, category)| category)
}

/// Does this URL path look like an ad or tracking resource?
#[inline]
pub fn looks_like_ad_or_tracker(path: &str) -> bool {
    classify(path).is_some()
}
