//! Host matching utilities
//!
//! Hosts are compared ASCII case-insensitively. A candidate host belongs to a
//! reference host when it is the same host or one of its subdomains:
//!
//! ```
//! use sv_core::host::matches;
//!
//! assert!(matches("app.example.com", "example.com"));
//! assert!(!matches("example.com.evil.test", "example.com"));
//! ```

use std::collections::HashSet;

use serde::{Serialize, Serializer};

// =============================================================================
// Matching
// =============================================================================

/// Does `candidate` equal `reference` or end with `"." + reference`?
///
/// An empty reference never matches.
pub fn matches(candidate: &str, reference: &str) -> bool {
    if reference.is_empty() || candidate.len() < reference.len() {
        return false;
    }

    let split = candidate.len() - reference.len();
    if !candidate.is_char_boundary(split) {
        return false;
    }

    let (prefix, tail) = candidate.split_at(split);
    if !tail.eq_ignore_ascii_case(reference) {
        return false;
    }

    prefix.is_empty() || prefix.ends_with('.')
}

/// Normalize a configured host entry.
///
/// Trims whitespace and trailing dots and lowercases. Rejects empty entries and
/// anything that is not a plain hostname (schemes, paths, ports, wildcards).
pub fn normalize_host(host: &str) -> Option<String> {
    let trimmed = host.trim().trim_end_matches('.');
    if trimmed.is_empty() || trimmed.starts_with('.') {
        return None;
    }

    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
    {
        return None;
    }

    Some(trimmed.to_ascii_lowercase())
}

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

// =============================================================================
// Suffix Walking
// =============================================================================

/// Iterator for suffix-walking a host from most to least specific.
///
/// `x.ads.example.net` yields `x.ads.example.net`, `ads.example.net`,
/// `example.net`, `net`.
pub struct HostSuffixes<'a> {
    current: Option<&'a str>,
}

impl<'a> Iterator for HostSuffixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;
        self.current = get_parent_domain(result);
        Some(result)
    }
}

/// Walk host suffixes from most specific to least specific.
pub fn walk_host_suffixes(host: &str) -> HostSuffixes<'_> {
    HostSuffixes {
        current: (!host.is_empty()).then_some(host),
    }
}

// =============================================================================
// Allow Set
// =============================================================================

/// Hosts trusted for navigation, subdomains included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowSet {
    hosts: HashSet<String>,
}

impl AllowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host. Returns false for entries that do not normalize to a host.
    pub fn insert(&mut self, host: &str) -> bool {
        match normalize_host(host) {
            Some(host) => {
                self.hosts.insert(host);
                true
            }
            None => false,
        }
    }

    /// Is `candidate` one of the allowed hosts or a subdomain of one?
    pub fn contains_match(&self, candidate: &str) -> bool {
        !candidate.is_empty() && self.hosts.iter().any(|allowed| matches(candidate, allowed))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Allowed hosts in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.hosts.iter().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }
}

impl Serialize for AllowSet {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(self.sorted())
    }
}

impl<S: AsRef<str>> FromIterator<S> for AllowSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for host in iter {
            set.insert(host.as_ref());
        }
        set
    }
}
