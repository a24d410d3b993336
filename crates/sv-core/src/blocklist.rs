//! Block list parsing, matching and caching
//!
//! A block list is a newline-delimited text resource with one host suffix per
//! line. Blank lines and `#` comments are ignored:
//!
//! ```text
//! # ad networks
//! doubleclick.net
//! ads.example.net
//! ```
//!
//! An entry blocks the host itself and every subdomain of it, so
//! `ads.example.net` blocks `x.ads.example.net` but not `example.net`.
//!
//! Blocking is defense in depth, not a required dependency: a list that cannot
//! be read degrades to an empty set and is never reported as an error to the
//! policy engine.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use log::{info, warn};
use thiserror::Error;

use crate::host::walk_host_suffixes;

/// Error type for block list sources.
#[derive(Debug, Error)]
pub enum BlocklistError {
    #[error("Failed to read block list '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Block list unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Sources
// =============================================================================

/// Where a block list comes from.
pub trait BlocklistSource {
    /// Read the whole list as text.
    fn read_to_string(&self) -> Result<String, BlocklistError>;

    /// Short label for log lines.
    fn describe(&self) -> String;
}

/// Block list stored in a file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BlocklistSource for FileSource {
    fn read_to_string(&self) -> Result<String, BlocklistError> {
        fs::read_to_string(&self.path).map_err(|source| BlocklistError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl BlocklistSource for str {
    fn read_to_string(&self) -> Result<String, BlocklistError> {
        Ok(self.to_string())
    }

    fn describe(&self) -> String {
        "<inline>".to_string()
    }
}

impl BlocklistSource for String {
    fn read_to_string(&self) -> Result<String, BlocklistError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        "<inline>".to_string()
    }
}

/// A source that is known to be missing (e.g. no list was packaged).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl BlocklistSource for NoSource {
    fn read_to_string(&self) -> Result<String, BlocklistError> {
        Err(BlocklistError::Unavailable("no block list configured".to_string()))
    }

    fn describe(&self) -> String {
        "<none>".to_string()
    }
}

// =============================================================================
// Block Set
// =============================================================================

/// Set of blocked host suffixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSet {
    entries: HashSet<String>,
}

impl BlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: &str) {
        let entry = entry.trim().trim_end_matches('.');
        if !entry.is_empty() {
            self.entries.insert(entry.to_ascii_lowercase());
        }
    }

    /// Is `host`, or any parent domain of it, on the list?
    ///
    /// An empty host is always blocked. The bare top-level label is never
    /// consulted, so a list entry like `com` has no effect.
    pub fn is_blocked(&self, host: &str) -> bool {
        let host = host.trim().trim_end_matches('.');
        if host.is_empty() {
            return true;
        }
        if self.entries.is_empty() {
            return false;
        }

        let host = host.to_ascii_lowercase();
        walk_host_suffixes(&host)
            .take_while(|suffix| suffix.contains('.'))
            .any(|suffix| self.entries.contains(suffix))
    }

    pub fn contains_entry(&self, entry: &str) -> bool {
        self.entries.contains(&entry.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for BlockSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry.as_ref());
        }
        set
    }
}

// =============================================================================
// Parsing and Loading
// =============================================================================

fn is_comment_line(line: &str) -> bool {
    line.starts_with('#')
}

/// Parse block list text into a set.
pub fn parse_blocklist(text: &str) -> BlockSet {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment_line(line))
        .collect()
}

/// Read and parse a block list, reporting read failures.
pub fn try_load<S: BlocklistSource + ?Sized>(source: &S) -> Result<BlockSet, BlocklistError> {
    let text = source.read_to_string()?;
    Ok(parse_blocklist(&text))
}

/// Read and parse a block list. Any failure yields an empty set.
pub fn load<S: BlocklistSource + ?Sized>(source: &S) -> BlockSet {
    match try_load(source) {
        Ok(set) => set,
        Err(e) => {
            warn!("Block list disabled: {}", e);
            BlockSet::new()
        }
    }
}

// =============================================================================
// Cache
// =============================================================================

/// Lazily-populated, shareable block list slot.
///
/// The first successful load is kept for the lifetime of the cache and handed
/// out to every later caller, whatever source they pass. Population happens
/// under the write lock so concurrent first callers load the list only once.
/// A failed load is not stored, so a later attach may try again.
#[derive(Debug, Default)]
pub struct BlocklistCache {
    slot: RwLock<Option<Arc<BlockSet>>>,
}

impl BlocklistCache {
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// The cached set, if one has been loaded.
    pub fn get(&self) -> Option<Arc<BlockSet>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }

    /// Return the cached set, loading it from `source` on first use.
    pub fn get_or_load<S: BlocklistSource + ?Sized>(&self, source: &S) -> Arc<BlockSet> {
        if let Some(set) = self.get() {
            return set;
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(set) = slot.as_ref() {
            return Arc::clone(set);
        }

        match try_load(source) {
            Ok(set) => {
                info!("Loaded {} block list entries from {}", set.len(), source.describe());
                let set = Arc::new(set);
                *slot = Some(Arc::clone(&set));
                set
            }
            Err(e) => {
                warn!("Block list disabled: {}", e);
                Arc::new(BlockSet::new())
            }
        }
    }

    pub fn is_populated(&self) -> bool {
        self.get().is_some()
    }

    /// Drop the cached set. Intended for test isolation.
    pub fn reset(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
