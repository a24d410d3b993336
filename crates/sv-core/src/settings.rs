//! Settings sources
//!
//! Settings are a flat key/value document packaged with the application
//! (`appsettings.json`). Lookups never fail: a missing document, a missing key
//! or a value of the wrong shape all resolve to the caller's fallback.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error type for loading a settings document.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Settings root must be a JSON object")]
    NotAnObject,
}

/// Read-only key/value settings.
pub trait SettingsSource {
    /// Value for `key`, or `fallback` when absent.
    fn get(&self, key: &str, fallback: &str) -> String;

    /// List value for `key`. Absent keys and non-list values give an empty list.
    fn get_list(&self, key: &str) -> Vec<String>;
}

// =============================================================================
// JSON Settings
// =============================================================================

/// Settings backed by a JSON object.
#[derive(Debug, Clone, Default)]
pub struct JsonSettings {
    values: Map<String, Value>,
}

impl JsonSettings {
    /// Empty settings: every lookup returns its fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(SettingsError::NotAnObject),
        }
    }

    /// Load a settings file, reporting failures.
    pub fn try_from_path(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Load a settings file. Any failure yields empty settings.
    pub fn from_path(path: &Path) -> Self {
        Self::try_from_path(path).unwrap_or_else(|e| {
            warn!("Using default settings: {}", e);
            Self::empty()
        })
    }

    /// Parse JSON text. Any failure yields empty settings.
    pub fn from_json_lossy(text: &str) -> Self {
        Self::from_json_str(text).unwrap_or_else(|e| {
            warn!("Using default settings: {}", e);
            Self::empty()
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SettingsSource for JsonSettings {
    fn get(&self, key: &str, fallback: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => fallback.to_string(),
        }
    }

    fn get_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// In-memory Settings
// =============================================================================

/// Settings held in memory. List values are stored under their own map.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, String>,
    lists: HashMap<String, Vec<String>>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_list(mut self, key: &str, values: &[&str]) -> Self {
        self.lists
            .insert(key.to_string(), values.iter().map(|v| v.to_string()).collect());
        self
    }
}

impl SettingsSource for MapSettings {
    fn get(&self, key: &str, fallback: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    fn get_list(&self, key: &str) -> Vec<String> {
        self.lists
            .get(key)
            .map(|items| {
                items
                    .iter()
                    .filter(|s| !s.trim().is_empty())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
