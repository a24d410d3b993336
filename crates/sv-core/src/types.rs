//! Core type definitions for SafeView
//!
//! These types cross the boundary between the policy engine and whatever
//! rendering engine adapter is driving it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::heuristics::TrackerCategory;

// =============================================================================
// Decisions
// =============================================================================

/// Outcome of a navigation or resource check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The rendering engine may proceed
    Allow,
    /// The request must not load
    Block,
}

impl Decision {
    #[inline]
    pub fn is_block(self) -> bool {
        self == Self::Block
    }
}

impl<E> From<Result<(), E>> for Decision {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Allow,
            Err(_) => Self::Block,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Block => f.write_str("block"),
        }
    }
}

/// Why a request was blocked.
///
/// The `Display` text doubles as the notice a UI layer may show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum BlockReason {
    /// Scheme other than `https`
    InsecureScheme,
    /// URL could not be parsed or has no host
    MalformedUrl,
    /// Navigation target outside the allow set
    HostNotAllowed(String),
    /// Host (or one of its parent domains) is on the block list
    BlockedHost(String),
    /// Path looks like an ad or tracking resource
    TrackerPath(TrackerCategory),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsecureScheme => f.write_str("Insecure (non-HTTPS) navigation was blocked."),
            Self::MalformedUrl => f.write_str("Malformed URL was blocked."),
            Self::HostNotAllowed(host) => {
                write!(f, "Navigation to external host '{}' is blocked.", host)
            }
            Self::BlockedHost(host) => write!(f, "Host '{}' is on the block list.", host),
            Self::TrackerPath(category) => write!(f, "Path looks like {} content.", category),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A navigation attempt reported by the rendering engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    /// Destination URL as reported by the engine
    pub url: String,
    /// Does this replace the top-level document?
    pub is_main_frame: bool,
}

impl NavigationRequest {
    pub fn main_frame(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_main_frame: true,
        }
    }

    pub fn sub_frame(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_main_frame: false,
        }
    }
}

// =============================================================================
// TLS
// =============================================================================

/// Certificate validation failure reported by the rendering engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateError {
    /// URL of the connection that failed validation, if known
    pub url: Option<String>,
    /// Engine-specific description of the failure
    pub description: String,
}

/// What the rendering engine should do with a connection after a certificate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateAction {
    Terminate,
    Proceed,
}

// =============================================================================
// File Selection
// =============================================================================

/// Opaque identifier correlating a file-selection result with its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Items chosen by the user in an external file picker.
///
/// An empty selection is also the cancelled result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub items: Vec<String>,
}

impl FileSelection {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
