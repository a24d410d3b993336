//! SafeView Core Library
//!
//! This crate provides the policy engine for the SafeView embedded browsing
//! surface: a locked-down gateway that only lets a rendering engine reach a
//! small set of trusted HTTPS origins.
//!
//! # Architecture
//!
//! Configuration and the block list are resolved once when a browsing surface
//! attaches. After that every navigation and sub-resource decision is a pure
//! function over immutable data: no I/O and no locks on the hot path.
//!
//! # Modules
//!
//! - `url`: URL view over the `url` crate (scheme, host, path)
//! - `host`: Host normalization, subdomain matching and allow sets
//! - `heuristics`: Ad/tracker path classification
//! - `blocklist`: Block list parsing, suffix matching and the shared cache
//! - `settings`: Key/value settings sources
//! - `config`: Resolved policy configuration
//! - `policy`: Navigation/resource decisions and the engine hook trait
//! - `bridge`: Pending file-selection request bridge
//! - `types`: Shared type definitions

pub mod blocklist;
pub mod bridge;
pub mod config;
pub mod heuristics;
pub mod host;
pub mod policy;
pub mod settings;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use blocklist::{BlockSet, BlocklistCache, BlocklistSource};
pub use bridge::PendingRequestBridge;
pub use config::PolicyConfig;
pub use host::{matches, AllowSet};
pub use heuristics::looks_like_ad_or_tracker;
pub use policy::{decide_navigation, decide_resource, RenderingEngineHooks, SecurityPolicy};
pub use settings::{JsonSettings, MapSettings, SettingsSource};
pub use types::{BlockReason, CertificateAction, Decision, FileSelection, NavigationRequest, RequestId};
