//! Resolved policy configuration
//!
//! A [`PolicyConfig`] is resolved once from a [`SettingsSource`] when a browsing
//! surface attaches and is never updated afterwards.

use log::{info, warn};
use serde::Serialize;

use crate::host::AllowSet;
use crate::settings::SettingsSource;
use crate::url::RequestUrl;

// =============================================================================
// Setting Keys
// =============================================================================

pub mod keys {
    pub const TARGET_URL: &str = "TargetUrl";
    pub const TARGET_URLS: &str = "TargetUrls";
    pub const ADDITIONAL_ALLOWED_HOSTS: &str = "AdditionalAllowedHosts";
    pub const ENFORCE_ALLOWED_DOMAINS_ONLY: &str = "EnforceAllowedDomainsOnly";
    pub const ALLOW_THIRD_PARTY_COOKIES: &str = "AllowThirdPartyCookies";
    pub const ENABLE_AD_BLOCKING: &str = "EnableAdBlocking";
    pub const CLEAR_BROWSING_DATA_ON_ATTACH: &str = "ClearBrowsingDataOnAttach";
}

/// Target used when nothing is configured.
pub const DEFAULT_TARGET_URL: &str = "https://example.com";

/// Delimiters accepted between extra allowed hosts.
const HOST_LIST_DELIMITERS: &[char] = &[',', ';', ' ', '\n', '\r'];

/// Interpret a setting as a boolean: true iff it equals `"true"`, any case.
#[inline]
pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Split a delimiter-separated host list, dropping blank entries.
pub fn split_host_list(text: &str) -> Vec<&str> {
    text.split(HOST_LIST_DELIMITERS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn get_bool(settings: &dyn SettingsSource, key: &str, default: bool) -> bool {
    parse_bool(&settings.get(key, if default { "true" } else { "false" }))
}

// =============================================================================
// Policy Config
// =============================================================================

/// Immutable snapshot of the decision-relevant settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    /// Restrict navigation to `allowed_hosts`
    pub enforce_allowlist: bool,
    /// Let the engine accept third-party cookies (login flows often need them)
    pub allow_third_party_cookies: bool,
    /// Apply block list and path heuristics to sub-resources
    pub ad_block_enabled: bool,
    /// Clear cookies and storage when the surface attaches
    pub clear_browsing_data_on_attach: bool,
    /// Trusted origins, subdomains included
    pub allowed_hosts: AllowSet,
    /// Start pages, in configured order
    pub target_urls: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let target_urls = vec![DEFAULT_TARGET_URL.to_string()];
        Self {
            enforce_allowlist: true,
            allow_third_party_cookies: true,
            ad_block_enabled: true,
            clear_browsing_data_on_attach: false,
            allowed_hosts: allowed_hosts_for(&target_urls, &[]),
            target_urls,
        }
    }
}

impl PolicyConfig {
    /// Resolve the configuration from a settings source.
    pub fn resolve(settings: &dyn SettingsSource) -> Self {
        let mut target_urls = settings.get_list(keys::TARGET_URLS);
        if target_urls.is_empty() {
            target_urls.push(settings.get(keys::TARGET_URL, DEFAULT_TARGET_URL));
        }

        let extras = settings.get(keys::ADDITIONAL_ALLOWED_HOSTS, "");
        let allowed_hosts = allowed_hosts_for(&target_urls, &split_host_list(&extras));

        let config = Self {
            enforce_allowlist: get_bool(settings, keys::ENFORCE_ALLOWED_DOMAINS_ONLY, true),
            allow_third_party_cookies: get_bool(settings, keys::ALLOW_THIRD_PARTY_COOKIES, true),
            ad_block_enabled: get_bool(settings, keys::ENABLE_AD_BLOCKING, true),
            clear_browsing_data_on_attach: get_bool(
                settings,
                keys::CLEAR_BROWSING_DATA_ON_ATTACH,
                false,
            ),
            allowed_hosts,
            target_urls,
        };

        info!(
            "Resolved policy: enforce_allowlist={}, ad_block={}, {} allowed host(s)",
            config.enforce_allowlist,
            config.ad_block_enabled,
            config.allowed_hosts.len()
        );

        config
    }

    /// First configured start page.
    pub fn primary_target(&self) -> &str {
        self.target_urls
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TARGET_URL)
    }

    /// Engine settings an adapter applies when the surface attaches.
    pub fn hardening(&self) -> EngineHardening {
        EngineHardening {
            accept_third_party_cookies: self.allow_third_party_cookies,
            clear_browsing_data: self.clear_browsing_data_on_attach,
            ..EngineHardening::default()
        }
    }
}

fn allowed_hosts_for(target_urls: &[String], extras: &[&str]) -> AllowSet {
    let mut allowed = AllowSet::new();

    for target in target_urls {
        match RequestUrl::parse(target).ok().as_ref().and_then(RequestUrl::host) {
            Some(host) => {
                allowed.insert(host);
            }
            None => warn!("Ignoring target URL without a usable host: {}", target),
        }
    }

    for extra in extras {
        if !allowed.insert(extra) {
            warn!("Ignoring invalid allowed host entry: {}", extra);
        }
    }

    allowed
}

// =============================================================================
// Engine Hardening
// =============================================================================

/// Rendering engine settings for a locked-down surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineHardening {
    /// Most login pages need scripts
    pub javascript_enabled: bool,
    pub dom_storage_enabled: bool,
    pub database_enabled: bool,
    pub zoom_enabled: bool,
    pub geolocation_enabled: bool,
    pub save_form_data: bool,
    /// Never load HTTP sub-resources into an HTTPS page
    pub allow_mixed_content: bool,
    pub safe_browsing_enabled: bool,
    pub media_requires_user_gesture: bool,
    /// Needed for file upload inputs
    pub file_access_enabled: bool,
    pub content_access_enabled: bool,
    /// Persist cookies so sessions survive restarts
    pub accept_cookies: bool,
    pub accept_third_party_cookies: bool,
    pub clear_browsing_data: bool,
}

impl Default for EngineHardening {
    fn default() -> Self {
        Self {
            javascript_enabled: true,
            dom_storage_enabled: true,
            database_enabled: false,
            zoom_enabled: false,
            geolocation_enabled: false,
            save_form_data: false,
            allow_mixed_content: false,
            safe_browsing_enabled: true,
            media_requires_user_gesture: true,
            file_access_enabled: true,
            content_access_enabled: true,
            accept_cookies: true,
            accept_third_party_cookies: true,
            clear_browsing_data: false,
        }
    }
}
