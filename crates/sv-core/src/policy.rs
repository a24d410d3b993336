//! Security Policy Engine
//!
//! This is the hot path: the rendering engine asks before every navigation and
//! every sub-resource fetch, and waits for the answer. Decisions are pure
//! functions of the request and the resolved configuration. No I/O, no locks.
//!
//! Rule order for navigations:
//! 1. anything but `https` is blocked, main frame included
//! 2. with the allow list disabled, everything else is allowed
//! 3. otherwise the host must match an allowed host or one of its subdomains
//!
//! Rule order for sub-resources:
//! 1. anything but `https` is blocked
//! 2. with ad blocking disabled, everything else is allowed
//! 3. hosts on the block list are blocked
//! 4. paths that look like ads or trackers are blocked
//!
//! Both fail closed: a URL that cannot be parsed or has no host is blocked.

use std::sync::Arc;

use log::debug;

use crate::blocklist::{BlockSet, BlocklistCache, BlocklistSource};
use crate::config::PolicyConfig;
use crate::heuristics::classify;
use crate::settings::SettingsSource;
use crate::types::{BlockReason, CertificateAction, CertificateError, Decision, NavigationRequest};
use crate::url::RequestUrl;

/// Answer to every certificate validation failure. Not configurable.
pub const CERTIFICATE_ERROR_ACTION: CertificateAction = CertificateAction::Terminate;

// =============================================================================
// Decisions
// =============================================================================

fn parse_secure(url: &str) -> Result<RequestUrl, BlockReason> {
    let parsed = RequestUrl::parse(url).map_err(|_| BlockReason::MalformedUrl)?;
    if !parsed.is_https() {
        return Err(BlockReason::InsecureScheme);
    }
    Ok(parsed)
}

/// Check a navigation, reporting why it was blocked.
pub fn explain_navigation(req: &NavigationRequest, cfg: &PolicyConfig) -> Result<(), BlockReason> {
    let url = parse_secure(&req.url)?;

    if !cfg.enforce_allowlist {
        return Ok(());
    }

    let host = url.require_host().map_err(|_| BlockReason::MalformedUrl)?;
    if cfg.allowed_hosts.contains_match(host) {
        Ok(())
    } else {
        Err(BlockReason::HostNotAllowed(host.to_string()))
    }
}

/// May this navigation proceed?
///
/// Applies identically to main-frame and sub-frame navigations.
#[inline]
pub fn decide_navigation(req: &NavigationRequest, cfg: &PolicyConfig) -> Decision {
    explain_navigation(req, cfg).into()
}

/// Check a sub-resource fetch, reporting why it was blocked.
pub fn explain_resource(url: &str, ad_block_enabled: bool, block_set: &BlockSet) -> Result<(), BlockReason> {
    let url = parse_secure(url)?;

    if !ad_block_enabled {
        return Ok(());
    }

    let host = url.require_host().map_err(|_| BlockReason::MalformedUrl)?;
    if block_set.is_blocked(host) {
        return Err(BlockReason::BlockedHost(host.to_string()));
    }

    match classify(url.path()) {
        Some(category) => Err(BlockReason::TrackerPath(category)),
        None => Ok(()),
    }
}

/// May this sub-resource fetch proceed?
///
/// Independent of the navigation allow list: loading a resource is not a
/// navigation.
#[inline]
pub fn decide_resource(url: &str, ad_block_enabled: bool, block_set: &BlockSet) -> Decision {
    explain_resource(url, ad_block_enabled, block_set).into()
}

/// What to do after a certificate validation failure: always terminate.
#[inline]
pub fn on_certificate_error(_error: &CertificateError) -> CertificateAction {
    CERTIFICATE_ERROR_ACTION
}

// =============================================================================
// Engine Hooks
// =============================================================================

/// Callbacks a rendering engine adapter forwards to the policy.
pub trait RenderingEngineHooks {
    /// Should this navigation proceed?
    fn decide_navigation(&self, req: &NavigationRequest) -> Decision;

    /// Should this resource load proceed?
    fn decide_resource(&self, url: &str) -> Decision;

    /// A certificate error occurred on an in-flight connection.
    fn on_certificate_error(&self, error: &CertificateError) -> CertificateAction;
}

/// Response an adapter substitutes for a blocked resource load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticResponse {
    pub status: u16,
    pub reason: &'static str,
    pub mime_type: &'static str,
    pub encoding: &'static str,
    pub body: Vec<u8>,
}

impl SyntheticResponse {
    /// Empty `204 No Content` body.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            reason: "No Content",
            mime_type: "text/plain",
            encoding: "utf-8",
            body: Vec::new(),
        }
    }
}

// =============================================================================
// Security Policy
// =============================================================================

/// Policy for one browsing session.
///
/// Owns the resolved configuration and a shared handle to the block list.
/// Both are read-only once constructed.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    config: PolicyConfig,
    block_set: Arc<BlockSet>,
}

impl SecurityPolicy {
    pub fn new(config: PolicyConfig, block_set: Arc<BlockSet>) -> Self {
        Self { config, block_set }
    }

    /// Resolve settings and the block list for a surface that is attaching.
    ///
    /// The block list is taken from `cache`, so sessions share one copy.
    pub fn attach<S: BlocklistSource + ?Sized>(
        settings: &dyn SettingsSource,
        blocklist: &S,
        cache: &BlocklistCache,
    ) -> Self {
        let config = PolicyConfig::resolve(settings);
        let block_set = cache.get_or_load(blocklist);
        Self::new(config, block_set)
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn block_set(&self) -> &BlockSet {
        &self.block_set
    }

    pub fn explain_navigation(&self, req: &NavigationRequest) -> Result<(), BlockReason> {
        explain_navigation(req, &self.config)
    }

    pub fn explain_resource(&self, url: &str) -> Result<(), BlockReason> {
        explain_resource(url, self.config.ad_block_enabled, &self.block_set)
    }

    /// Resource check in the shape most engines expect: `None` lets the load
    /// proceed, `Some` is the response to serve instead.
    pub fn intercept_resource(&self, url: &str) -> Option<SyntheticResponse> {
        self.decide_resource(url)
            .is_block()
            .then(SyntheticResponse::no_content)
    }
}

impl RenderingEngineHooks for SecurityPolicy {
    fn decide_navigation(&self, req: &NavigationRequest) -> Decision {
        let result = self.explain_navigation(req);
        if let Err(reason) = &result {
            debug!("Blocked navigation to {}: {}", req.url, reason);
        }
        result.into()
    }

    fn decide_resource(&self, url: &str) -> Decision {
        let result = self.explain_resource(url);
        if let Err(reason) = &result {
            debug!("Blocked resource {}: {}", url, reason);
        }
        result.into()
    }

    fn on_certificate_error(&self, error: &CertificateError) -> CertificateAction {
        debug!(
            "Terminating connection after certificate error ({}): {}",
            error.url.as_deref().unwrap_or("unknown url"),
            error.description
        );
        on_certificate_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::parse_blocklist;
    use crate::heuristics::TrackerCategory;
    use crate::host::AllowSet;
    use crate::settings::MapSettings;

    fn config(enforce: bool, hosts: &[&str]) -> PolicyConfig {
        PolicyConfig {
            enforce_allowlist: enforce,
            allowed_hosts: hosts.iter().collect::<AllowSet>(),
            ..PolicyConfig::default()
        }
    }

    #[test]
    fn test_insecure_schemes_always_blocked() {
        let open = config(false, &[]);
        let block_set = BlockSet::new();
        for url in ["http://example.com/", "ftp://example.com/", "data:text/html,hi", "javascript:alert(1)", "file:///etc/passwd"] {
            assert_eq!(decide_navigation(&NavigationRequest::main_frame(url), &open), Decision::Block, "{url}");
            assert_eq!(decide_navigation(&NavigationRequest::sub_frame(url), &open), Decision::Block, "{url}");
            assert_eq!(decide_resource(url, false, &block_set), Decision::Block, "{url}");
            assert_eq!(decide_resource(url, true, &block_set), Decision::Block, "{url}");
        }
    }

    #[test]
    fn test_allowlist_disabled_allows_any_https() {
        let open = config(false, &["example.com"]);
        assert_eq!(decide_navigation(&NavigationRequest::main_frame("https://evil.test/"), &open), Decision::Allow);
        assert_eq!(decide_navigation(&NavigationRequest::sub_frame("https://anything.example/x"), &open), Decision::Allow);
    }

    #[test]
    fn test_allowlist_enforced() {
        let cfg = config(true, &["example.com"]);
        let decide = |url: &str| decide_navigation(&NavigationRequest::main_frame(url), &cfg);

        assert_eq!(decide("https://example.com/"), Decision::Allow);
        assert_eq!(decide("https://app.example.com/"), Decision::Allow);
        assert_eq!(decide("https://example.com.evil.test/"), Decision::Block);
        assert_eq!(decide("https://evil.test/"), Decision::Block);
    }

    #[test]
    fn test_allowlist_applies_to_sub_frames() {
        let cfg = config(true, &["example.com"]);
        assert_eq!(decide_navigation(&NavigationRequest::sub_frame("https://evil.test/frame"), &cfg), Decision::Block);
        assert_eq!(decide_navigation(&NavigationRequest::sub_frame("https://www.example.com/frame"), &cfg), Decision::Allow);
    }

    #[test]
    fn test_navigation_reasons() {
        let cfg = config(true, &["example.com"]);
        assert_eq!(
            explain_navigation(&NavigationRequest::main_frame("https://evil.test/"), &cfg),
            Err(BlockReason::HostNotAllowed("evil.test".to_string()))
        );
        assert_eq!(
            explain_navigation(&NavigationRequest::main_frame("http://example.com/"), &cfg),
            Err(BlockReason::InsecureScheme)
        );
        assert_eq!(
            explain_navigation(&NavigationRequest::main_frame("https://"), &cfg),
            Err(BlockReason::MalformedUrl)
        );
    }

    #[test]
    fn test_resource_rules() {
        let block_set = parse_blocklist("ads.example.net\ntracker.test");

        assert_eq!(decide_resource("https://cdn.example.com/app.js", true, &block_set), Decision::Allow);
        assert_eq!(decide_resource("https://x.ads.example.net/a.js", true, &block_set), Decision::Block);
        assert_eq!(decide_resource("https://tracker.test/", true, &block_set), Decision::Block);
        assert_eq!(decide_resource("https://cdn.example.com/ads/banner.js", true, &block_set), Decision::Block);
        assert_eq!(decide_resource("https://example.net/logo.png", true, &block_set), Decision::Allow);
    }

    #[test]
    fn test_resource_ad_blocking_disabled() {
        let block_set = parse_blocklist("ads.example.net");
        assert_eq!(decide_resource("https://x.ads.example.net/ads/banner.js", false, &block_set), Decision::Allow);
        assert_eq!(decide_resource("http://cdn.example.com/app.js", false, &block_set), Decision::Block);
    }

    #[test]
    fn test_resource_ignores_navigation_allowlist() {
        let policy = SecurityPolicy::new(config(true, &["example.com"]), Arc::new(BlockSet::new()));
        assert_eq!(policy.decide_resource("https://fonts.other.test/font.woff2"), Decision::Allow);
    }

    #[test]
    fn test_resource_fails_closed() {
        let block_set = BlockSet::new();
        assert_eq!(decide_resource("not a url", true, &block_set), Decision::Block);
        assert_eq!(decide_resource("", false, &block_set), Decision::Block);
        assert_eq!(explain_resource("https://", true, &block_set), Err(BlockReason::MalformedUrl));
    }

    #[test]
    fn test_resource_reasons() {
        let block_set = parse_blocklist("ads.example.net");
        assert_eq!(
            explain_resource("https://x.ads.example.net/", true, &block_set),
            Err(BlockReason::BlockedHost("x.ads.example.net".to_string()))
        );
        assert_eq!(
            explain_resource("https://cdn.example.com/collect/pixel.gif", true, &block_set),
            Err(BlockReason::TrackerPath(TrackerCategory::Measurement))
        );
    }

    #[test]
    fn test_certificate_errors_always_terminate() {
        let open = SecurityPolicy::new(config(false, &[]), Arc::new(BlockSet::new()));
        let error = CertificateError {
            url: Some("https://example.com/".to_string()),
            description: "untrusted root".to_string(),
        };
        assert_eq!(open.on_certificate_error(&error), CertificateAction::Terminate);
        assert_eq!(on_certificate_error(&CertificateError::default()), CertificateAction::Terminate);
    }

    #[test]
    fn test_intercept_resource() {
        let policy = SecurityPolicy::new(PolicyConfig::default(), Arc::new(parse_blocklist("ads.example.net")));
        assert_eq!(policy.intercept_resource("https://ads.example.net/x"), Some(SyntheticResponse::no_content()));
        assert_eq!(policy.intercept_resource("https://example.com/index.css"), None);
    }

    #[test]
    fn test_attach_shares_cached_block_list() {
        let cache = BlocklistCache::new();
        let settings = MapSettings::new().with("TargetUrl", "https://portal.example.com");

        let first = SecurityPolicy::attach(&settings, "ads.example.net", &cache);
        let second = SecurityPolicy::attach(&settings, "", &cache);

        assert!(Arc::ptr_eq(&first.block_set, &second.block_set));
        assert_eq!(second.decide_resource("https://ads.example.net/x.js"), Decision::Block);
        assert_eq!(
            second.decide_navigation(&NavigationRequest::main_frame("https://app.portal.example.com/")),
            Decision::Allow
        );
        assert_eq!(
            second.decide_navigation(&NavigationRequest::main_frame("https://example.com/")),
            Decision::Block
        );
    }
}
