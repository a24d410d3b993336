//! WebAssembly bindings for SafeView
//!
//! Exposes the policy hooks and the file chooser bridge to a JavaScript-hosted
//! rendering surface. Block lists are shared between every `Gateway` created in
//! the same instance.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use sv_core::{
    blocklist::{BlocklistCache, NoSource},
    bridge::PendingRequestBridge,
    policy::{RenderingEngineHooks, SecurityPolicy},
    settings::JsonSettings,
    types::{BlockReason, CertificateAction, CertificateError, FileSelection, NavigationRequest, RequestId},
};
use wasm_bindgen::prelude::*;

static BLOCKLIST_CACHE: BlocklistCache = BlocklistCache::new();

thread_local! {
    /// JS callbacks for file chooser requests, keyed by adapter key.
    /// `js_sys::Function` is not `Send`, so it cannot live inside the bridge itself.
    static FILE_CALLBACKS: RefCell<HashMap<u32, js_sys::Function>> = RefCell::new(HashMap::new());
    static NEXT_CALLBACK_KEY: Cell<u32> = const { Cell::new(1) };
}

// =============================================================================
// Gateway Core
// =============================================================================

/// Adapter state without any JS types, so it can be exercised natively.
pub struct GatewayCore {
    policy: SecurityPolicy,
    files: PendingRequestBridge<FileSelection>,
}

impl GatewayCore {
    /// Build from packaged inputs. Bad settings JSON falls back to defaults
    /// and a missing block list disables host blocking.
    pub fn from_inputs(settings_json: &str, blocklist_text: Option<&str>, cache: &BlocklistCache) -> Self {
        let settings = JsonSettings::from_json_lossy(settings_json);
        let policy = match blocklist_text {
            Some(text) => SecurityPolicy::attach(&settings, text, cache),
            None => SecurityPolicy::attach(&settings, &NoSource, cache),
        };

        Self {
            policy,
            files: PendingRequestBridge::new(),
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn files(&self) -> &PendingRequestBridge<FileSelection> {
        &self.files
    }

    /// `Some(reason)` when the navigation must be cancelled.
    pub fn navigation_block(&self, url: &str, is_main_frame: bool) -> Option<BlockReason> {
        let req = NavigationRequest {
            url: url.to_string(),
            is_main_frame,
        };
        self.policy.explain_navigation(&req).err()
    }

    /// Page the surface opens after attaching.
    pub fn start_url(&self) -> &str {
        self.policy.config().primary_target()
    }
}

// =============================================================================
// JS Gateway
// =============================================================================

#[wasm_bindgen]
pub struct Gateway {
    core: GatewayCore,
}

#[wasm_bindgen]
impl Gateway {
    /// Attach a new surface. `blocklist_text` is the packaged block list, if any.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: &str, blocklist_text: Option<String>) -> Gateway {
        Gateway {
            core: GatewayCore::from_inputs(settings_json, blocklist_text.as_deref(), &BLOCKLIST_CACHE),
        }
    }

    /// True when the navigation must be cancelled.
    pub fn should_override_url_loading(&self, url: &str, is_main_frame: bool) -> bool {
        match self.core.navigation_block(url, is_main_frame) {
            Some(reason) => {
                web_sys::console::info_1(&JsValue::from_str(&format!("[safeview] {}", reason)));
                true
            }
            None => false,
        }
    }

    /// Notice text for a blocked navigation, for the host UI to display.
    pub fn block_notice(&self, url: &str, is_main_frame: bool) -> Option<String> {
        self.core
            .navigation_block(url, is_main_frame)
            .map(|reason| reason.to_string())
    }

    /// First configured target URL, to load once attached.
    pub fn start_url(&self) -> String {
        self.core.start_url().to_string()
    }

    /// True when the resource load must be answered with an empty response.
    pub fn should_intercept_request(&self, url: &str) -> bool {
        self.core.policy().decide_resource(url).is_block()
    }

    /// True when the connection must be cancelled. Always true.
    pub fn on_received_ssl_error(&self, url: Option<String>, description: String) -> bool {
        let error = CertificateError { url, description };
        self.core.policy().on_certificate_error(&error) == CertificateAction::Terminate
    }

    /// Register a file chooser request. `callback` receives an array of URIs,
    /// or `null` when the request was cancelled, superseded or the gateway
    /// was freed first.
    pub fn show_file_chooser(&self, callback: js_sys::Function) -> f64 {
        let key = NEXT_CALLBACK_KEY.with(|next| {
            let key = next.get();
            next.set(key.wrapping_add(1));
            key
        });
        FILE_CALLBACKS.with(|cbs| cbs.borrow_mut().insert(key, callback));

        let id = self.core.files().begin(move |selection| deliver_file_selection(key, selection));
        id.0 as f64
    }

    /// Forward a picker result. Returns false for stale or unknown ids.
    pub fn handle_file_chooser_result(&self, request_id: f64, uris: js_sys::Array) -> bool {
        let selection = FileSelection::new(uris.iter().filter_map(|value| value.as_string()));
        self.core.files().complete(RequestId(request_id as u64), selection)
    }

    /// No picker could be launched: cancel the pending request.
    pub fn file_chooser_unavailable(&self) {
        self.core.files().result_unavailable();
    }

    pub fn has_pending_file_request(&self) -> bool {
        self.core.files().is_pending()
    }

    /// Resolved configuration as a plain object.
    pub fn get_config_info(&self) -> JsValue {
        let config = self.core.policy().config();
        let result = js_sys::Object::new();

        let _ = js_sys::Reflect::set(&result, &"enforceAllowlist".into(), &JsValue::from(config.enforce_allowlist));
        let _ = js_sys::Reflect::set(&result, &"adBlockEnabled".into(), &JsValue::from(config.ad_block_enabled));
        let _ = js_sys::Reflect::set(&result, &"allowThirdPartyCookies".into(), &JsValue::from(config.allow_third_party_cookies));
        let _ = js_sys::Reflect::set(&result, &"clearBrowsingDataOnAttach".into(), &JsValue::from(config.clear_browsing_data_on_attach));
        let _ = js_sys::Reflect::set(&result, &"blockListEntries".into(), &JsValue::from(self.core.policy().block_set().len() as u32));

        let hosts = js_sys::Array::new();
        for host in config.allowed_hosts.sorted() {
            hosts.push(&JsValue::from_str(host));
        }
        let _ = js_sys::Reflect::set(&result, &"allowedHosts".into(), &hosts);

        let targets = js_sys::Array::new();
        for target in &config.target_urls {
            targets.push(&JsValue::from_str(target));
        }
        let _ = js_sys::Reflect::set(&result, &"targetUrls".into(), &targets);

        result.into()
    }
}

/// Drop the shared block list so the next `Gateway` reloads it.
#[wasm_bindgen]
pub fn reset_blocklist_cache() {
    BLOCKLIST_CACHE.reset();
}

fn deliver_file_selection(key: u32, selection: FileSelection) {
    let callback = FILE_CALLBACKS.with(|cbs| cbs.borrow_mut().remove(&key));
    let Some(callback) = callback else {
        return;
    };

    let value = if selection.is_empty() {
        JsValue::NULL
    } else {
        let uris = js_sys::Array::new();
        for item in &selection.items {
            uris.push(&JsValue::from_str(item));
        }
        uris.into()
    };

    if let Err(e) = callback.call1(&JsValue::NULL, &value) {
        web_sys::console::error_2(&JsValue::from_str("[safeview] file chooser callback failed"), &e);
    }
}
