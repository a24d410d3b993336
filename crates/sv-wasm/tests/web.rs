//! Browser tests for the JS-facing gateway. Run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

use sv_wasm::{reset_blocklist_cache, Gateway};

wasm_bindgen_test_configure!(run_in_browser);

const SETTINGS: &str = r#"{"TargetUrl": "https://portal.example.com", "EnableAdBlocking": "true"}"#;

#[wasm_bindgen_test]
fn gateway_decisions() {
    reset_blocklist_cache();
    let gateway = Gateway::new(SETTINGS, Some("ads.example.net".to_string()));

    assert!(!gateway.should_override_url_loading("https://portal.example.com/home", true));
    assert!(gateway.should_override_url_loading("https://evil.test/", false));
    assert!(gateway.should_intercept_request("https://x.ads.example.net/a.js"));
    assert!(!gateway.should_intercept_request("https://cdn.portal.example.com/app.js"));
    assert!(gateway.on_received_ssl_error(None, "expired".to_string()));
    assert_eq!(gateway.start_url(), "https://portal.example.com");
}

#[wasm_bindgen_test]
fn block_notice_text() {
    let gateway = Gateway::new(SETTINGS, None);

    assert_eq!(gateway.block_notice("https://portal.example.com/", true), None);
    assert_eq!(
        gateway.block_notice("https://evil.test/", true).as_deref(),
        Some("Navigation to external host 'evil.test' is blocked.")
    );
    assert_eq!(
        gateway.block_notice("http://portal.example.com/", false).as_deref(),
        Some("Insecure (non-HTTPS) navigation was blocked.")
    );
}

#[wasm_bindgen_test]
fn file_chooser_flow() {
    let gateway = Gateway::new("{}", None);
    let callback = js_sys::Function::new_with_args("uris", "globalThis.__svPicked = uris;");

    let id = gateway.show_file_chooser(callback);
    assert!(gateway.has_pending_file_request());
    assert!(!gateway.handle_file_chooser_result(id + 1.0, js_sys::Array::new()));

    let uris = js_sys::Array::of1(&JsValue::from_str("blob:doc-1"));
    assert!(gateway.handle_file_chooser_result(id, uris));
    assert!(!gateway.has_pending_file_request());

    let picked = js_sys::Reflect::get(&js_sys::global(), &"__svPicked".into()).expect("global set");
    let picked: js_sys::Array = picked.into();
    assert_eq!(picked.get(0).as_string().as_deref(), Some("blob:doc-1"));
}

#[wasm_bindgen_test]
fn file_chooser_unavailable_yields_null() {
    let gateway = Gateway::new("{}", None);
    let callback = js_sys::Function::new_with_args("uris", "globalThis.__svCancelled = (uris === null);");

    gateway.show_file_chooser(callback);
    gateway.file_chooser_unavailable();

    let cancelled = js_sys::Reflect::get(&js_sys::global(), &"__svCancelled".into()).expect("global set");
    assert_eq!(cancelled.as_bool(), Some(true));
}

#[wasm_bindgen_test]
fn dropping_gateway_cancels_pending_chooser() {
    let gateway = Gateway::new("{}", None);
    let callback = js_sys::Function::new_with_args("uris", "globalThis.__svDropped = (uris === null);");

    gateway.show_file_chooser(callback);
    drop(gateway);

    let dropped = js_sys::Reflect::get(&js_sys::global(), &"__svDropped".into()).expect("global set");
    assert_eq!(dropped.as_bool(), Some(true));
}
