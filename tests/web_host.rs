//! Browser-side checks for `WebHost`. Run with
//! `wasm-pack test --headless --firefox -- --features web`.
#![cfg(all(feature = "web", target_arch = "wasm32"))]

use std::rc::Rc;
use std::sync::Arc;

use html_route_guard::{
    GuardConfig, GuardOutcome, GuardPhase, Host, PageGuard, RouteManifest, WebHost,
};
use wasm_bindgen_test::wasm_bindgen_test;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn reads_the_current_location() {
    let host = WebHost::new().expect("window");
    let pathname = host.pathname().unwrap();
    assert!(pathname.starts_with('/'), "{pathname}");
    assert!(host.href().unwrap().contains(&pathname));
}

#[wasm_bindgen_test]
fn document_is_parsed_by_the_time_tests_run() {
    let host = WebHost::new().expect("window");
    assert!(!host.is_loading());
}

#[wasm_bindgen_test]
fn writes_session_storage() {
    let host = WebHost::new().expect("window");
    host.set_session_item("html-route-guard-test", "value").unwrap();

    let stored = web_sys::window()
        .unwrap()
        .session_storage()
        .unwrap()
        .unwrap()
        .get_item("html-route-guard-test")
        .unwrap();
    assert_eq!(stored.as_deref(), Some("value"));
}

#[wasm_bindgen_test]
fn current_page_passes_when_listed() {
    let host = Rc::new(WebHost::new().expect("window"));
    let config = GuardConfig::default();
    let pathname = host.pathname().unwrap();

    let lookup = PageGuard::new(Arc::new(RouteManifest::default()), config.clone());
    let current = lookup.requested_route(&pathname);
    let manifest = Arc::new(RouteManifest::from_routes([current.as_str()]));

    let guard = Rc::new(PageGuard::new(manifest, config));
    let outcome = Rc::clone(&guard).install(host);
    assert_eq!(outcome, Some(GuardOutcome::Found(current)));
    assert_eq!(guard.phase(), GuardPhase::Pass);
}

#[wasm_bindgen_test]
fn missing_error_document_keeps_the_page() {
    let host = WebHost::new().expect("window");
    let guard = PageGuard::new(
        Arc::new(RouteManifest::from_routes(["somewhere/else.html"])),
        GuardConfig::default(),
    );
    let outcome = guard.check(&host);
    assert!(
        matches!(
            outcome,
            GuardOutcome::Unresolvable { .. } | GuardOutcome::ErrorDocument
        ),
        "{outcome:?}"
    );
}
