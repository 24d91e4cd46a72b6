use std::rc::Rc;
use std::sync::Arc;

use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Window};

use crate::config::GuardConfig;
use crate::guard::{GuardOutcome, PageGuard};
use crate::host::{Host, HostError};
use crate::manifest::RouteManifest;

/// `document.readyState` while the document is still being parsed.
const LOADING_STATE: &str = "loading";

fn js_failure(operation: &'static str, err: JsValue) -> HostError {
    HostError::Failed {
        operation,
        message: err.as_string().unwrap_or_else(|| format!("{err:?}")),
    }
}

/// A [`Host`] backed by the browser's `window`.
pub struct WebHost {
    window: Window,
}

impl WebHost {
    /// Bind to the global `window`, if there is one.
    pub fn new() -> Option<Self> {
        web_sys::window().map(|window| Self { window })
    }
}

impl Host for WebHost {
    fn pathname(&self) -> Result<String, HostError> {
        self.window
            .location()
            .pathname()
            .map_err(|err| js_failure("location.pathname", err))
    }

    fn href(&self) -> Result<String, HostError> {
        self.window
            .location()
            .href()
            .map_err(|err| js_failure("location.href", err))
    }

    fn set_session_item(&self, key: &str, value: &str) -> Result<(), HostError> {
        let storage = self
            .window
            .session_storage()
            .map_err(|err| js_failure("sessionStorage", err))?
            .ok_or(HostError::Unavailable("sessionStorage"))?;
        storage
            .set_item(key, value)
            .map_err(|err| js_failure("sessionStorage.setItem", err))
    }

    fn replace(&self, url: &str) -> Result<(), HostError> {
        self.window
            .location()
            .replace(url)
            .map_err(|err| js_failure("location.replace", err))
    }

    fn is_loading(&self) -> bool {
        self.window
            .document()
            .is_some_and(|document| document.ready_state() == LOADING_STATE)
    }

    fn on_ready(&self, callback: Box<dyn FnOnce()>) {
        let Some(document) = self.window.document() else {
            warn!("no document to wait on, route check dropped");
            return;
        };
        let listener = Closure::once_into_js(move || callback());
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        if let Err(err) = document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            listener.unchecked_ref(),
            &options,
        ) {
            warn!("could not listen for DOMContentLoaded: {err:?}");
        }
    }
}

/// Install a [`PageGuard`] on the current browser page.
///
/// Returns the outcome when the check ran immediately, `None` when it was
/// deferred to `DOMContentLoaded` or there is no `window`.
pub fn install_in_browser(manifest: Arc<RouteManifest>, config: GuardConfig) -> Option<GuardOutcome> {
    let Some(host) = WebHost::new() else {
        warn!("no window, route check skipped");
        return None;
    };
    Rc::new(PageGuard::new(manifest, config)).install(Rc::new(host))
}
