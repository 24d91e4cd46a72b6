use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

/// Origin used by [`MemoryHost`] when building its `href`.
const MEMORY_ORIGIN: &str = "http://localhost";

/// Failure of one host primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The primitive does not exist in this environment (no window, storage
    /// disabled, and so on).
    #[error("{0} is not available")]
    Unavailable(&'static str),

    /// The primitive exists but the call was rejected.
    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },
}

/// The browser primitives a page guard needs, and nothing more.
///
/// Implementations are single-threaded: one host per loaded page.
pub trait Host {
    /// Path component of the current location, e.g. `/pages/a.html`.
    fn pathname(&self) -> Result<String, HostError>;

    /// Full current URL.
    fn href(&self) -> Result<String, HostError>;

    /// Write one entry to session-scoped storage.
    fn set_session_item(&self, key: &str, value: &str) -> Result<(), HostError>;

    /// Navigate to `url` without adding a history entry.
    fn replace(&self, url: &str) -> Result<(), HostError>;

    /// `true` while the document is still being parsed.
    fn is_loading(&self) -> bool;

    /// Run `callback` once when the document becomes ready.
    fn on_ready(&self, callback: Box<dyn FnOnce()>);
}

struct MemoryHostState {
    pathname: String,
    href: String,
    loading: bool,
    ready_callbacks: Vec<Box<dyn FnOnce()>>,
    session: HashMap<String, String>,
    storage_writes: usize,
    navigations: Vec<String>,
    storage_available: bool,
    navigation_available: bool,
}

/// A [`Host`] that keeps location, storage and navigation in memory.
///
/// Navigation is recorded, not performed: the location stays where it was,
/// matching what a page sees in the instant before the browser unloads it.
pub struct MemoryHost {
    state: RefCell<MemoryHostState>,
}

impl MemoryHost {
    /// A host whose document is already ready at `pathname`.
    pub fn new(pathname: impl Into<String>) -> Self {
        let pathname = pathname.into();
        let href = format!("{MEMORY_ORIGIN}{pathname}");
        Self {
            state: RefCell::new(MemoryHostState {
                pathname,
                href,
                loading: false,
                ready_callbacks: Vec::new(),
                session: HashMap::new(),
                storage_writes: 0,
                navigations: Vec::new(),
                storage_available: true,
                navigation_available: true,
            }),
        }
    }

    /// Override the full URL, e.g. to include a query string.
    pub fn with_href(self, href: impl Into<String>) -> Self {
        self.state.borrow_mut().href = href.into();
        self
    }

    /// Start in the loading state; [`fire_ready`](Self::fire_ready) ends it.
    pub fn loading(self) -> Self {
        self.state.borrow_mut().loading = true;
        self
    }

    /// Make every storage write fail, as in a browser with storage disabled.
    pub fn without_storage(self) -> Self {
        self.state.borrow_mut().storage_available = false;
        self
    }

    /// Make every navigation fail.
    pub fn without_navigation(self) -> Self {
        self.state.borrow_mut().navigation_available = false;
        self
    }

    /// Mark the document ready and run every registered callback once.
    pub fn fire_ready(&self) {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            state.loading = false;
            std::mem::take(&mut state.ready_callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    pub fn pending_ready_callbacks(&self) -> usize {
        self.state.borrow().ready_callbacks.len()
    }

    pub fn session_item(&self, key: &str) -> Option<String> {
        self.state.borrow().session.get(key).cloned()
    }

    /// Number of successful storage writes, including overwrites.
    pub fn storage_writes(&self) -> usize {
        self.state.borrow().storage_writes
    }

    /// Every URL passed to [`Host::replace`] that succeeded, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.state.borrow().navigations.clone()
    }
}

impl Host for MemoryHost {
    fn pathname(&self) -> Result<String, HostError> {
        Ok(self.state.borrow().pathname.clone())
    }

    fn href(&self) -> Result<String, HostError> {
        Ok(self.state.borrow().href.clone())
    }

    fn set_session_item(&self, key: &str, value: &str) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.storage_available {
            return Err(HostError::Unavailable("sessionStorage"));
        }
        state.session.insert(key.to_string(), value.to_string());
        state.storage_writes += 1;
        Ok(())
    }

    fn replace(&self, url: &str) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if !state.navigation_available {
            return Err(HostError::Failed {
                operation: "location.replace",
                message: format!("navigation to {url} blocked"),
            });
        }
        state.navigations.push(url.to_string());
        Ok(())
    }

    fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    fn on_ready(&self, callback: Box<dyn FnOnce()>) {
        self.state.borrow_mut().ready_callbacks.push(callback);
    }
}
