use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::warn;

use crate::config::{relative_prefix, BaseUrl, GuardConfig};
use crate::host::{Host, HostError};
use crate::manifest::RouteManifest;
use crate::path::{normalize_path, Route};

/// Where a [`PageGuard`] is in its single pass over a page load.
///
/// `Idle → WaitingForReady → Checking → Pass | Redirecting`. The
/// `WaitingForReady` step only appears when the document was still loading
/// at install time. `Pass` and `Redirecting` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    WaitingForReady,
    Checking,
    Pass,
    Redirecting,
}

/// What one guard check decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The requested route is in the manifest.
    Found(Route),
    /// The current document is the error document; never redirected.
    ErrorDocument,
    /// The route is missing and the page was replaced with the error document.
    Redirected { route: Route, target: String },
    /// The route is missing but no valid error location could be computed,
    /// so the page is left alone.
    Unresolvable { route: Route },
    /// The route is missing and the host refused the navigation.
    NavigationFailed {
        route: Route,
        target: String,
        error: HostError,
    },
    /// The host could not report its location.
    LocationUnavailable(HostError),
    /// The guard already ran for this page load.
    AlreadyRan,
}

impl GuardOutcome {
    /// `true` if a navigation was issued.
    pub fn redirected(&self) -> bool {
        matches!(self, GuardOutcome::Redirected { .. })
    }
}

/// Per-page existence check: redirect to the error document when the current
/// location is not a known route.
///
/// One guard serves one page load. The manifest is shared read-only, so any
/// number of guards can hold the same `Arc`.
pub struct PageGuard {
    manifest: Arc<RouteManifest>,
    config: GuardConfig,
    phase: Cell<GuardPhase>,
}

impl PageGuard {
    pub fn new(manifest: Arc<RouteManifest>, config: GuardConfig) -> Self {
        Self {
            manifest,
            config,
            phase: Cell::new(GuardPhase::Idle),
        }
    }

    pub fn phase(&self) -> GuardPhase {
        self.phase.get()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn manifest(&self) -> &RouteManifest {
        &self.manifest
    }

    /// Run the guard as a page script would.
    ///
    /// If the host document is still loading, the check is deferred to the
    /// host's ready signal and `None` is returned. Otherwise the check runs
    /// immediately and its outcome is returned.
    pub fn install<H: Host + 'static>(self: Rc<Self>, host: Rc<H>) -> Option<GuardOutcome> {
        if self.phase.get() != GuardPhase::Idle {
            return Some(GuardOutcome::AlreadyRan);
        }
        if host.is_loading() {
            debug_log!("document loading, deferring route check");
            self.phase.set(GuardPhase::WaitingForReady);
            let guard = Rc::clone(&self);
            let ready_host = Rc::clone(&host);
            host.on_ready(Box::new(move || {
                guard.check(&*ready_host);
            }));
            return None;
        }
        Some(self.check(&*host))
    }

    /// Check the current location once and redirect if it is not a route.
    ///
    /// Never panics and never propagates an error; every failure is folded
    /// into the returned [`GuardOutcome`]. Calls after the first return
    /// [`GuardOutcome::AlreadyRan`] without touching the host.
    pub fn check<H: Host + ?Sized>(&self, host: &H) -> GuardOutcome {
        match self.phase.get() {
            GuardPhase::Idle | GuardPhase::WaitingForReady => {}
            _ => return GuardOutcome::AlreadyRan,
        }
        self.phase.set(GuardPhase::Checking);

        let pathname = match host.pathname() {
            Ok(pathname) => pathname,
            Err(err) => {
                warn!("route check skipped, location unavailable: {err}");
                self.phase.set(GuardPhase::Pass);
                return GuardOutcome::LocationUnavailable(err);
            }
        };

        let route = self.requested_route(&pathname);
        debug_log!("checking {pathname} as {route}");

        if self.is_error_document(&route, &pathname) {
            self.phase.set(GuardPhase::Pass);
            return GuardOutcome::ErrorDocument;
        }

        if self.manifest.contains(&route) {
            self.phase.set(GuardPhase::Pass);
            return GuardOutcome::Found(route);
        }

        let Some(target) = self.error_target(&pathname) else {
            warn!("{route} not found but no error document location resolves from {pathname}");
            self.phase.set(GuardPhase::Pass);
            return GuardOutcome::Unresolvable { route };
        };

        let original_url = host.href().unwrap_or_else(|err| {
            warn!("could not read full URL, recording path only: {err}");
            pathname.clone()
        });
        if let Err(err) = host.set_session_item(&self.config.storage_key, &original_url) {
            warn!("could not record original URL under {}: {err}", self.config.storage_key);
        }

        self.phase.set(GuardPhase::Redirecting);
        debug_log!("{route} not found, replacing location with {target}");
        match host.replace(&target) {
            Ok(()) => GuardOutcome::Redirected { route, target },
            Err(error) => {
                warn!("redirect to {target} failed: {error}");
                GuardOutcome::NavigationFailed {
                    route,
                    target,
                    error,
                }
            }
        }
    }

    /// The route a location pathname asks for under the configured base.
    ///
    /// Pathnames arrive percent-encoded (`my%20page.html`) while routes hold
    /// the file names as written, so the path is decoded before it is
    /// normalized. A decoding that is not valid UTF-8 keeps the raw text.
    pub fn requested_route(&self, pathname: &str) -> Route {
        let stripped = self.config.base.strip(pathname);
        let decoded = percent_decode_str(stripped)
            .decode_utf8()
            .unwrap_or(Cow::Borrowed(stripped));
        normalize_path(&decoded)
    }

    /// Location of the error document as seen from `pathname`.
    ///
    /// - `Root` base: `/` followed by the error route.
    /// - `Prefix` base: the prefix followed by the error route.
    /// - `Relative` base: one `../` per directory between the content root
    ///   and the current document (`./` at the root), then the error route.
    ///
    /// Returns `None` when no valid location exists: the error document is
    /// not part of the manifest, the pathname is not absolute, or a relative
    /// climb cannot be counted because the path has empty or dot segments.
    pub fn error_target(&self, pathname: &str) -> Option<String> {
        let error_route = &self.config.error_route;
        if !self.manifest.contains(error_route) || !pathname.starts_with('/') {
            return None;
        }

        match &self.config.base {
            BaseUrl::Root => Some(format!("/{error_route}")),
            BaseUrl::Prefix(prefix) => Some(format!("{prefix}{error_route}")),
            BaseUrl::Relative => {
                let relative = pathname.trim_start_matches('/');
                let directories: Vec<&str> = relative.split('/').collect();
                let directories = &directories[..directories.len() - 1];
                if directories
                    .iter()
                    .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
                {
                    return None;
                }
                Some(format!("{}{error_route}", relative_prefix(directories.len())))
            }
        }
    }

    fn is_error_document(&self, route: &Route, pathname: &str) -> bool {
        let error_route = &self.config.error_route;
        route == error_route || pathname.contains(error_route.file_name())
    }
}
