//! Client-side 404 handling for static HTML sites whose host has no
//! server-side error page. A build step records every page document of the
//! site in a route manifest and injects a guard script into each page; at
//! page load the guard looks the requested path up in the manifest and, when
//! it is missing, remembers the original URL in session storage and replaces
//! the location with the site's error page.
//!
//! # Features
//!
//! - **Route manifest**: the content root is scanned at build time into a
//!   sorted, deduplicated [`RouteManifest`]. See [`build::generate_manifest`].
//! - **Path normalization**: [`normalize_path`] maps any location pathname to
//!   a canonical [`Route`] (`/pages/` and `/pages` both become
//!   `pages/index.html`).
//! - **Deploy base**: root, relative and prefixed deployments are described
//!   by [`BaseUrl`], read from the `SITE_BASE_URL` environment variable at
//!   build time.
//! - **Page guard**: [`PageGuard`] runs the check once per page, waiting for
//!   the document to be ready, over any [`Host`]. [`MemoryHost`] drives it in
//!   tests; the `web` feature adds a browser host.
//! - **Script injection**: [`build::inject_guard`] adds the guard script to
//!   every page head with a depth-relative `src`, skipping the error page.
//! - **News listing**: [`news::NewsFeed`] and [`pagination::Pagination`]
//!   filter and page the site's news items.
//!
//! # Quick Start
//!
//! **1. Build script**: scans `site/` and writes the manifest to `OUT_DIR`:
//!
//! ```rust,ignore
//! // build.rs
//! fn main() {
//!     html_route_guard::build::generate_manifest();
//!     html_route_guard::build::inject_guard();
//! }
//! ```
//!
//! **2. Guard entry point**: include the generated manifest and install the
//! guard when the page loads:
//!
//! ```rust,ignore
//! mod route_manifest {
//!     include!(concat!(env!("OUT_DIR"), "/__route_manifest.rs"));
//! }
//!
//! #[wasm_bindgen(start)]
//! pub fn start() {
//!     html_route_guard::install_in_browser(
//!         route_manifest::manifest(),
//!         route_manifest::guard_config(),
//!     );
//! }
//! ```

/// Debug logging macro gated behind the `debug-logging` feature flag.
/// When enabled, expands to `tracing::debug!`; otherwise compiles to nothing.
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Build-script utilities: route scanning, manifest generation, script injection.
pub mod build;
/// Deploy base and guard configuration.
pub mod config;
/// The page-load route check.
pub mod guard;
/// Browser primitives the guard runs against.
pub mod host;
/// The set of existing routes.
pub mod manifest;
/// Filterable, paginated news items.
pub mod news;
/// Page arithmetic for paginated lists.
pub mod pagination;
/// Pathname normalization.
pub mod path;
/// Browser host over `web-sys`.
#[cfg(feature = "web")]
pub mod web;

pub use config::{BaseUrl, GuardConfig, InjectConfig};
pub use guard::{GuardOutcome, GuardPhase, PageGuard};
pub use host::{Host, HostError, MemoryHost};
pub use manifest::RouteManifest;
pub use path::{normalize_path, Route};
#[cfg(feature = "web")]
pub use web::{install_in_browser, WebHost};
