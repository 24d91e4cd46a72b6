use std::fmt;

use serde::Serialize;

/// Filename every directory route resolves to.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Extension shared by every page document.
pub const PAGE_EXTENSION: &str = ".html";

/// A canonical, content-root-relative page path such as `pages/home/news.html`.
///
/// A `Route` always uses forward slashes, never starts or ends with a slash,
/// and always ends in `.html`. The only ways to obtain one are
/// [`normalize_path`] and [`Route::parse`], so the shape holds everywhere a
/// `Route` is seen.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    /// Accept `raw` only if it is already in canonical form.
    ///
    /// Unlike [`normalize_path`], this never rewrites its input: it returns
    /// `None` when normalizing would change the string.
    pub fn parse(raw: &str) -> Option<Route> {
        let route = normalize_path(raw);
        (route.as_str() == raw).then_some(route)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment, e.g. `news.html` for `pages/home/news.html`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Number of directories between the content root and this document.
    ///
    /// `index.html` → 0, `pages/a.html` → 1, `pages/home/news.html` → 2.
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Route {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Route {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Route {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Project an arbitrary path string onto the [`Route`] shape.
///
/// Steps, in order:
///
/// 1. Backslashes become forward slashes.
/// 2. Leading and trailing slashes are stripped.
/// 3. Everything from the first `?` or `#` on is dropped.
/// 4. An empty remainder is the root document, `index.html`.
/// 5. A remainder not ending in `.html` is treated as a directory and gets
///    `index.html` appended (after a `/` unless it already ends in one).
///
/// Separators are converted first so that the output is a fixed point:
/// `normalize_path(normalize_path(p)) == normalize_path(p)` for every `p`.
///
/// Non-`.html` extensions are not special-cased: `img/logo.png` becomes
/// `img/logo.png/index.html`. Callers that may see asset paths filter them
/// before asking.
///
/// The result says nothing about existence; see
/// [`RouteManifest::is_route_exists`](crate::RouteManifest::is_route_exists).
pub fn normalize_path(raw: &str) -> Route {
    let forward = raw.replace('\\', "/");
    let trimmed = forward.trim_matches('/');
    let path = match trimmed.find(['?', '#']) {
        Some(cut) => &trimmed[..cut],
        None => trimmed,
    };

    if path.is_empty() {
        return Route(INDEX_DOCUMENT.to_string());
    }

    if path.ends_with(PAGE_EXTENSION) {
        Route(path.to_string())
    } else if path.ends_with('/') {
        Route(format!("{path}{INDEX_DOCUMENT}"))
    } else {
        Route(format!("{path}/{INDEX_DOCUMENT}"))
    }
}
