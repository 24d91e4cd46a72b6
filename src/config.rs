use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::path::{normalize_path, Route};

/// Route of the canonical error document.
pub const DEFAULT_ERROR_ROUTE: &str = "pages/error.html";

/// Session-storage key holding the URL that failed to resolve.
pub const DEFAULT_STORAGE_KEY: &str = "404-original-url";

/// Location of the guard script, relative to the content root.
pub const DEFAULT_SCRIPT_PATH: &str = "js/404-handler.js";

/// Where the site is mounted, as configured at build or deploy time.
///
/// | Configured value | Variant | Requested path |
/// |------------------|---------|----------------|
/// | `"/"` | `Root` | leading slashes stripped |
/// | `"./"` or `""` | `Relative` | leading slashes stripped, nothing else |
/// | `"/docs/"` | `Prefix("/docs/")` | prefix stripped, then leading slashes |
///
/// Parsing never fails: anything that is not the root or relative form is a
/// prefix, normalized to start and end with `/`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BaseUrl {
    Root,
    #[default]
    Relative,
    Prefix(String),
}

impl BaseUrl {
    pub fn parse(raw: &str) -> BaseUrl {
        match raw.trim() {
            "" | "." | "./" => BaseUrl::Relative,
            "/" => BaseUrl::Root,
            other => {
                let inner = other.trim_matches('/');
                if inner.is_empty() {
                    BaseUrl::Root
                } else {
                    BaseUrl::Prefix(format!("/{inner}/"))
                }
            }
        }
    }

    /// Strip this base from a location pathname, leaving a content-root
    /// relative path without leading slashes.
    ///
    /// A prefix that does not match `pathname` leaves it untouched apart from
    /// the leading slashes.
    pub fn strip<'a>(&self, pathname: &'a str) -> &'a str {
        let rest = match self {
            BaseUrl::Prefix(prefix) => match pathname.strip_prefix(prefix.as_str()) {
                Some(rest) => rest,
                None if pathname == prefix.trim_end_matches('/') => "",
                None => pathname,
            },
            BaseUrl::Root | BaseUrl::Relative => pathname,
        };
        rest.trim_start_matches('/')
    }
}

impl FromStr for BaseUrl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BaseUrl::parse(s))
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseUrl::Root => f.write_str("/"),
            BaseUrl::Relative => f.write_str("./"),
            BaseUrl::Prefix(prefix) => f.write_str(prefix),
        }
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(BaseUrl::parse(&raw))
    }
}

fn deserialize_route<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Route, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_path(&raw))
}

fn default_error_route() -> Route {
    normalize_path(DEFAULT_ERROR_ROUTE)
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_script_path() -> String {
    DEFAULT_SCRIPT_PATH.to_string()
}

/// Runtime configuration for [`PageGuard`](crate::PageGuard).
///
/// # Defaults
///
/// - `base`: [`BaseUrl::Relative`]
/// - `error_route`: `pages/error.html`
/// - `storage_key`: `404-original-url`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GuardConfig {
    #[serde(default)]
    pub base: BaseUrl,

    /// The error document. It is both the redirect target and the one page
    /// the guard never redirects away from.
    #[serde(default = "default_error_route", deserialize_with = "deserialize_route")]
    pub error_route: Route,

    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base: BaseUrl::default(),
            error_route: default_error_route(),
            storage_key: default_storage_key(),
        }
    }
}

impl GuardConfig {
    pub fn with_base(mut self, base: BaseUrl) -> Self {
        self.base = base;
        self
    }

    pub fn with_error_route(mut self, route: &str) -> Self {
        self.error_route = normalize_path(route);
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Read a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Build-time configuration for [`inject_guard_into`](crate::build::inject_guard_into).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InjectConfig {
    /// Guard script location relative to the content root, e.g. `js/404-handler.js`.
    #[serde(default = "default_script_path")]
    pub script_path: String,

    /// Document that never receives the script.
    #[serde(default = "default_error_route", deserialize_with = "deserialize_route")]
    pub error_route: Route,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            script_path: default_script_path(),
            error_route: default_error_route(),
        }
    }
}

impl InjectConfig {
    /// Filename used to detect an already-injected document.
    pub fn script_file_name(&self) -> &str {
        self.script_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.script_path)
    }

    /// Script `src` as seen from a document `depth` directories below the root.
    ///
    /// `"./"` at the root, one `"../"` per level below it.
    pub fn script_src(&self, depth: usize) -> String {
        let script = self.script_path.trim_start_matches("./").trim_start_matches('/');
        format!("{}{script}", relative_prefix(depth))
    }
}

/// Relative prefix that climbs from a directory `depth` levels deep back to
/// the content root.
pub(crate) fn relative_prefix(depth: usize) -> String {
    if depth == 0 {
        "./".to_string()
    } else {
        "../".repeat(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> BaseUrl {
        BaseUrl::parse(s)
    }

    #[test]
    fn base_url_forms() {
        assert_eq!(base("/"), BaseUrl::Root);
        assert_eq!(base("./"), BaseUrl::Relative);
        assert_eq!(base(""), BaseUrl::Relative);
        assert_eq!(base("/site/"), BaseUrl::Prefix("/site/".into()));
        assert_eq!(base("site"), BaseUrl::Prefix("/site/".into()));
        assert_eq!(base("/a/b"), BaseUrl::Prefix("/a/b/".into()));
        assert_eq!(base("//"), BaseUrl::Root);
    }

    #[test]
    fn base_url_display_round_trips() {
        for raw in ["/", "./", "/site/"] {
            assert_eq!(base(raw).to_string(), raw);
        }
    }

    #[test]
    fn strip_root_and_relative() {
        assert_eq!(BaseUrl::Root.strip("/pages/a.html"), "pages/a.html");
        assert_eq!(BaseUrl::Relative.strip("//pages/a.html"), "pages/a.html");
        assert_eq!(BaseUrl::Root.strip("/"), "");
    }

    #[test]
    fn strip_prefix() {
        let b = base("/site/");
        assert_eq!(b.strip("/site/pages/a.html"), "pages/a.html");
        assert_eq!(b.strip("/site/"), "");
        assert_eq!(b.strip("/site"), "");
        assert_eq!(b.strip("/other/pages/a.html"), "other/pages/a.html");
    }

    #[test]
    fn guard_config_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.base, BaseUrl::Relative);
        assert_eq!(config.error_route, "pages/error.html");
        assert_eq!(config.storage_key, "404-original-url");
    }

    #[test]
    fn guard_config_from_partial_json() {
        let config = GuardConfig::from_json(r#"{ "base": "/docs" }"#).unwrap();
        assert_eq!(config.base, BaseUrl::Prefix("/docs/".into()));
        assert_eq!(config.error_route, "pages/error.html");
        assert_eq!(config.storage_key, "404-original-url");
    }

    #[test]
    fn guard_config_json_normalizes_error_route() {
        let config = GuardConfig::from_json(r#"{ "error_route": "/errors/404.html" }"#).unwrap();
        assert_eq!(config.error_route, "errors/404.html");
    }

    #[test]
    fn script_src_by_depth() {
        let config = InjectConfig::default();
        assert_eq!(config.script_src(0), "./js/404-handler.js");
        assert_eq!(config.script_src(1), "../js/404-handler.js");
        assert_eq!(config.script_src(2), "../../js/404-handler.js");
        assert_eq!(config.script_src(4), "../../../../js/404-handler.js");
    }

    #[test]
    fn script_file_name() {
        assert_eq!(InjectConfig::default().script_file_name(), "404-handler.js");
    }
}
