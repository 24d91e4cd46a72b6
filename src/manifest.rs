use include_dir::Dir;
use serde::Serialize;

use crate::path::{normalize_path, Route, PAGE_EXTENSION};

/// The complete, immutable set of [`Route`]s for one build.
///
/// Routes are kept sorted and deduplicated, which makes membership a binary
/// search and makes two manifests built from the same tree compare (and
/// serialize) identically. There is no mutation API: a rebuild produces a
/// new manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RouteManifest {
    routes: Box<[Route]>,
}

impl RouteManifest {
    /// Build a manifest from raw paths.
    ///
    /// Every input goes through [`normalize_path`], so the generated module
    /// and any hand-written list end up with the same canonical entries.
    pub fn from_routes<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut routes: Vec<Route> = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .collect();
        routes.sort();
        routes.dedup();
        Self {
            routes: routes.into_boxed_slice(),
        }
    }

    /// Build a manifest from a content tree embedded with `include_dir!`.
    ///
    /// Every `*.html` file below `dir` becomes a route relative to `dir`.
    pub fn from_dir(dir: &Dir<'_>) -> Self {
        let mut paths = Vec::new();
        collect_pages(dir, &mut paths);
        Self::from_routes(paths)
    }

    /// `true` if `path`, once normalized, is exactly one of the routes.
    ///
    /// Matching is case-sensitive and whole-path only.
    pub fn is_route_exists(&self, path: &str) -> bool {
        self.contains(&normalize_path(path))
    }

    pub fn contains(&self, route: &Route) -> bool {
        self.routes.binary_search(route).is_ok()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Pretty-printed JSON array of the routes, one per line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.routes)
    }
}

impl<'a> IntoIterator for &'a RouteManifest {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

fn collect_pages(dir: &Dir<'_>, paths: &mut Vec<String>) {
    for file in dir.files() {
        let raw_path = file.path().to_string_lossy();
        if raw_path.ends_with(PAGE_EXTENSION) {
            paths.push(raw_path.replace('\\', "/"));
        }
    }

    for subdir in dir.dirs() {
        collect_pages(subdir, paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use include_dir::{DirEntry, File};
    use proptest::prelude::*;

    fn sample() -> RouteManifest {
        RouteManifest::from_routes(["pages/error.html", "index.html", "pages/a.html"])
    }

    #[test]
    fn routes_are_sorted() {
        let manifest = sample();
        let routes: Vec<&str> = manifest.iter().map(Route::as_str).collect();
        assert_eq!(routes, vec!["index.html", "pages/a.html", "pages/error.html"]);
    }

    #[test]
    fn duplicates_collapse_after_normalization() {
        let manifest =
            RouteManifest::from_routes(["pages/a.html", "/pages/a.html", "pages\\a.html"]);
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn every_route_exists() {
        let manifest = sample();
        for route in &manifest {
            assert!(manifest.is_route_exists(route.as_str()), "{route} missing");
        }
    }

    #[test]
    fn missing_route_does_not_exist() {
        assert!(!sample().is_route_exists("pages/does-not-exist.html"));
    }

    #[test]
    fn no_prefix_matching() {
        let manifest = sample();
        assert!(!manifest.is_route_exists("pages"));
        assert!(!manifest.is_route_exists("pages/a.htm"));
        assert!(!manifest.is_route_exists("pages/a.html.bak"));
    }

    #[test]
    fn membership_is_case_sensitive() {
        assert!(!sample().is_route_exists("Pages/A.html"));
    }

    #[test]
    fn raw_request_forms_resolve() {
        let manifest = sample();
        assert!(manifest.is_route_exists("/"));
        assert!(manifest.is_route_exists("/pages/a.html?ref=menu"));
        assert!(!manifest.is_route_exists("/pages/missing"));
    }

    #[test]
    fn directory_request_hits_nested_index() {
        let manifest = RouteManifest::from_routes(["pages/heat/index.html"]);
        assert!(manifest.is_route_exists("pages/heat"));
        assert!(manifest.is_route_exists("/pages/heat/"));
    }

    #[test]
    fn empty_manifest_has_nothing() {
        let manifest = RouteManifest::default();
        assert!(manifest.is_empty());
        assert!(!manifest.is_route_exists("index.html"));
    }

    #[test]
    fn json_export_lists_routes() {
        let json = sample().to_json().unwrap();
        let parsed: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec!["index.html", "pages/a.html", "pages/error.html"]);
    }

    static ROOT: Dir<'static> = Dir::new(
        "",
        &[
            DirEntry::File(File::new("index.html", b"<html></html>")),
            DirEntry::File(File::new("style.css", b"body {}")),
            DirEntry::Dir(Dir::new(
                "pages",
                &[DirEntry::File(File::new("pages/a.html", b"<html></html>"))],
            )),
        ],
    );

    #[test]
    fn from_dir_collects_only_pages() {
        let manifest = RouteManifest::from_dir(&ROOT);
        let routes: Vec<&str> = manifest.iter().map(Route::as_str).collect();
        assert_eq!(routes, vec!["index.html", "pages/a.html"]);
    }

    proptest! {
        #[test]
        fn generated_routes_are_members(
            names in proptest::collection::vec("[a-z]{1,8}(/[a-z]{1,8}){0,2}", 1..16)
        ) {
            let paths: Vec<String> = names.iter().map(|n| format!("{n}.html")).collect();
            let manifest = RouteManifest::from_routes(&paths);
            for path in &paths {
                prop_assert!(manifest.is_route_exists(path));
            }
            for route in &manifest {
                prop_assert!(manifest.is_route_exists(route.as_str()));
            }
        }

        #[test]
        fn construction_order_does_not_matter(
            mut names in proptest::collection::vec("[a-z]{1,6}\\.html", 0..12)
        ) {
            let forward = RouteManifest::from_routes(&names);
            names.reverse();
            let backward = RouteManifest::from_routes(&names);
            prop_assert_eq!(forward, backward);
        }
    }
}
