use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::{BaseUrl, InjectConfig, DEFAULT_ERROR_ROUTE};
use crate::path::{Route, PAGE_EXTENSION};

/// Content root scanned by [`generate_manifest`] and [`inject_guard`].
pub const DEFAULT_CONTENT_ROOT: &str = "site";

/// Generated Rust module written to `OUT_DIR`.
pub const MANIFEST_MODULE: &str = "__route_manifest.rs";

/// JSON copy of the manifest written next to the module.
pub const MANIFEST_JSON: &str = "route_manifest.json";

/// Environment variable holding the deploy base (`/`, `./` or `/prefix/`).
pub const BASE_URL_ENV: &str = "SITE_BASE_URL";

const HEAD_CLOSE: &str = "</head>";
const SCRIPT_OPEN: &str = "<script";
const SCRIPT_CLOSE: &str = "</script>";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("content root '{}' does not exist or is not a directory", .0.display())]
    MissingRoot(PathBuf),

    #[error("content root '{}' contains no .html documents", .0.display())]
    NoDocuments(PathBuf),

    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize route manifest: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Every page document under `content_root`, as sorted, unique [`Route`]s.
///
/// Paths are relative to `content_root` with forward slashes. A missing root
/// or a root without a single `.html` file is an error rather than an empty
/// list, since an empty manifest would make every page look missing.
///
/// File names that cannot be expressed as a route (for example ones
/// containing `?` or `#`) are skipped with a `cargo:warning`.
pub fn scan_routes(content_root: impl AsRef<Path>) -> Result<Vec<Route>, BuildError> {
    let content_root = content_root.as_ref();
    if !content_root.is_dir() {
        return Err(BuildError::MissingRoot(content_root.to_path_buf()));
    }

    let mut routes = Vec::new();
    scan_directory(content_root, String::new(), &mut routes)?;

    if routes.is_empty() {
        return Err(BuildError::NoDocuments(content_root.to_path_buf()));
    }

    routes.sort();
    routes.dedup();
    Ok(routes)
}

fn scan_directory(dir: &Path, prefix: String, routes: &mut Vec<Route>) -> Result<(), BuildError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let Ok(name) = entry.file_name().into_string() else {
            println!(
                "cargo:warning=skipping '{}': the file name is not valid UTF-8",
                path.display()
            );
            continue;
        };
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        // Symlinked directories are not followed, so a link cycle cannot
        // recurse forever.
        let file_type = entry.file_type().map_err(io_error(&path))?;
        if file_type.is_dir() {
            scan_directory(&path, relative, routes)?;
        } else if relative.ends_with(PAGE_EXTENSION) {
            match Route::parse(&relative) {
                Some(route) => routes.push(route),
                None => println!(
                    "cargo:warning=skipping '{}': the file name cannot be used as a route",
                    path.display()
                ),
            }
        }
    }
    Ok(())
}

/// Generate the route manifest from the default `site` directory.
///
/// Convenience wrapper around [`generate_manifest_from`]:
///
/// ```rust,ignore
/// // build.rs
/// fn main() {
///     html_route_guard::build::generate_manifest();
/// }
/// ```
pub fn generate_manifest() {
    generate_manifest_from(DEFAULT_CONTENT_ROOT);
}

/// Generate the route manifest from a custom content root.
///
/// Scans `dir` for `.html` documents and writes two files into `OUT_DIR`:
///
/// - `__route_manifest.rs`: `ROUTES`, `BASE_URL`, `manifest()`,
///   `is_route_exists()`, `guard_config()` and a re-export of
///   [`normalize_path`](crate::normalize_path). Include it with
///   `include!(concat!(env!("OUT_DIR"), "/__route_manifest.rs"))`.
/// - `route_manifest.json`: the same routes plus base and error route, for
///   inspection.
///
/// The deploy base comes from the `SITE_BASE_URL` environment variable and
/// defaults to `./`.
///
/// # Panics
///
/// Aborts the build with a diagnostic if `OUT_DIR` is unset, the content root
/// is missing or holds no documents, or the output cannot be written.
pub fn generate_manifest_from(dir: &str) {
    let content_root = Path::new(dir);
    let out_dir = match std::env::var("OUT_DIR") {
        Ok(out_dir) => out_dir,
        Err(_) => panic!("OUT_DIR not set: generate_manifest_from must be called from a build script"),
    };

    // Re-run when any document is added, removed or changed anywhere in the
    // tree, or when the deploy base changes.
    println!("cargo:rerun-if-changed={dir}");
    println!("cargo:rerun-if-env-changed={BASE_URL_ENV}");
    fn emit_rerun_if_changed(dir: &Path) {
        for entry in fs::read_dir(dir).into_iter().flatten().flatten() {
            let path = entry.path();
            println!("cargo:rerun-if-changed={}", path.display());
            if path.is_dir() {
                emit_rerun_if_changed(&path);
            }
        }
    }
    emit_rerun_if_changed(content_root);

    let base = std::env::var(BASE_URL_ENV)
        .map(|raw| BaseUrl::parse(&raw))
        .unwrap_or_default();

    if let Err(err) = write_manifest(content_root, Path::new(&out_dir), &base) {
        panic!("route manifest generation failed: {err}");
    }
}

/// Scan `content_root` and write the generated module and JSON manifest
/// into `out_dir`. Returns the routes that were written.
pub fn write_manifest(
    content_root: &Path,
    out_dir: &Path,
    base: &BaseUrl,
) -> Result<Vec<Route>, BuildError> {
    let routes = scan_routes(content_root)?;

    if !routes.iter().any(|route| route.as_str() == DEFAULT_ERROR_ROUTE) {
        println!(
            "cargo:warning=no {DEFAULT_ERROR_ROUTE} under '{}': missing pages will not be redirected",
            content_root.display()
        );
    }

    let module_path = out_dir.join(MANIFEST_MODULE);
    fs::write(&module_path, render_module(&routes, base)).map_err(io_error(&module_path))?;

    let json_path = out_dir.join(MANIFEST_JSON);
    fs::write(&json_path, render_json(&routes, base)?).map_err(io_error(&json_path))?;

    Ok(routes)
}

/// Source of the generated manifest module.
fn render_module(routes: &[Route], base: &BaseUrl) -> String {
    let mut output = String::new();
    output.push_str("// Generated by html_route_guard::build. Do not edit.\n\n");
    output.push_str("#[allow(unused_imports)]\n");
    output.push_str("pub use html_route_guard::normalize_path;\n\n");

    output.push_str("/// Every page document of this build, sorted.\n");
    output.push_str("pub static ROUTES: &[&str] = &[\n");
    for route in routes {
        output.push_str(&format!("    {:?},\n", route.as_str()));
    }
    output.push_str("];\n\n");

    output.push_str("/// Deploy base the manifest was generated for.\n");
    output.push_str(&format!(
        "pub const BASE_URL: &str = {:?};\n\n",
        base.to_string()
    ));

    output.push_str("/// The route manifest, built once on first use.\n");
    output.push_str(
        "pub fn manifest() -> ::std::sync::Arc<html_route_guard::RouteManifest> {\n",
    );
    output.push_str(
        "    static MANIFEST: ::std::sync::OnceLock<::std::sync::Arc<html_route_guard::RouteManifest>> =\n",
    );
    output.push_str("        ::std::sync::OnceLock::new();\n");
    output.push_str("    MANIFEST\n");
    output.push_str(
        "        .get_or_init(|| ::std::sync::Arc::new(html_route_guard::RouteManifest::from_routes(ROUTES.iter().copied())))\n",
    );
    output.push_str("        .clone()\n");
    output.push_str("}\n\n");

    output.push_str("#[allow(dead_code)]\n");
    output.push_str("pub fn is_route_exists(path: &str) -> bool {\n");
    output.push_str("    manifest().is_route_exists(path)\n");
    output.push_str("}\n\n");

    output.push_str("#[allow(dead_code)]\n");
    output.push_str("pub fn guard_config() -> html_route_guard::GuardConfig {\n");
    output.push_str(
        "    html_route_guard::GuardConfig::default().with_base(html_route_guard::BaseUrl::parse(BASE_URL))\n",
    );
    output.push_str("}\n");

    output
}

#[derive(Serialize)]
struct ManifestFile<'a> {
    base: String,
    error_route: &'a str,
    routes: &'a [Route],
}

fn render_json(routes: &[Route], base: &BaseUrl) -> Result<String, BuildError> {
    let file = ManifestFile {
        base: base.to_string(),
        error_route: DEFAULT_ERROR_ROUTE,
        routes,
    };
    let mut json = serde_json::to_string_pretty(&file)?;
    json.push('\n');
    Ok(json)
}

/// Result of an [`inject_guard_into`] pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InjectReport {
    /// Documents that received the script tag in this pass.
    pub injected: Vec<Route>,
    /// Documents that already referenced the script.
    pub already_present: Vec<Route>,
    /// Documents without a closing `</head>`, left untouched.
    pub missing_head: Vec<Route>,
    /// The error document, if it was found and skipped.
    pub error_document: Option<Route>,
}

/// Add the guard script to every document under the default `site` directory.
///
/// # Panics
///
/// Aborts the build if the content root is missing, empty, or a document
/// cannot be rewritten.
pub fn inject_guard() -> InjectReport {
    match inject_guard_into(Path::new(DEFAULT_CONTENT_ROOT), &InjectConfig::default()) {
        Ok(report) => report,
        Err(err) => panic!("guard script injection failed: {err}"),
    }
}

/// Add the guard script tag to every document under `content_root` except
/// the error document.
///
/// The `src` of the tag climbs from the document's directory back to the
/// content root (`./` at the root, one `../` per level) and then follows
/// `config.script_path`. Documents that already mention the script's file
/// name are left alone, so running this again changes nothing.
pub fn inject_guard_into(
    content_root: &Path,
    config: &InjectConfig,
) -> Result<InjectReport, BuildError> {
    let routes = scan_routes(content_root)?;
    let script_name = config.script_file_name();
    let mut report = InjectReport::default();

    for route in routes {
        if route == config.error_route {
            report.error_document = Some(route);
            continue;
        }

        let path = content_root.join(route.as_str());
        let html = fs::read_to_string(&path).map_err(io_error(&path))?;

        if html.contains(script_name) {
            report.already_present.push(route);
            continue;
        }

        let tag = format!(
            "<script type=\"module\" src=\"{}\"></script>",
            config.script_src(route.depth())
        );
        match insert_script_tag(&html, &tag) {
            Some(patched) => {
                fs::write(&path, patched).map_err(io_error(&path))?;
                report.injected.push(route);
            }
            None => {
                println!(
                    "cargo:warning=no {HEAD_CLOSE} in '{}', guard script not added",
                    path.display()
                );
                report.missing_head.push(route);
            }
        }
    }

    Ok(report)
}

/// Insert `tag` into the `<head>` of `html`.
///
/// The tag goes right after the last script inside the head, or just before
/// `</head>` when the head has no scripts. Returns `None` when there is no
/// `</head>`.
fn insert_script_tag(html: &str, tag: &str) -> Option<String> {
    let head_close = html.find(HEAD_CLOSE)?;
    let head = &html[..head_close];

    let insert_at = head
        .rfind(SCRIPT_OPEN)
        .and_then(|open| head[open..].find(SCRIPT_CLOSE).map(|close| open + close + SCRIPT_CLOSE.len()))
        .unwrap_or(head_close);

    let mut patched = String::with_capacity(html.len() + tag.len() + 5);
    patched.push_str(&html[..insert_at]);
    patched.push_str("\n    ");
    patched.push_str(tag);
    patched.push_str(&html[insert_at..]);
    Some(patched)
}
