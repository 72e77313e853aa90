//! Stock views and directory ingestion.
//!
//! | Name | Arguments | Output |
//! |------|-----------|--------|
//! | `text` | `content` | the text as given |
//! | `static_file` | `path` | the file's bytes, read through [`ViewOutput::Reader`] |
//! | `template` | `template`, any other variables | a rendered template |
//! | `markdown` | `source`, `title?`, `stylesheet?`, `standalone?` | Markdown as HTML |
//!
//! Relative file arguments resolve against the site root. Configuration
//! refers to views by name through a [`ViewRegistry`]; library users can
//! register their own.

use crate::context::RenderContext;
use crate::filespec::{Filespec, Kwargs};
use crate::manifest::{Manifest, ManifestError};
use crate::view::{View, ViewError, ViewOutput};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

// ============================================================================
// Registry
// ============================================================================

/// Views addressable by name from `site.toml`.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: BTreeMap<String, Arc<dyn View>>,
}

impl ViewRegistry {
    /// A registry holding the stock views.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(Text));
        registry.register(static_file());
        registry.register(Arc::new(Template));
        registry.register(Arc::new(Markdown));
        registry
    }

    /// Add a view under its own name, returning any view it replaces.
    pub fn register(&mut self, view: Arc<dyn View>) -> Option<Arc<dyn View>> {
        self.views.insert(view.name().to_string(), view)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn View>> {
        self.views.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.views.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.views.keys()).finish()
    }
}

// ============================================================================
// Views
// ============================================================================

struct Text;

impl View for Text {
    fn name(&self) -> &str {
        "text"
    }

    fn render(&self, _: &RenderContext<'_>, kwargs: &Kwargs) -> Result<ViewOutput, ViewError> {
        Ok(ViewOutput::from(required_str(kwargs, "content")?))
    }
}

struct StaticFile;

/// The `static_file` view.
pub fn static_file() -> Arc<dyn View> {
    Arc::new(StaticFile)
}

impl View for StaticFile {
    fn name(&self) -> &str {
        "static_file"
    }

    fn render(&self, context: &RenderContext<'_>, kwargs: &Kwargs) -> Result<ViewOutput, ViewError> {
        let path = context.root().join(required_str(kwargs, "path")?);
        let file = File::open(&path).map_err(|err| {
            ViewError::Other(format!("opening {}: {err}", path.display()))
        })?;
        Ok(ViewOutput::reader(file))
    }
}

struct Template;

impl View for Template {
    fn name(&self) -> &str {
        "template"
    }

    fn render(&self, context: &RenderContext<'_>, kwargs: &Kwargs) -> Result<ViewOutput, ViewError> {
        let name = required_str(kwargs, "template")?;
        let vars: Kwargs = kwargs
            .iter()
            .filter(|(key, _)| key.as_str() != "template")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(context.render_template(name, &vars)?.into())
    }
}

struct Markdown;

impl View for Markdown {
    fn name(&self) -> &str {
        "markdown"
    }

    fn render(&self, context: &RenderContext<'_>, kwargs: &Kwargs) -> Result<ViewOutput, ViewError> {
        let source_path = context.root().join(required_str(kwargs, "source")?);
        let source = fs::read_to_string(&source_path).map_err(|err| {
            ViewError::Other(format!("reading {}: {err}", source_path.display()))
        })?;
        let body = markdown_to_html(&source);

        if !optional_bool(kwargs, "standalone")?.unwrap_or(true) {
            return Ok(body.into());
        }

        let title = match optional_str(kwargs, "title")? {
            Some(title) => title.to_string(),
            None => first_heading(&source).unwrap_or_else(|| context.realpath().to_string()),
        };
        let stylesheet = optional_str(kwargs, "stylesheet")?;
        Ok(markdown_document(&title, stylesheet, &body).into_string().into())
    }
}

fn markdown_to_html(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new_ext(source, options));
    out
}

/// Text of the first level-one ATX heading.
fn first_heading(source: &str) -> Option<String> {
    source
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

fn markdown_document(title: &str, stylesheet: Option<&str>, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if let Some(href) = stylesheet {
                    link rel="stylesheet" href=(href);
                }
            }
            body {
                main {
                    article { (PreEscaped(body)) }
                }
            }
        }
    }
}

// ============================================================================
// Argument access
// ============================================================================

fn required_str<'a>(kwargs: &'a Kwargs, name: &str) -> Result<&'a str, ViewError> {
    optional_str(kwargs, name)?.ok_or_else(|| ViewError::MissingArgument(name.to_string()))
}

fn optional_str<'a>(kwargs: &'a Kwargs, name: &str) -> Result<Option<&'a str>, ViewError> {
    match kwargs.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ViewError::InvalidArgument {
            name: name.to_string(),
            expected: "a string",
        }),
    }
}

fn optional_bool(kwargs: &Kwargs, name: &str) -> Result<Option<bool>, ViewError> {
    match kwargs.get(name) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ViewError::InvalidArgument {
            name: name.to_string(),
            expected: "a boolean",
        }),
    }
}

// ============================================================================
// Directory ingestion
// ============================================================================

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("walking {}: {source}", dir.display())]
    Walk {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// One `static_file` entry per regular file under `dir`, in sorted order.
///
/// The served path is `base` joined with the file's path relative to `dir`,
/// minus its first `strip` components. Files left with no path are skipped.
///
/// ```text
/// files_from_dir("assets", "static", 1)
///   static/v1/app.css  → assets/app.css
///   static/v1/img/a.png → assets/img/a.png
///   static/top.txt     → (skipped)
/// ```
pub fn files_from_dir(base: &str, dir: &Path, strip: usize) -> Result<Manifest, IngestError> {
    let view = static_file();
    let mut manifest = Manifest::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| IngestError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let parts = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<&str>>>()
            .ok_or_else(|| IngestError::NonUtf8Path(entry.path().to_path_buf()))?;
        let Some(served) = served_path(base, &parts, strip) else {
            continue;
        };
        let source = entry
            .path()
            .to_str()
            .ok_or_else(|| IngestError::NonUtf8Path(entry.path().to_path_buf()))?;

        let mut kwargs = Kwargs::new();
        kwargs.insert("path".into(), Value::String(source.to_string()));
        let index = manifest.len();
        let spec = Filespec::with_kwargs(served, Arc::clone(&view), kwargs)
            .map_err(|source| ManifestError::Filespec { index, source })?;
        manifest.push(spec)?;
    }

    Ok(manifest)
}

fn served_path(base: &str, parts: &[&str], strip: usize) -> Option<String> {
    let kept = parts.get(strip..).filter(|kept| !kept.is_empty())?;
    let name = kept.join("/");
    if base.is_empty() {
        Some(name)
    } else if base.ends_with('/') {
        Some(format!("{base}{name}"))
    } else {
        Some(format!("{base}/{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Mode;
    use crate::site::Site;
    use crate::test_helpers::template_dir;
    use serde_json::json;
    use tempfile::TempDir;

    fn render_in(site: &Site, view: &str, kwargs: Value) -> Result<Vec<u8>, crate::site::RenderError> {
        let registry = ViewRegistry::builtin();
        let spec = Filespec::from_value("page.html", registry.get(view).unwrap(), kwargs).unwrap();
        site.render(&spec, Mode::Generating)
    }

    fn site_at(root: &Path) -> Site {
        Site::new(Manifest::new()).with_root(root)
    }

    // =========================================================================
    // Registry
    // =========================================================================

    #[test]
    fn builtin_names() {
        let registry = ViewRegistry::builtin();
        assert_eq!(registry.names(), vec!["markdown", "static_file", "template", "text"]);
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn register_replaces_by_name() {
        let mut registry = ViewRegistry::builtin();
        let custom = crate::view::view_fn("text", |_, _| Ok("custom".into()));
        assert!(registry.register(custom).is_some());
        assert_eq!(registry.names().len(), 4);
    }

    // =========================================================================
    // Views
    // =========================================================================

    #[test]
    fn text_view() {
        let site = Site::new(Manifest::new());
        let out = render_in(&site, "text", json!({"content": "hello"})).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn text_view_requires_content() {
        let site = Site::new(Manifest::new());
        let err = render_in(&site, "text", json!({})).unwrap_err();
        assert!(err.to_string().contains("missing argument `content`"));
    }

    #[test]
    fn static_file_resolves_against_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("static")).unwrap();
        fs::write(tmp.path().join("static/hello.css"), "body {}").unwrap();
        let out = render_in(&site_at(tmp.path()), "static_file", json!({"path": "static/hello.css"}))
            .unwrap();
        assert_eq!(out, b"body {}");
    }

    #[test]
    fn static_file_missing_names_path() {
        let tmp = TempDir::new().unwrap();
        let err = render_in(&site_at(tmp.path()), "static_file", json!({"path": "gone.txt"}))
            .unwrap_err();
        assert!(err.to_string().contains("gone.txt"));
    }

    #[test]
    fn static_file_rejects_non_string_path() {
        let site = Site::new(Manifest::new());
        let err = render_in(&site, "static_file", json!({"path": 3})).unwrap_err();
        assert!(err.to_string().contains("argument `path` must be a string"));
    }

    #[test]
    fn template_view_passes_other_kwargs() {
        let tmp = template_dir(&[("hello.html", "{{ message }} from {{ realpath }}")]);
        let site = Site::new(Manifest::new()).with_template_dirs([tmp.path().to_path_buf()]);
        let out = render_in(
            &site,
            "template",
            json!({"template": "hello.html", "message": "Hello"}),
        )
        .unwrap();
        assert_eq!(out, b"Hello from page.html");
    }

    #[test]
    fn markdown_view_wraps_document() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("about.md"), "# About\n\nSome *words*.").unwrap();
        let out = render_in(
            &site_at(tmp.path()),
            "markdown",
            json!({"source": "about.md", "stylesheet": "/site.css"}),
        )
        .unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>About</title>"));
        assert!(html.contains(r#"<link rel="stylesheet" href="/site.css">"#));
        assert!(html.contains("<em>words</em>"));
    }

    #[test]
    fn markdown_view_fragment() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("part.md"), "hello **there**").unwrap();
        let out = render_in(
            &site_at(tmp.path()),
            "markdown",
            json!({"source": "part.md", "standalone": false}),
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "<p>hello <strong>there</strong></p>");
    }

    #[test]
    fn markdown_title_escaped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("x.md"), "text").unwrap();
        let out = render_in(
            &site_at(tmp.path()),
            "markdown",
            json!({"source": "x.md", "title": "<script>"}),
        )
        .unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("<title>&lt;script&gt;</title>"));
    }

    #[test]
    fn first_heading_ignores_lower_levels() {
        assert_eq!(first_heading("## Sub\n# Main\n"), Some("Main".to_string()));
        assert_eq!(first_heading("no heading"), None);
    }

    // =========================================================================
    // Directory ingestion
    // =========================================================================

    fn asset_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("v1/img")).unwrap();
        fs::write(tmp.path().join("top.txt"), "top").unwrap();
        fs::write(tmp.path().join("v1/app.css"), "css").unwrap();
        fs::write(tmp.path().join("v1/img/a.png"), "png").unwrap();
        tmp
    }

    #[test]
    fn files_from_dir_keeps_relative_paths() {
        let tmp = asset_tree();
        let manifest = files_from_dir("assets", tmp.path(), 0).unwrap();
        let paths: Vec<&str> = manifest.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["assets/top.txt", "assets/v1/app.css", "assets/v1/img/a.png"]);
        assert!(manifest.iter().all(|f| f.view_name() == "static_file"));
    }

    #[test]
    fn files_from_dir_strips_components() {
        let tmp = asset_tree();
        let manifest = files_from_dir("", tmp.path(), 1).unwrap();
        let paths: Vec<&str> = manifest.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["app.css", "img/a.png"]);
    }

    #[test]
    fn files_from_dir_entries_render_file_contents() {
        let tmp = asset_tree();
        let manifest = files_from_dir("static/", tmp.path(), 0).unwrap();
        let site = Site::new(Manifest::new());
        let css = manifest.find("static/v1/app.css").unwrap();
        assert_eq!(site.render(css, Mode::Serving).unwrap(), b"css");
    }

    #[test]
    fn files_from_dir_rejects_absolute_base() {
        let tmp = asset_tree();
        let err = files_from_dir("/assets", tmp.path(), 0).unwrap_err();
        assert!(matches!(err, IngestError::Manifest(ManifestError::Filespec { index: 0, .. })));
    }

    #[test]
    fn files_from_dir_missing_directory() {
        let err = files_from_dir("", Path::new("/nonexistent/viewgen/static"), 0).unwrap_err();
        assert!(matches!(err, IngestError::Walk { .. }));
    }
}
