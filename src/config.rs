//! Site configuration module.
//!
//! Loads `site.toml` from the project root, merges it over the stock
//! defaults, validates it, and turns it into a [`Site`].
//!
//! ## Configuration Options
//!
//! ```toml
//! index_file = "index.html"       # Appended to "" and "dir/" paths (no default)
//! template_dirs = ["templates"]   # Searched in order, first match wins
//!
//! # Manifest entries: [path, view, {kwargs}?]
//! files = [
//!   ["", "template", { template = "hello.html", message = "Hello" }],
//!   ["hello.css", "static_file", { path = "static/hello.css" }],
//! ]
//!
//! [[directories]]                 # Bulk ingestion, appended after `files`
//! base = "assets"                 # Served prefix
//! source = "static"               # Directory to walk, relative to the root
//! strip = 0                       # Leading path components to drop
//!
//! [serve]
//! bind = "127.0.0.1:8000"
//!
//! [generate]
//! output = "out"
//! ```
//!
//! ## Partial Configuration
//!
//! Only `files` is needed in practice; everything else has a default:
//!
//! ```toml
//! index_file = "index.html"
//! files = [["", "text", { content = "Hello" }]]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::builtin::{IngestError, ViewRegistry, files_from_dir};
use crate::manifest::{Entry, Manifest, ManifestError};
use crate::site::Site;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the project root.
pub const CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} not found (`viewgen gen-config > site.toml` writes a starting point)", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("files: {0}")]
    Manifest(#[from] ManifestError),
    #[error("kwargs conversion error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("directories: {0}")]
    Ingest(#[from] IngestError),
}

/// Site configuration loaded from `site.toml`.
///
/// `files` is kept as raw TOML so entry errors can name the offending index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Appended to directory-like paths. Without it, such paths are an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_file: Option<String>,
    /// Template search path, relative to the root, highest priority first.
    pub template_dirs: Vec<String>,
    /// Manifest entries as `[path, view, {kwargs}?]` arrays.
    pub files: Vec<toml::Value>,
    /// Directories ingested as `static_file` entries.
    pub directories: Vec<DirectoryConfig>,
    pub serve: ServeConfig,
    pub generate: GenerateConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_file: None,
            template_dirs: vec!["templates".to_string()],
            files: Vec::new(),
            directories: Vec::new(),
            serve: ServeConfig::default(),
            generate: GenerateConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(index_file) = &self.index_file {
            if index_file.is_empty() {
                return Err(ConfigError::Validation(
                    "index_file must not be empty".into(),
                ));
            }
            if index_file.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "index_file must be a file name, not a path: {index_file:?}"
                )));
            }
        }
        self.serve.bind_addr()?;
        if self.generate.output.is_empty() {
            return Err(ConfigError::Validation(
                "generate.output must not be empty".into(),
            ));
        }
        if let Some(dir) = self.directories.iter().find(|d| d.source.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "directories: source must not be empty (base {:?})",
                dir.base
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Served path prefix; empty serves at the top level.
    #[serde(default)]
    pub base: String,
    /// Directory to walk, relative to the root.
    pub source: String,
    /// Leading components of each relative path to drop.
    #[serde(default)]
    pub strip: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub bind: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

impl ServeConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "serve.bind must be a socket address like 127.0.0.1:8000, got {:?}",
                self.bind
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Output directory, relative to the root.
    pub output: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output: "out".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `site.toml` from `root` as a raw TOML value.
///
/// A missing file is an error: a site without a manifest has nothing to do.
pub fn load_raw_config(root: &Path) -> Result<toml::Value, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Err(ConfigError::NotFound(config_path));
    }
    let content = fs::read_to_string(&config_path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an overlay onto a base value, then deserialize and validate.
pub fn resolve_config(base: toml::Value, overlay: toml::Value) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = merge_toml(base, overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `site.toml` from the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value()?, load_raw_config(root)?)
}

// =============================================================================
// Manifest and site construction
// =============================================================================

/// Turn one `files` item into a manifest entry, resolving the view by name.
pub fn parse_entry(
    index: usize,
    item: &toml::Value,
    registry: &ViewRegistry,
) -> Result<Entry, ConfigError> {
    let toml::Value::Array(parts) = item else {
        return Err(ManifestError::NotATuple {
            index,
            found: toml_kind(item).to_string(),
        }
        .into());
    };
    if !(2..=3).contains(&parts.len()) {
        return Err(ManifestError::Arity {
            index,
            len: parts.len(),
        }
        .into());
    }

    let toml::Value::String(path) = &parts[0] else {
        return Err(ManifestError::PathNotString {
            index,
            found: toml_kind(&parts[0]).to_string(),
        }
        .into());
    };
    let view = match &parts[1] {
        toml::Value::String(name) => registry.get(name).ok_or_else(|| {
            ManifestError::ViewNotCallable {
                index,
                path: path.clone(),
                found: format!("unknown view {name:?} (known: {})", registry.names().join(", ")),
            }
        })?,
        other => {
            return Err(ManifestError::ViewNotCallable {
                index,
                path: path.clone(),
                found: toml_kind(other).to_string(),
            }
            .into());
        }
    };

    Ok(match parts.get(2) {
        None => Entry::Pair(path.clone(), view),
        Some(kwargs) => Entry::Triple(path.clone(), view, serde_json::to_value(kwargs)?),
    })
}

/// Build the manifest: `files` in order, then each of `directories`.
///
/// `root` should already be absolute so ingested paths stay valid when the
/// site root is applied to them.
pub fn build_manifest(
    config: &SiteConfig,
    root: &Path,
    registry: &ViewRegistry,
) -> Result<Manifest, ConfigError> {
    let entries = config
        .files
        .iter()
        .enumerate()
        .map(|(index, item)| parse_entry(index, item, registry))
        .collect::<Result<Vec<_>, _>>()?;
    let mut manifest = Manifest::from_entries(entries)?;

    for dir in &config.directories {
        let ingested = files_from_dir(&dir.base, &root.join(&dir.source), dir.strip)?;
        tracing::debug!(source = %dir.source, files = ingested.len(), "ingested directory");
        manifest.merge(ingested)?;
    }
    Ok(manifest)
}

/// Build a ready-to-render site from a loaded config.
pub fn build_site(
    config: &SiteConfig,
    root: &Path,
    registry: &ViewRegistry,
) -> Result<Site, ConfigError> {
    let root = fs::canonicalize(root)?;
    let manifest = build_manifest(config, &root, registry)?;
    let template_dirs: Vec<PathBuf> = config.template_dirs.iter().map(|d| root.join(d)).collect();

    let site = Site::new(manifest)
        .with_root(&root)
        .with_template_dirs(template_dirs);
    Ok(match &config.index_file {
        Some(index_file) => site.with_index_file(index_file),
        None => site,
    })
}

fn toml_kind(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "a string",
        toml::Value::Integer(_) => "an integer",
        toml::Value::Float(_) => "a float",
        toml::Value::Boolean(_) => "a boolean",
        toml::Value::Datetime(_) => "a datetime",
        toml::Value::Array(_) => "an array",
        toml::Value::Table(_) => "a table",
    }
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command. Parsing it yields the defaults.
pub fn stock_config_toml() -> &'static str {
    r##"# viewgen site configuration
# ===========================
# Every setting except `files` is optional. Values shown are the defaults.
# Unknown keys will cause an error.
# Post-render hooks are registered in Rust with Site::add_hook, not here.

# File name appended to directory-like paths ("" and "docs/").
# Without it, such paths are rejected when serving or generating.
# index_file = "index.html"

# Template directories, relative to this file, searched in order.
# A template in an earlier directory shadows one with the same name later.
template_dirs = ["templates"]

# ---------------------------------------------------------------------------
# Manifest
# ---------------------------------------------------------------------------
# Each entry is [path, view] or [path, view, { keyword arguments }].
# Paths must not start with "/". Built-in views:
#   text         { content = "..." }
#   static_file  { path = "static/site.css" }
#   template     { template = "page.html", any = "other", vars = "..." }
#   markdown     { source = "about.md", title = "...", stylesheet = "/site.css",
#                  standalone = true }
#
# files = [
#   ["", "template", { template = "hello.html", message = "Hello" }],
#   ["hello.css", "static_file", { path = "static/hello.css" }],
# ]
files = []

# Serve every file under a directory as static_file entries.
# [[directories]]
# base = "assets"      # served prefix
# source = "static"    # directory to walk
# strip = 0            # leading path components to drop

# ---------------------------------------------------------------------------
# serve
# ---------------------------------------------------------------------------
[serve]
# Address the preview server listens on.
bind = "127.0.0.1:8000"

# ---------------------------------------------------------------------------
# generate
# ---------------------------------------------------------------------------
[generate]
# Output directory. Its contents are replaced on every run.
output = "out"
"##
}
