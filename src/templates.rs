//! Cached template environment.
//!
//! Building a [`Tera`] instance means walking every template directory and
//! parsing every file, so it is done once per [`Site`](crate::site::Site),
//! on first use, under a lock. Later renders share the same environment
//! through an `Arc`.
//!
//! ## Lookup order
//!
//! Directories are searched in the order given. When two directories contain
//! a template with the same relative name, the earlier directory wins:
//!
//! ```text
//! site/templates/base.html      ← used
//! theme/templates/base.html     ← shadowed
//! theme/templates/post.html     ← used (no override)
//! ```
//!
//! Template names are paths relative to their directory, with `/` separators.
//! Missing directories are skipped.
//!
//! ## Unusable files
//!
//! A file that is not UTF-8 (an image, `.DS_Store`) is skipped with a
//! warning. A template that fails to parse, or extends or imports one that
//! is missing, is remembered by name: rendering it returns
//! [`TemplateError::Broken`] and every other template keeps working.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tera::{ErrorKind, Template, Tera};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("walking template directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("template path is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),
    #[error("loading templates: {0}")]
    Load(String),
    #[error("template {name:?} could not be loaded: {message}")]
    Broken { name: String, message: String },
    #[error("rendering template {name:?}: {message}")]
    Render { name: String, message: String },
}

/// A built template environment.
///
/// Templates that failed to read or parse are kept out of the [`Tera`]
/// instance and remembered by name, so only rendering them fails.
pub struct Environment {
    tera: Tera,
    broken: BTreeMap<String, String>,
}

impl Environment {
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Load failures by template name.
    pub fn broken(&self) -> &BTreeMap<String, String> {
        &self.broken
    }

    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, TemplateError> {
        if let Some(message) = self.broken.get(name) {
            return Err(TemplateError::Broken {
                name: name.to_string(),
                message: message.clone(),
            });
        }
        self.tera
            .render(name, context)
            .map_err(|err| TemplateError::Render {
                name: name.to_string(),
                message: describe(&err),
            })
    }
}

pub struct Templates {
    dirs: Vec<PathBuf>,
    env: Mutex<Option<Arc<Environment>>>,
}

impl Templates {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: dirs.into_iter().collect(),
            env: Mutex::new(None),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// The shared environment, built on first call.
    ///
    /// A failed build is not cached; the next call tries again.
    pub fn environment(&self) -> Result<Arc<Environment>, TemplateError> {
        let mut slot = self.env.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(env) = slot.as_ref() {
            return Ok(Arc::clone(env));
        }
        let env = Arc::new(load(&self.dirs)?);
        tracing::debug!(
            templates = env.tera.get_template_names().count(),
            broken = env.broken.len(),
            "template environment built"
        );
        *slot = Some(Arc::clone(&env));
        Ok(env)
    }

    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, TemplateError> {
        self.environment()?.render(name, context)
    }

    /// Whether the environment has been built yet.
    pub fn is_loaded(&self) -> bool {
        self.env
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("dirs", &self.dirs)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn load(dirs: &[PathBuf]) -> Result<Environment, TemplateError> {
    let mut seen = HashSet::new();
    let mut sources = BTreeMap::new();
    let mut parsed = BTreeMap::new();
    let mut broken = BTreeMap::new();

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = template_name(dir, entry.path())?;
            // first directory wins, even when its copy is unusable
            if !seen.insert(name.clone()) {
                continue;
            }
            let source = match fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(template = %name, error = %err, "template unreadable");
                    broken.insert(name, err.to_string());
                    continue;
                }
            };
            let Ok(source) = String::from_utf8(source) else {
                warn!(path = %entry.path().display(), "skipping non-UTF-8 file in template directory");
                continue;
            };
            let path = entry.path().to_string_lossy().into_owned();
            match Template::new(&name, Some(path), &source) {
                Ok(template) => {
                    parsed.insert(name.clone(), template);
                    sources.insert(name, source);
                }
                Err(err) => {
                    let message = describe(&err);
                    warn!(template = %name, error = %message, "template failed to parse");
                    broken.insert(name, message);
                }
            }
        }
    }

    drop_missing_dependencies(&mut sources, &parsed, &mut broken);

    loop {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        let err = match tera.add_raw_templates(sources.iter()) {
            Ok(()) => return Ok(Environment { tera, broken }),
            Err(err) => err,
        };
        let culprit = match &err.kind {
            ErrorKind::CircularExtend { tpl, .. } => tpl.clone(),
            ErrorKind::MissingParent { current, .. } => current.clone(),
            _ => return Err(TemplateError::Load(describe(&err))),
        };
        if sources.remove(&culprit).is_none() {
            return Err(TemplateError::Load(describe(&err)));
        }
        let message = describe(&err);
        warn!(template = %culprit, error = %message, "template failed to load");
        broken.insert(culprit, message);
    }
}

/// Remove templates whose parent or macro files are not loadable, repeating
/// until every remaining dependency resolves.
fn drop_missing_dependencies(
    sources: &mut BTreeMap<String, String>,
    parsed: &BTreeMap<String, Template>,
    broken: &mut BTreeMap<String, String>,
) {
    loop {
        let mut dropped = Vec::new();
        for name in sources.keys() {
            let template = &parsed[name];
            let missing = template
                .parent
                .iter()
                .chain(template.imported_macro_files.iter().map(|(file, _)| file))
                .find(|dep| !sources.contains_key(dep.as_str()));
            if let Some(dep) = missing {
                dropped.push((name.clone(), dep.clone()));
            }
        }
        if dropped.is_empty() {
            return;
        }
        for (name, dep) in dropped {
            let message = format!("depends on {dep:?}, which is missing or broken");
            warn!(template = %name, error = %message, "template failed to load");
            sources.remove(&name);
            broken.insert(name, message);
        }
    }
}

fn template_name(dir: &Path, path: &Path) -> Result<String, TemplateError> {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    parts
        .map(|parts| parts.join("/"))
        .ok_or_else(|| TemplateError::NonUtf8Name(path.to_path_buf()))
}

/// Flatten a tera error and its causes into one line.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
