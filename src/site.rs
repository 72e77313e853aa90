//! A site: the manifest plus everything a render needs.
//!
//! [`Site::render`] is the only code path that turns a [`Filespec`] into
//! bytes. The generator and the HTTP adapter both go through it, so a page
//! served live is byte-for-byte what generation would write.
//!
//! ## Pipeline
//!
//! ```text
//! Filespec ──► RenderContext ──► View::render ──► ViewOutput
//!                                                    │ normalize
//!                                                    ▼
//!                                   bytes ──► Hooks::apply ──► bytes
//! ```

use crate::context::{Mode, RenderContext};
use crate::filespec::Filespec;
use crate::hooks::{HookError, HookFailure, HookFn, HookName, Hooks};
use crate::manifest::{CompletionError, Manifest};
use crate::templates::Templates;
use crate::view::{ViewError, ViewOutput};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("view {view:?} failed for {path:?}: {source}")]
    View {
        view: String,
        path: String,
        #[source]
        source: ViewError,
    },
    #[error("reading output of view {view:?} for {path:?}: {source}")]
    Read {
        view: String,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{hook} failed for {realpath:?}: {source}")]
    Hook {
        hook: HookName,
        realpath: String,
        #[source]
        source: HookFailure,
    },
}

#[derive(Debug)]
pub struct Site {
    manifest: Manifest,
    index_file: Option<String>,
    root: PathBuf,
    templates: Templates,
    hooks: Hooks,
}

impl Site {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            index_file: None,
            root: PathBuf::from("."),
            templates: Templates::default(),
            hooks: Hooks::new(),
        }
    }

    pub fn with_index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = Some(index_file.into());
        self
    }

    /// Directory that relative file arguments of built-in views resolve against.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Template search path, highest priority first.
    pub fn with_template_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.templates = Templates::new(dirs);
        self
    }

    /// Register a hook by name. Unknown names and second registrations are
    /// rejected.
    pub fn add_hook(&mut self, name: &str, func: HookFn) -> Result<(), HookError> {
        self.hooks.register_named(name, func)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }

    pub fn index_file(&self) -> Option<&str> {
        self.index_file.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Complete the manifest in place against the configured index file.
    ///
    /// On error the manifest is left untouched.
    pub fn complete(&mut self) -> Result<(), CompletionError> {
        self.manifest = self.manifest.complete(self.index_file())?;
        Ok(())
    }

    /// Render one filespec to bytes.
    pub fn render(&self, filespec: &Filespec, mode: Mode) -> Result<Vec<u8>, RenderError> {
        let context = RenderContext::new(self, mode, filespec);
        let view_error = |source| RenderError::View {
            view: filespec.view_name().to_string(),
            path: filespec.path().to_string(),
            source,
        };

        let output = filespec
            .view()
            .render(&context, filespec.kwargs())
            .map_err(view_error)?;

        let data = match output {
            ViewOutput::Text(text) => text.into_bytes(),
            ViewOutput::Bytes(bytes) => bytes,
            ViewOutput::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .map_err(|source| RenderError::Read {
                        view: filespec.view_name().to_string(),
                        path: filespec.path().to_string(),
                        source,
                    })?;
                buf
            }
        };

        self.hooks.apply(&context, data)
    }
}
