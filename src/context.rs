//! Per-render context handed to views and hooks.

use crate::filespec::{Filespec, Kwargs};
use crate::site::Site;
use crate::templates::TemplateError;
use std::fmt;
use std::path::Path;

/// Which adapter is driving the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One-shot output to a directory tree.
    Generating,
    /// Live HTTP response.
    Serving,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Generating => f.write_str("generating"),
            Mode::Serving => f.write_str("serving"),
        }
    }
}

/// Created for a single render and dropped right after it.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    site: &'a Site,
    mode: Mode,
    path: &'a str,
    realpath: &'a str,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(site: &'a Site, mode: Mode, filespec: &'a Filespec) -> Self {
        Self {
            site,
            mode,
            path: filespec.path(),
            realpath: filespec.realpath(),
        }
    }

    pub fn site(&self) -> &'a Site {
        self.site
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn generating(&self) -> bool {
        self.mode == Mode::Generating
    }

    pub fn serving(&self) -> bool {
        self.mode == Mode::Serving
    }

    /// Logical path of the filespec being rendered.
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// Completed real path of the filespec being rendered.
    pub fn realpath(&self) -> &'a str {
        self.realpath
    }

    /// Directory that relative file arguments resolve against.
    pub fn root(&self) -> &'a Path {
        self.site.root()
    }

    /// Render a named template from the site's template environment.
    ///
    /// `generating`, `serving`, `path` and `realpath` are always defined;
    /// entries in `vars` with the same names take precedence.
    pub fn render_template(&self, name: &str, vars: &Kwargs) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("generating", &self.generating());
        context.insert("serving", &self.serving());
        context.insert("path", self.path);
        context.insert("realpath", self.realpath);
        for (key, value) in vars {
            context.insert(key.as_str(), value);
        }
        self.site.templates().render(name, &context)
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .field("realpath", &self.realpath)
            .finish()
    }
}
