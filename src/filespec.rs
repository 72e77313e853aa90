//! The path-to-view binding.
//!
//! A [`Filespec`] ties a logical `path` to a [`View`] and its keyword
//! arguments. Its `realpath` is the key used for HTTP lookup and for the
//! output file name:
//!
//! ```text
//! path            index file     realpath
//! ""              index.html     index.html
//! "docs/"         index.html     docs/index.html
//! "about.html"    (any)          about.html
//! ```
//!
//! Completion never mutates: [`Filespec::complete`] returns a new value, so a
//! completed manifest can be shared between the generator and the server.

use crate::view::View;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// String-keyed keyword arguments passed to a view.
pub type Kwargs = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilespecError {
    #[error("{path:?}: path must not start with /")]
    LeadingSlash { path: String },
    #[error("{path:?}: kwargs must be a mapping, not {found}")]
    KwargsNotMapping { path: String, found: &'static str },
}

#[derive(Clone)]
pub struct Filespec {
    path: String,
    view: Arc<dyn View>,
    kwargs: Kwargs,
    realpath: String,
}

impl Filespec {
    /// Bind `path` to `view` with no keyword arguments.
    pub fn new(path: impl Into<String>, view: Arc<dyn View>) -> Result<Self, FilespecError> {
        Self::with_kwargs(path, view, Kwargs::new())
    }

    /// Bind `path` to `view` with keyword arguments.
    pub fn with_kwargs(
        path: impl Into<String>,
        view: Arc<dyn View>,
        kwargs: Kwargs,
    ) -> Result<Self, FilespecError> {
        let path = path.into();
        if path.starts_with('/') {
            return Err(FilespecError::LeadingSlash { path });
        }
        Ok(Self {
            realpath: path.clone(),
            path,
            view,
            kwargs,
        })
    }

    /// Like [`Filespec::with_kwargs`], but accepts any JSON value and rejects
    /// everything that is not an object.
    pub fn from_value(
        path: impl Into<String>,
        view: Arc<dyn View>,
        kwargs: Value,
    ) -> Result<Self, FilespecError> {
        let path = path.into();
        match kwargs {
            Value::Object(map) => Self::with_kwargs(path, view, map),
            other => {
                // a leading slash is reported before a bad kwargs value
                if path.starts_with('/') {
                    return Err(FilespecError::LeadingSlash { path });
                }
                Err(FilespecError::KwargsNotMapping {
                    path,
                    found: value_kind(&other),
                })
            }
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn view(&self) -> &Arc<dyn View> {
        &self.view
    }

    pub fn view_name(&self) -> &str {
        self.view.name()
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    /// The lookup/output key. Equal to `path` until completion resolves a
    /// directory-like path.
    pub fn realpath(&self) -> &str {
        &self.realpath
    }

    /// True when the real path is still empty or ends with `/`.
    pub fn is_incomplete(&self) -> bool {
        self.realpath.is_empty() || self.realpath.ends_with('/')
    }

    /// Resolve a directory-like path against `index_file`.
    ///
    /// Returns an unchanged copy when the filespec is already complete, so
    /// completing twice is the same as completing once.
    pub fn complete(&self, index_file: &str) -> Filespec {
        if !self.is_incomplete() {
            return self.clone();
        }
        Filespec {
            realpath: format!("{}{}", self.path, index_file),
            ..self.clone()
        }
    }
}

impl PartialEq for Filespec {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && same_view(&self.view, &other.view)
            && self.kwargs == other.kwargs
            && self.realpath == other.realpath
    }
}

impl fmt::Debug for Filespec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filespec")
            .field("path", &self.path)
            .field("view", &self.view.name())
            .field("kwargs", &self.kwargs)
            .field("realpath", &self.realpath)
            .finish()
    }
}

/// Identity comparison on the view allocation, ignoring vtable pointers.
fn same_view(a: &Arc<dyn View>, b: &Arc<dyn View>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Short type name of a JSON value, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::view_value;
    use serde_json::json;

    #[test]
    fn realpath_defaults_to_path() {
        let spec = Filespec::new("about.html", view_value("")).unwrap();
        assert_eq!(spec.realpath(), "about.html");
        assert!(!spec.is_incomplete());
    }

    #[test]
    fn empty_and_trailing_slash_paths_are_incomplete() {
        let view = view_value("");
        assert!(Filespec::new("", view.clone()).unwrap().is_incomplete());
        assert!(Filespec::new("jee/", view.clone()).unwrap().is_incomplete());
        assert!(Filespec::new("path/to/dir/", view).unwrap().is_incomplete());
    }

    #[test]
    fn complete_appends_index_file() {
        let view = view_value("");
        let root = Filespec::new("", view.clone()).unwrap().complete("index.html");
        assert_eq!(root.realpath(), "index.html");
        assert_eq!(root.path(), "");

        let dir = Filespec::new("docs/", view).unwrap().complete("index.html");
        assert_eq!(dir.realpath(), "docs/index.html");
        assert_eq!(dir.path(), "docs/");
    }

    #[test]
    fn complete_is_noop_for_file_paths() {
        let spec = Filespec::new("barfile.txt", view_value("")).unwrap();
        assert_eq!(spec.complete("index.html"), spec);
    }

    #[test]
    fn complete_is_idempotent() {
        let spec = Filespec::new("dir/", view_value("")).unwrap();
        let once = spec.complete("foofile.txt");
        let twice = once.complete("foofile.txt");
        assert_eq!(once, twice);
        assert_eq!(twice.realpath(), "dir/foofile.txt");
    }

    #[test]
    fn complete_does_not_touch_original() {
        let spec = Filespec::new("", view_value("")).unwrap();
        let _ = spec.complete("index.html");
        assert_eq!(spec.realpath(), "");
    }

    #[test]
    fn leading_slash_rejected() {
        let err = Filespec::new("/foo", view_value("")).unwrap_err();
        assert_eq!(err.to_string(), r#""/foo": path must not start with /"#);
    }

    #[test]
    fn kwargs_must_be_a_mapping() {
        let err = Filespec::from_value("foo", view_value(""), json!(1)).unwrap_err();
        assert_eq!(
            err,
            FilespecError::KwargsNotMapping {
                path: "foo".into(),
                found: "a number"
            }
        );
        assert_eq!(err.to_string(), r#""foo": kwargs must be a mapping, not a number"#);
    }

    #[test]
    fn from_value_accepts_objects() {
        let spec = Filespec::from_value("file2", view_value(""), json!({"foo": "bar"})).unwrap();
        assert_eq!(spec.kwargs().get("foo"), Some(&json!("bar")));
    }

    #[test]
    fn equality_compares_view_identity() {
        let a = view_value("x");
        let b = view_value("x");
        assert_eq!(
            Filespec::new("p", a.clone()).unwrap(),
            Filespec::new("p", a).unwrap()
        );
        assert_ne!(
            Filespec::new("p", view_value("x")).unwrap(),
            Filespec::new("p", b).unwrap()
        );
    }

    #[test]
    fn debug_shows_view_name() {
        let spec = Filespec::new("p", view_value("x")).unwrap();
        assert!(format!("{spec:?}").contains("value_returner"));
    }
}
