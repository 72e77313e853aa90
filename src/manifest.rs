//! The ordered collection of filespecs.
//!
//! Order matters: the HTTP adapter serves the *first* entry whose real path
//! matches, and the generator writes entries in order so a later entry
//! overwrites an earlier one with the same real path.
//!
//! Every way of adding to a manifest goes through the same validation, so a
//! `Manifest` only ever holds valid [`Filespec`]s. Inputs are described by
//! [`Entry`]:
//!
//! ```rust
//! use viewgen::manifest::{Entry, Manifest};
//! use viewgen::view::{ViewOutput, view_fn};
//! use serde_json::json;
//!
//! let hello = view_fn("hello", |_, _| Ok(ViewOutput::from("Hello")));
//! let mut manifest = Manifest::from_entries([
//!     Entry::from(("", hello.clone())),
//!     Entry::from(("greeting.html", hello.clone(), json!({"message": "Hi"}))),
//! ])
//! .unwrap();
//! manifest.push(("other.txt", hello)).unwrap();
//! assert_eq!(manifest.len(), 3);
//! ```

use crate::filespec::{Filespec, FilespecError};
use crate::view::View;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("entry {index}: {source}")]
    Filespec {
        index: usize,
        #[source]
        source: FilespecError,
    },
    #[error("entry {index}: expected a filespec or a (path, view[, kwargs]) tuple, got {found}")]
    NotATuple { index: usize, found: String },
    #[error("entry {index}: expected a tuple of the form (path, view[, kwargs]), got {len} elements")]
    Arity { index: usize, len: usize },
    #[error("entry {index}: path must be a string, not {found}")]
    PathNotString { index: usize, found: String },
    #[error("entry {index} ({path:?}): view must name a registered view, got {found}")]
    ViewNotCallable {
        index: usize,
        path: String,
        found: String,
    },
    #[error("entry {index}: out of bounds for a manifest of {len} entries")]
    OutOfBounds { index: usize, len: usize },
}

impl ManifestError {
    /// Position of the offending entry.
    pub fn index(&self) -> usize {
        match self {
            ManifestError::Filespec { index, .. }
            | ManifestError::NotATuple { index, .. }
            | ManifestError::Arity { index, .. }
            | ManifestError::PathNotString { index, .. }
            | ManifestError::ViewNotCallable { index, .. }
            | ManifestError::OutOfBounds { index, .. } => *index,
        }
    }
}

/// Raised when directory-like entries remain and no index file is configured.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("incomplete files and no index file configured: {}", quote_all(.paths))]
pub struct CompletionError {
    pub paths: Vec<String>,
}

fn quote_all(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!("{p:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One item accepted by manifest construction and merge operations.
pub enum Entry {
    /// `(path, view)`
    Pair(String, Arc<dyn View>),
    /// `(path, view, kwargs)`; kwargs must be a JSON object.
    Triple(String, Arc<dyn View>, Value),
    /// An already-built filespec.
    Filespec(Filespec),
    /// Another manifest, flattened in place.
    Manifest(Manifest),
}

impl<P: Into<String>> From<(P, Arc<dyn View>)> for Entry {
    fn from((path, view): (P, Arc<dyn View>)) -> Self {
        Entry::Pair(path.into(), view)
    }
}

impl<P: Into<String>> From<(P, Arc<dyn View>, Value)> for Entry {
    fn from((path, view, kwargs): (P, Arc<dyn View>, Value)) -> Self {
        Entry::Triple(path.into(), view, kwargs)
    }
}

impl From<Filespec> for Entry {
    fn from(spec: Filespec) -> Self {
        Entry::Filespec(spec)
    }
}

impl From<Manifest> for Entry {
    fn from(manifest: Manifest) -> Self {
        Entry::Manifest(manifest)
    }
}

/// Validate one entry, numbering its filespecs from `index`.
fn verify(entry: Entry, index: usize) -> Result<Vec<Filespec>, ManifestError> {
    let wrap = |source| ManifestError::Filespec { index, source };
    match entry {
        Entry::Pair(path, view) => Ok(vec![Filespec::new(path, view).map_err(wrap)?]),
        Entry::Triple(path, view, kwargs) => {
            Ok(vec![Filespec::from_value(path, view, kwargs).map_err(wrap)?])
        }
        Entry::Filespec(spec) => Ok(vec![spec]),
        Entry::Manifest(manifest) => Ok(manifest.entries),
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
pub struct Manifest {
    entries: Vec<Filespec>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from entries, validating each one.
    pub fn from_entries<I>(items: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut manifest = Self::new();
        manifest.extend(items)?;
        Ok(manifest)
    }

    /// Append one entry (a nested manifest is flattened).
    pub fn push(&mut self, entry: impl Into<Entry>) -> Result<(), ManifestError> {
        let specs = verify(entry.into(), self.entries.len())?;
        self.entries.extend(specs);
        Ok(())
    }

    /// Append every entry in order; stops at the first invalid one.
    pub fn extend<I>(&mut self, items: I) -> Result<(), ManifestError>
    where
        I: IntoIterator<Item = Entry>,
    {
        for item in items {
            self.push(item)?;
        }
        Ok(())
    }

    /// Append all of `other`.
    pub fn merge(&mut self, other: Manifest) -> Result<(), ManifestError> {
        self.push(other)
    }

    /// Insert at `index`, shifting later entries.
    pub fn insert(&mut self, index: usize, entry: impl Into<Entry>) -> Result<(), ManifestError> {
        if index > self.entries.len() {
            return Err(ManifestError::OutOfBounds {
                index,
                len: self.entries.len(),
            });
        }
        let specs = verify(entry.into(), index)?;
        self.entries.splice(index..index, specs);
        Ok(())
    }

    /// Replace the entry at `index`.
    pub fn set(&mut self, index: usize, entry: impl Into<Entry>) -> Result<(), ManifestError> {
        if index >= self.entries.len() {
            return Err(ManifestError::OutOfBounds {
                index,
                len: self.entries.len(),
            });
        }
        let specs = verify(entry.into(), index)?;
        self.entries.splice(index..=index, specs);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Filespec> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Filespec> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filespec> {
        self.entries.iter()
    }

    /// First entry whose real path equals `realpath`.
    pub fn find(&self, realpath: &str) -> Option<&Filespec> {
        self.entries.iter().find(|spec| spec.realpath() == realpath)
    }

    /// Logical paths of the entries that still need an index file.
    pub fn incomplete_paths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|spec| spec.is_incomplete())
            .map(|spec| spec.path())
            .collect()
    }

    /// Return a completed copy of this manifest.
    ///
    /// With an index file every directory-like entry is resolved. Without
    /// one the manifest must already be complete; otherwise the error lists
    /// every incomplete path.
    pub fn complete(&self, index_file: Option<&str>) -> Result<Manifest, CompletionError> {
        match index_file {
            Some(index_file) => Ok(Manifest {
                entries: self
                    .entries
                    .iter()
                    .map(|spec| spec.complete(index_file))
                    .collect(),
            }),
            None => {
                let paths = self.incomplete_paths();
                if paths.is_empty() {
                    Ok(self.clone())
                } else {
                    Err(CompletionError {
                        paths: paths.into_iter().map(String::from).collect(),
                    })
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a Filespec;
    type IntoIter = std::slice::Iter<'a, Filespec>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
