//! The view interface.
//!
//! A view is the rendering function bound to a [`Filespec`](crate::filespec::Filespec).
//! It receives the per-render [`RenderContext`] and the filespec's keyword
//! arguments, and returns one of three output shapes:
//!
//! | Variant | Normalization |
//! |---|---|
//! | [`ViewOutput::Text`] | UTF-8 encoded |
//! | [`ViewOutput::Bytes`] | passed through unchanged |
//! | [`ViewOutput::Reader`] | read to the end, bytes passed through |
//!
//! Anything a view cannot produce is reported through [`ViewError`]; there is
//! no "unsupported value" at runtime because the output type is closed.

use crate::context::RenderContext;
use crate::filespec::Kwargs;
use crate::templates::TemplateError;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("missing argument `{0}`")]
    MissingArgument(String),
    #[error("argument `{name}` must be {expected}")]
    InvalidArgument {
        name: String,
        expected: &'static str,
    },
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// What a view hands back to the renderer.
pub enum ViewOutput {
    Text(String),
    Bytes(Vec<u8>),
    /// Anything readable; the renderer reads it to the end.
    Reader(Box<dyn Read + Send>),
}

impl ViewOutput {
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        ViewOutput::Reader(Box::new(reader))
    }
}

impl fmt::Debug for ViewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewOutput::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ViewOutput::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            ViewOutput::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<String> for ViewOutput {
    fn from(text: String) -> Self {
        ViewOutput::Text(text)
    }
}

impl From<&str> for ViewOutput {
    fn from(text: &str) -> Self {
        ViewOutput::Text(text.to_string())
    }
}

impl From<Vec<u8>> for ViewOutput {
    fn from(bytes: Vec<u8>) -> Self {
        ViewOutput::Bytes(bytes)
    }
}

impl From<&[u8]> for ViewOutput {
    fn from(bytes: &[u8]) -> Self {
        ViewOutput::Bytes(bytes.to_vec())
    }
}

/// A rendering function bound to a manifest entry.
///
/// Implementations must be shareable across threads: the HTTP adapter keeps
/// the manifest behind an `Arc` for the lifetime of the server.
pub trait View: Send + Sync {
    /// Name used in error messages and CLI output.
    fn name(&self) -> &str;

    /// Render one file.
    fn render(&self, context: &RenderContext<'_>, kwargs: &Kwargs)
    -> Result<ViewOutput, ViewError>;
}

/// Adapter turning a closure into a named [`View`]. See [`view_fn`].
pub struct FnView<F> {
    name: String,
    func: F,
}

impl<F> View for FnView<F>
where
    F: Fn(&RenderContext<'_>, &Kwargs) -> Result<ViewOutput, ViewError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn render(
        &self,
        context: &RenderContext<'_>,
        kwargs: &Kwargs,
    ) -> Result<ViewOutput, ViewError> {
        (self.func)(context, kwargs)
    }
}

/// Wrap a closure as a shareable view.
///
/// ```rust
/// use viewgen::view::{View, ViewOutput, view_fn};
///
/// let hello = view_fn("hello", |_context, _kwargs| Ok(ViewOutput::from("Hello")));
/// assert_eq!(hello.name(), "hello");
/// ```
pub fn view_fn<F>(name: impl Into<String>, func: F) -> Arc<dyn View>
where
    F: Fn(&RenderContext<'_>, &Kwargs) -> Result<ViewOutput, ViewError> + Send + Sync + 'static,
{
    Arc::new(FnView {
        name: name.into(),
        func,
    })
}
