//! Shared test utilities for the viewgen test suite.
//!
//! Provides stock views and filesystem fixtures:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = template_dir(&[("value.txt", "value is: {{ value }}")]);
//! let site = Site::new(Manifest::new()).with_template_dirs([tmp.path().to_path_buf()]);
//! let spec = Filespec::from_value("v", view_template("value.txt"), json!({"value": 1})).unwrap();
//! assert_eq!(site.render(&spec, Mode::Generating).unwrap(), b"value is: 1");
//! ```

use crate::view::{View, ViewOutput, view_fn};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// =========================================================================
// Views
// =========================================================================

/// A view named `value_returner` that returns `value` on every render.
pub fn view_value<T>(value: T) -> Arc<dyn View>
where
    T: Into<ViewOutput> + Clone + Send + Sync + 'static,
{
    view_fn("value_returner", move |_, _| Ok(value.clone().into()))
}

/// A view named `template_renderer` that renders `name` with its kwargs.
pub fn view_template(name: &'static str) -> Arc<dyn View> {
    view_fn("template_renderer", move |context, kwargs| {
        Ok(context.render_template(name, kwargs)?.into())
    })
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, contents)` pairs into a fresh temp directory.
pub fn template_dir(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, contents) in files {
        let path = tmp.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }
    tmp
}

/// Read a file, panicking with the path on failure.
pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|err| panic!("reading {}: {err}", path.display()))
}
