//! Static generation.
//!
//! Writes every manifest entry to a directory tree mirroring the completed
//! real paths:
//!
//! ```text
//! manifest                             out/
//! ""          → index.html             ├── index.html
//! "docs/"     → docs/index.html        ├── docs/
//! "style.css" → style.css              │   └── index.html
//!                                      └── style.css
//! ```
//!
//! ## Steps
//!
//! 1. Complete the manifest. If entries stay incomplete, nothing on disk is
//!    touched.
//! 2. Prepare the output directory: an existing directory is emptied (the
//!    directory itself is kept), a missing one is created, anything else is
//!    an error.
//! 3. Render and write entries in manifest order. A later entry with the
//!    same real path overwrites the earlier file and is reported in
//!    [`GenerateReport::overwritten`].
//!
//! The first render error aborts the pass. Files written before it stay on
//! disk; regenerating is cheap.

use crate::context::Mode;
use crate::manifest::CompletionError;
use crate::site::{RenderError, Site};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One file written by [`Site::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub realpath: String,
    pub view: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// In manifest order, duplicates included.
    pub files: Vec<GeneratedFile>,
    /// Real paths written more than once; the last entry's bytes won.
    pub overwritten: Vec<String>,
}

impl GenerateReport {
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

impl Site {
    /// Render the whole manifest into `output_dir`.
    pub fn generate(&self, output_dir: &Path) -> Result<GenerateReport, GenerateError> {
        let manifest = self.manifest().complete(self.index_file())?;
        prepare_output_dir(output_dir)?;
        info!(output = %output_dir.display(), files = manifest.len(), "generating");

        let mut report = GenerateReport::default();
        let mut seen = HashSet::new();

        for filespec in &manifest {
            let data = self.render(filespec, Mode::Generating)?;
            let realpath = filespec.realpath();
            let target = output_dir.join(realpath);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| GenerateError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&target, &data).map_err(|source| GenerateError::Write {
                path: target.clone(),
                source,
            })?;
            debug!(realpath, view = filespec.view_name(), bytes = data.len(), "wrote");

            if !seen.insert(realpath.to_string()) {
                warn!(realpath, "overwriting file written by an earlier entry");
                report.overwritten.push(realpath.to_string());
            }
            report.files.push(GeneratedFile {
                path: filespec.path().to_string(),
                realpath: realpath.to_string(),
                view: filespec.view_name().to_string(),
                bytes: data.len(),
            });
        }

        info!(
            files = report.files.len(),
            bytes = report.total_bytes(),
            "generation finished"
        );
        Ok(report)
    }
}

/// Empty an existing directory, or create a missing one.
fn prepare_output_dir(output_dir: &Path) -> Result<(), GenerateError> {
    match fs::metadata(output_dir) {
        Ok(meta) if meta.is_dir() => clear_dir(output_dir)?,
        Ok(_) => return Err(GenerateError::NotADirectory(output_dir.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(output_dir)?,
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn clear_dir(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // file_type() does not follow symlinks, so linked directories are unlinked
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
