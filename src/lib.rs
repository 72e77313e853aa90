//! # viewgen
//!
//! A manifest-driven site builder. A site is an ordered list of files, each
//! bound to a view that produces its bytes. The same list can be served live
//! over HTTP for previewing or written out once as a static directory tree.
//!
//! # Architecture: One Renderer, Two Adapters
//!
//! ```text
//!                    ┌──────────► serve     GET /path  → 200 bytes | 404
//! Manifest ─► Site::render
//!                    └──────────► generate  out/realpath ← bytes
//! ```
//!
//! Both adapters call [`site::Site::render`], so what the preview server shows
//! is byte-for-byte what generation writes. Views never know which adapter is
//! driving them unless they ask the [`context::RenderContext`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filespec`] | Path-to-view binding and the completion rule (`""` → `index.html`) |
//! | [`manifest`] | Ordered, always-validated collection of filespecs |
//! | [`view`] | The `View` trait and its three output shapes |
//! | [`context`] | Per-render context: mode, paths, template access |
//! | [`templates`] | Lazily built, shared `tera` environment |
//! | [`hooks`] | Post-render hook pipeline |
//! | [`site`] | The renderer and everything it needs |
//! | [`generate`] | Static output to a directory |
//! | [`serve`] | Live HTTP preview on axum |
//! | [`builtin`] | Stock views (`text`, `static_file`, `template`, `markdown`) and directory ingestion |
//! | [`config`] | `site.toml` loading, validation, and site construction |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Completion Is a Pure Transform
//!
//! A filespec's real path is derived from its logical path and the site's
//! index file. [`filespec::Filespec::complete`] returns a new value instead of
//! mutating, and a manifest is completed once before serving or generating.
//! The generator and the server can never disagree about where a file lives.
//!
//! ## Typed Views
//!
//! Views return [`view::ViewOutput`] (text, bytes or a reader) wrapped in a
//! `Result`. There is no "unsupported return value" to check at runtime; a
//! view that cannot produce output says so through its error.
//!
//! ## Rendering Is Never Cached
//!
//! Every HTTP request re-runs its view. The live server is a faithful preview
//! of a regeneration, at the cost of doing the work again. The only shared
//! state is the template environment, built once per site under a lock.

pub mod builtin;
pub mod config;
pub mod context;
pub mod filespec;
pub mod generate;
pub mod hooks;
pub mod manifest;
pub mod output;
pub mod serve;
pub mod site;
pub mod templates;
pub mod view;

#[cfg(test)]
pub(crate) mod test_helpers;
