//! Live HTTP preview.
//!
//! Every request re-renders its view, so the server always shows what a
//! fresh [`Site::generate`] would write. Nothing is cached between requests.
//!
//! ## Request handling
//!
//! ```text
//! GET /docs/       → lookup key "docs/index.html"   (index file appended)
//! GET /style.css   → lookup key "style.css"
//! GET /nope        → 404, empty body
//! POST /anything   → 405
//! ```
//!
//! The first manifest entry whose real path equals the lookup key wins. Query
//! strings are ignored and the path is used as sent, without percent-decoding.

use crate::context::Mode;
use crate::manifest::CompletionError;
use crate::site::Site;
use axum::Router;
use axum::extract::State;
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("starting runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("binding {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Site {
    /// Complete the manifest and wrap the site in an axum router.
    ///
    /// Completion errors surface here, before any request is accepted.
    pub fn into_router(mut self) -> Result<Router, CompletionError> {
        self.complete()?;
        info!(files = self.manifest().len(), "manifest ready");
        Ok(Router::new().fallback(handle).with_state(Arc::new(self)))
    }

    /// Serve until the process is stopped.
    ///
    /// Runs on a single-threaded runtime, so requests are rendered one at a
    /// time.
    pub fn serve(self, addr: SocketAddr) -> Result<(), ServeError> {
        let router = self.into_router()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ServeError::Runtime)?;
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|source| ServeError::Bind { addr, source })?;
            info!(%addr, "serving on http://{addr}/");
            axum::serve(listener, router).await?;
            Ok::<(), ServeError>(())
        })
    }
}

async fn handle(State(site): State<Arc<Site>>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if method != Method::GET {
        info!(%method, path, status = 405, "request");
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let key = lookup_key(path, site.index_file());
    let Some(filespec) = site.manifest().find(&key) else {
        info!(%method, path, status = 404, "request");
        return StatusCode::NOT_FOUND.into_response();
    };

    match site.render(filespec, Mode::Serving) {
        Ok(data) => {
            info!(%method, path, status = 200, bytes = data.len(), "request");
            (StatusCode::OK, content_headers(&key), data).into_response()
        }
        Err(err) => {
            error!(%method, path, error = %err, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// Map a request path to the real path it is served from.
pub fn lookup_key(request_path: &str, index_file: Option<&str>) -> String {
    let candidate = request_path.strip_prefix('/').unwrap_or(request_path);
    match index_file {
        Some(index) if candidate.is_empty() || candidate.ends_with('/') => {
            format!("{candidate}{index}")
        }
        _ => candidate.to_string(),
    }
}

fn content_headers(key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let (content_type, encoding) = guess_type(key);
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    if let Some(encoding) = encoding {
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(encoding));
    }
    headers
}

/// Content type and encoding for a real path, judged by its extension.
///
/// A compression suffix sets the encoding and the type comes from the
/// extension before it: `data.json.gz` is `application/json`, `gzip`.
pub fn guess_type(path: &str) -> (Option<&'static str>, Option<&'static str>) {
    let name = path.rsplit('/').next().unwrap_or(path);
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return (None, None);
    };
    match encoding_for(ext) {
        Some(encoding) => {
            let inner = stem.rsplit_once('.').and_then(|(_, ext)| type_for(ext));
            (inner, Some(encoding))
        }
        None => (type_for(ext), None),
    }
}

fn encoding_for(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "gz" => Some("gzip"),
        "bz2" => Some("bzip2"),
        "xz" => Some("xz"),
        "br" => Some("br"),
        _ => None,
    }
}

fn type_for(ext: &str) -> Option<&'static str> {
    let content_type = match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/vnd.microsoft.icon",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "tar" => "application/x-tar",
        "zip" => "application/zip",
        "webmanifest" => "application/manifest+json",
        _ => return None,
    };
    Some(content_type)
}
