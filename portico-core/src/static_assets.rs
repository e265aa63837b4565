//! Static asset serving.
//!
//! Files are served from a single root directory with `Cache-Control:
//! no-cache`, a content type picked from the extension and a
//! `Last-Modified` header. Requests that would escape the root are refused.

use crate::{Error, HttpResponse};
use std::path::{Component, Path, PathBuf};

/// Content type for a file, by extension
pub fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct StaticAssets {
    root_dir: PathBuf,
}

impl StaticAssets {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Serve `relative` (the part of the path below the mount point).
    ///
    /// Returns `Ok(None)` when the file does not exist or is a directory so
    /// the caller can render its own not-found page.
    pub async fn serve(&self, relative: &str) -> Result<Option<HttpResponse>, Error> {
        let Some(path) = self.resolve_path(relative)? else {
            return Ok(None);
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Ok(None),
        };

        let content = tokio::fs::read(&path).await?;

        let mut response = HttpResponse::ok()
            .with_body(content)
            .with_header("Content-Type".to_string(), mime_type(&path).to_string())
            .with_header("Cache-Control".to_string(), "no-cache".to_string());

        if let Ok(modified) = metadata.modified() {
            response.headers.insert(
                "Last-Modified".to_string(),
                httpdate::fmt_http_date(modified),
            );
        }

        Ok(Some(response))
    }

    /// Map a request path onto the root directory, refusing anything that
    /// would leave it.
    fn resolve_path(&self, relative: &str) -> Result<Option<PathBuf>, Error> {
        let decoded = urlencoding::decode(relative)
            .map_err(|e| Error::BadRequest(format!("invalid asset path: {e}")))?;
        let clean = Path::new(decoded.trim_start_matches('/'));

        if clean
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Forbidden(format!("asset path escapes root: {relative}")));
        }

        let full_path = self.root_dir.join(clean);
        let Ok(canonical_path) = full_path.canonicalize() else {
            return Ok(None);
        };
        let canonical_root = self.root_dir.canonicalize()?;

        if !canonical_path.starts_with(&canonical_root) {
            return Err(Error::Forbidden(format!("asset path escapes root: {relative}")));
        }

        Ok(Some(canonical_path))
    }
}
