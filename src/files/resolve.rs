//! Static file resolution and streaming.
//!
//! # Responsibilities
//! - Resolve a candidate path into file metadata (size, mtime, mime)
//! - Handle directory-vs-file: `<dir>/<index>` when an index is configured,
//!   pass-through to the next pipeline stage otherwise
//! - Produce a lazily-read streamed response body for large files
//!
//! # Design Decisions
//! - `NotFound`, `NotADirectory` and `InvalidFilename` I/O kinds map to 404;
//!   every other I/O error propagates and maps to 500
//! - `Last-Modified` and `Cache-Control` are only set when the caller has
//!   not already supplied them

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use mime_guess::Mime;
use tokio_util::io::ReaderStream;

/// Options controlling resolution and response caching headers.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Index filename appended when the path is a directory.
    pub index: Option<String>,
    /// `max-age` seconds for the Cache-Control header.
    pub max_age_secs: u64,
    /// Append the `immutable` Cache-Control directive.
    pub immutable: bool,
}

/// Outcome of resolving a candidate path.
#[derive(Debug)]
pub enum Resolved {
    /// A regular file ready to be streamed.
    File(FileHandle),
    /// The path (or `<dir>/<index>`) does not exist.
    NotFound,
    /// A directory with no index configured; the request belongs to a later
    /// pipeline stage.
    Passthrough,
}

/// Metadata for a resolvable file, consumed by the response writer.
#[derive(Debug)]
pub struct FileHandle {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub content_type: Mime,
}

/// I/O error kinds that deterministically mean "no such file" for serving
/// purposes (ENOENT, ENOTDIR, ENAMETOOLONG).
pub fn is_not_found(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidFilename
    )
}

/// Resolve a candidate path into a [`FileHandle`].
///
/// Directory handling follows the options: with an `index` the lookup
/// retries at `<dir>/<index>`; without one the result is
/// [`Resolved::Passthrough`] so the request can stack onto later stages.
pub async fn resolve(path: &Path, options: &ServeOptions) -> io::Result<Resolved> {
    let mut path = path.to_path_buf();
    let mut metadata = match tokio::fs::metadata(&path).await {
        Ok(meta) => meta,
        Err(e) if is_not_found(&e) => return Ok(Resolved::NotFound),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        let Some(index) = &options.index else {
            return Ok(Resolved::Passthrough);
        };
        path = path.join(index);
        metadata = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if is_not_found(&e) => return Ok(Resolved::NotFound),
            Err(e) => return Err(e),
        };
    }

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(Resolved::File(FileHandle {
        size: metadata.len(),
        modified: metadata.modified().ok(),
        content_type,
        path,
    }))
}

impl FileHandle {
    /// Open the file and build a streamed response.
    ///
    /// `preset` headers take precedence: `Last-Modified`, `Cache-Control`
    /// and `Content-Type` are only filled in when absent from it.
    pub async fn into_response(
        self,
        options: &ServeOptions,
        preset: HeaderMap,
    ) -> io::Result<Response> {
        let file = tokio::fs::File::open(&self.path).await?;

        let mut builder = Response::builder().status(StatusCode::OK);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(preset);

            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(self.size));
            if !headers.contains_key(header::CONTENT_TYPE) {
                if let Ok(value) = HeaderValue::from_str(self.content_type.as_ref()) {
                    headers.insert(header::CONTENT_TYPE, value);
                }
            }
            if !headers.contains_key(header::LAST_MODIFIED) {
                if let Some(modified) = self.modified {
                    if let Ok(value) = HeaderValue::from_str(&httpdate::fmt_http_date(modified)) {
                        headers.insert(header::LAST_MODIFIED, value);
                    }
                }
            }
            if !headers.contains_key(header::CACHE_CONTROL) {
                let directives = if options.immutable {
                    format!("max-age={},immutable", options.max_age_secs)
                } else {
                    format!("max-age={}", options.max_age_secs)
                };
                if let Ok(value) = HeaderValue::from_str(&directives) {
                    headers.insert(header::CACHE_CONTROL, value);
                }
            }
        }

        let body = Body::from_stream(ReaderStream::new(file));
        builder
            .body(body)
            .map_err(|e| io::Error::other(format!("response build failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(&dir.path().join("nope.json"), &ServeOptions::default())
            .await
            .unwrap();
        assert!(matches!(resolved, Resolved::NotFound));
    }

    #[tokio::test]
    async fn test_file_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "users.json", r#"{"users":[]}"#).await;

        let resolved = resolve(&path, &ServeOptions::default()).await.unwrap();
        let Resolved::File(handle) = resolved else {
            panic!("expected file");
        };
        assert_eq!(handle.size, 12);
        assert_eq!(handle.content_type.essence_str(), "application/json");
        assert!(handle.modified.is_some());
    }

    #[tokio::test]
    async fn test_directory_with_index() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "index.html", "<html></html>").await;

        let options = ServeOptions {
            index: Some("index.html".into()),
            ..Default::default()
        };
        let resolved = resolve(dir.path(), &options).await.unwrap();
        let Resolved::File(handle) = resolved else {
            panic!("expected file");
        };
        assert!(handle.path.ends_with("index.html"));
        assert_eq!(handle.content_type.essence_str(), "text/html");
    }

    #[tokio::test]
    async fn test_directory_with_missing_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let options = ServeOptions {
            index: Some("index.html".into()),
            ..Default::default()
        };
        let resolved = resolve(dir.path(), &options).await.unwrap();
        assert!(matches!(resolved, Resolved::NotFound));
    }

    #[tokio::test]
    async fn test_directory_without_index_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(dir.path(), &ServeOptions::default()).await.unwrap();
        assert!(matches!(resolved, Resolved::Passthrough));
    }

    #[tokio::test]
    async fn test_response_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "app.js", "console.log(1);").await;

        let resolved = resolve(&path, &ServeOptions::default()).await.unwrap();
        let Resolved::File(handle) = resolved else {
            panic!("expected file");
        };
        let response = handle
            .into_response(
                &ServeOptions {
                    max_age_secs: 60,
                    immutable: true,
                    ..Default::default()
                },
                HeaderMap::new(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_LENGTH], "15");
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=60,immutable");
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript"));
        assert!(headers.contains_key(header::LAST_MODIFIED));
    }

    #[tokio::test]
    async fn test_preset_cache_control_not_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.txt", "hi").await;

        let resolved = resolve(&path, &ServeOptions::default()).await.unwrap();
        let Resolved::File(handle) = resolved else {
            panic!("expected file");
        };
        let mut preset = HeaderMap::new();
        preset.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let response = handle
            .into_response(&ServeOptions::default(), preset)
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }
}
