//! File and directory routes.
//!
//! The dispatcher hands file routes to a [`FileServer`]. A successful response
//! is written untouched (no CORS headers). A failure is translated: status
//! `404` answers a plain `404`, anything else answers `500`.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use appy_http::protocol::{HttpError, RequestHeader, SendError};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::TryStreamExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Response, StatusCode};
use http_body::Frame;
use http_body_util::StreamBody;
use mime::Mime;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::body::ResponseBody;

#[derive(Debug, Error)]
#[error("serve file error ({status}): {source}")]
pub struct FileServerError {
    status: StatusCode,
    #[source]
    source: io::Error,
}

impl FileServerError {
    pub fn new(status: StatusCode, source: io::Error) -> Self {
        Self { status, source }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, io::Error::new(io::ErrorKind::NotFound, message.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<io::Error> for FileServerError {
    fn from(e: io::Error) -> Self {
        let status = match e.kind() {
            io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e)
    }
}

/// Serves one file from disk as a response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileServer: Send + Sync {
    async fn serve(&self, path: &Path, request: &RequestHeader) -> Result<Response<ResponseBody>, FileServerError>;
}

/// A [`FileServer`] streaming files with `tokio::fs`.
///
/// `Content-Type` comes from the file extension, `Content-Length` from the file
/// metadata. A missing path, or one that is not a regular file, is a `404`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileServer;

#[async_trait]
impl FileServer for LocalFileServer {
    async fn serve(&self, path: &Path, _request: &RequestHeader) -> Result<Response<ResponseBody>, FileServerError> {
        let file = tokio::fs::File::open(path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(FileServerError::not_found("not a regular file"));
        }

        let stream = ReaderStream::new(file).map_ok(Frame::data).map_err(|e| HttpError::from(SendError::io(e)));
        let mut response = Response::new(ResponseBody::stream(StreamBody::new(stream)));

        let headers = response.headers_mut();
        if let Ok(content_type) = HeaderValue::from_str(content_type(path).as_ref()) {
            headers.insert(CONTENT_TYPE, content_type);
        }
        headers.insert(CONTENT_LENGTH, HeaderValue::from(metadata.len()));

        Ok(response)
    }
}

fn content_type(path: &Path) -> Mime {
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or_default().to_ascii_lowercase();
    match extension.as_str() {
        "html" | "htm" => mime::TEXT_HTML,
        "css" => mime::TEXT_CSS,
        "js" | "mjs" => mime::APPLICATION_JAVASCRIPT,
        "json" => mime::APPLICATION_JSON,
        "txt" => mime::TEXT_PLAIN,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "svg" => mime::IMAGE_SVG,
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// A directory whose files are served by relative path.
#[derive(Debug)]
pub struct StaticDirectory {
    root: PathBuf,
}

impl StaticDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path below the root; `..`, roots and prefixes are refused.
    pub fn file_path(&self, relative: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for component in Path::new(relative.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => path.push(segment),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }
}

/// The dispatcher's side of static routes: the file server plus one memoized
/// [`StaticDirectory`] per distinct directory.
pub(crate) struct StaticFiles {
    server: Arc<dyn FileServer>,
    directories: DashMap<PathBuf, Arc<StaticDirectory>>,
}

impl StaticFiles {
    pub(crate) fn new(server: Arc<dyn FileServer>) -> Self {
        Self { server, directories: DashMap::new() }
    }

    pub(crate) async fn serve_file(
        &self,
        path: &Path,
        request: &RequestHeader,
    ) -> Result<Response<ResponseBody>, FileServerError> {
        self.server.serve(path, request).await
    }

    pub(crate) async fn serve_directory(
        &self,
        root: &Path,
        relative: &str,
        request: &RequestHeader,
    ) -> Result<Response<ResponseBody>, FileServerError> {
        let directory = self.directory(root);
        let Ok(relative) = urlencoding::decode(relative) else {
            debug!(relative, "refused path that does not decode to utf-8");
            return Err(FileServerError::not_found("path is not valid utf-8"));
        };
        let Some(path) = directory.file_path(&relative) else {
            debug!(%relative, root = %root.display(), "refused path outside of static directory");
            return Err(FileServerError::not_found("path escapes the served directory"));
        };
        self.server.serve(&path, request).await
    }

    fn directory(&self, root: &Path) -> Arc<StaticDirectory> {
        let entry = self.directories.entry(root.to_path_buf()).or_insert_with(|| Arc::new(StaticDirectory::new(root)));
        Arc::clone(entry.value())
    }

    #[cfg(test)]
    fn directory_count(&self) -> usize {
        self.directories.len()
    }
}

impl std::fmt::Debug for StaticFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFiles").field("directories", &self.directories.len()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use appy_http::protocol::RequestHeader;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;

    use super::{FileServer, FileServerError, LocalFileServer, MockFileServer, StaticDirectory, StaticFiles};

    fn request_header() -> RequestHeader {
        Request::builder().uri("/").body(()).unwrap().into()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn serves_file_with_type_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello file").unwrap();

        let response = LocalFileServer.serve(&path, &request_header()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "10");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"hello file");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn missing_file_and_directory_are_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let error = LocalFileServer.serve(&dir.path().join("missing.css"), &request_header()).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);

        let error = LocalFileServer.serve(dir.path(), &request_header()).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn io_errors_map_to_status() {
        let error = FileServerError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn directory_maps_relative_paths() {
        let directory = StaticDirectory::new("/srv/public");

        assert_eq!(directory.file_path("/css/site.css"), Some(PathBuf::from("/srv/public/css/site.css")));
        assert_eq!(directory.file_path("./a.txt"), Some(PathBuf::from("/srv/public/a.txt")));
        assert_eq!(directory.file_path("/../etc/passwd"), None);
        assert_eq!(directory.file_path("/a/../../b"), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn directories_are_memoized() {
        let mut server = MockFileServer::new();
        server
            .expect_serve()
            .withf(|path: &Path, _| path == Path::new("/srv/public/a.txt") || path == Path::new("/srv/public/b.txt"))
            .times(2)
            .returning(|_, _| Ok(Response::new("ok".into())));

        let files = StaticFiles::new(Arc::new(server));
        let header = request_header();

        files.serve_directory(Path::new("/srv/public"), "/a.txt", &header).await.unwrap();
        files.serve_directory(Path::new("/srv/public"), "/b.txt", &header).await.unwrap();
        assert_eq!(files.directory_count(), 1);

        let error = files.serve_directory(Path::new("/srv/public"), "/../secret", &header).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn directory_paths_are_percent_decoded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my file.txt"), "spaced").unwrap();
        let files = StaticFiles::new(Arc::new(LocalFileServer));
        let header = request_header();

        let response = files.serve_directory(dir.path(), "/my%20file.txt", &header).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"spaced");

        let error = files.serve_directory(dir.path(), "/%2e%2e/secret", &header).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);

        let error = files.serve_directory(dir.path(), "/%ff", &header).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn single_file_goes_to_file_server() {
        let mut server = MockFileServer::new();
        server
            .expect_serve()
            .withf(|path: &Path, _| path == Path::new("/srv/index.html"))
            .times(1)
            .returning(|_, _| Err(FileServerError::not_found("gone")));

        let files = StaticFiles::new(Arc::new(server));
        let error = files.serve_file(Path::new("/srv/index.html"), &request_header()).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
    }
}
