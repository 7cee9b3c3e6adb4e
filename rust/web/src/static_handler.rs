use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use mime_guess::{mime, MimeGuess};
use tokio::fs;
use warp::http::{header::HeaderValue, Response, StatusCode};
use warp::hyper::Body;

/// Frontend compiled into the binary, served when no override directory
/// provides the file.
const EMBEDDED: &[(&str, &str)] = &[
    ("index.html", include_str!("../static/index.html")),
    ("app.js", include_str!("../static/app.js")),
    ("style.css", include_str!("../static/style.css")),
];

#[derive(Debug, thiserror::Error)]
pub enum StaticError {
    #[error("asset not found")]
    NotFound,
    #[error("asset io error: {0}")]
    Io(#[from] std::io::Error),
}

impl crate::errors::IntoErrorResponse for StaticError {
    fn status_code(&self) -> StatusCode {
        match self {
            StaticError::NotFound => StatusCode::NOT_FOUND,
            StaticError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            StaticError::NotFound => "static_not_found",
            StaticError::Io(_) => "static_io_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct StaticHandler {
    root: Option<Arc<PathBuf>>,
    cache_header: HeaderValue,
}

impl StaticHandler {
    /// Serves only the embedded frontend.
    pub fn embedded() -> Self {
        Self {
            root: None,
            cache_header: HeaderValue::from_static("public, max-age=3600"),
        }
    }

    /// Serves files from `root`, falling back to the embedded frontend.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(Arc::new(root.into())),
            ..Self::embedded()
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref().map(PathBuf::as_path)
    }

    pub async fn index(&self) -> Result<warp::reply::Response, StaticError> {
        self.serve_relative("index.html").await
    }

    pub async fn asset(&self, path: &str) -> Result<warp::reply::Response, StaticError> {
        if path.is_empty() {
            return Err(StaticError::NotFound);
        }
        self.serve_relative(path).await
    }

    pub fn error_response(&self, error: StaticError) -> warp::reply::Response {
        let (status, text) = match error {
            StaticError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            StaticError::Io(err) => {
                tracing::error!(error = %err, "failed to read static asset");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        let mut response = Response::new(Body::from(text));
        *response.status_mut() = status;
        response.headers_mut().insert(
            warp::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        );
        response
    }

    async fn serve_relative(&self, relative: &str) -> Result<warp::reply::Response, StaticError> {
        let normalized = normalize(relative)?;

        if let Some(root) = &self.root {
            let resolved = root.join(&normalized);
            match fs::read(&resolved).await {
                Ok(bytes) => {
                    let mime = MimeGuess::from_path(&resolved).first_or_octet_stream();
                    return Ok(self.build_response(bytes, mime));
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(StaticError::Io(err)),
            }
        }

        let key = normalized.to_string_lossy();
        let (name, contents) = EMBEDDED
            .iter()
            .find(|(name, _)| *name == key)
            .ok_or(StaticError::NotFound)?;
        let mime = MimeGuess::from_path(name).first_or_octet_stream();
        Ok(self.build_response(contents.as_bytes().to_vec(), mime))
    }

    fn build_response(&self, bytes: Vec<u8>, mime: mime::Mime) -> warp::reply::Response {
        let mut response = Response::new(Body::from(bytes));
        let mut content_type = mime.essence_str().to_string();
        if mime.type_() == mime::TEXT || mime == mime::APPLICATION_JAVASCRIPT {
            content_type.push_str("; charset=utf-8");
        }

        response.headers_mut().insert(
            warp::http::header::CONTENT_TYPE,
            HeaderValue::from_str(&content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );
        response
            .headers_mut()
            .insert(warp::http::header::CACHE_CONTROL, self.cache_header.clone());
        response
    }
}

/// Relative path with `.` and leading `/` removed. Parent components are
/// refused outright.
fn normalize(path: &str) -> Result<PathBuf, StaticError> {
    let mut buf = PathBuf::new();
    for comp in Path::new(path).components() {
        match comp {
            Component::Normal(seg) => buf.push(seg),
            Component::CurDir | Component::RootDir => {}
            Component::Prefix(_) | Component::ParentDir => return Err(StaticError::NotFound),
        }
    }

    if buf.as_os_str().is_empty() {
        return Err(StaticError::NotFound);
    }
    Ok(buf)
}
