//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mdview_site::ViewError;
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A document could not be rendered.
    #[error(transparent)]
    View(#[from] ViewError),

    /// The configured bind address does not parse.
    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::View(ViewError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            Self::View(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::View(_) => StatusCode::BAD_GATEWAY,
            Self::Address(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::View(ViewError::Fetch { path, .. } | ViewError::Task { path, .. }) => {
                json!({"error": self.to_string(), "path": path})
            }
            _ => json!({"error": self.to_string()}),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use mdview_renderer::DocPathError;
    use mdview_storage::StorageError;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid =
            ServerError::from(ViewError::from(DocPathError::Traversal("../a.md".to_owned())));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let missing = ServerError::from(ViewError::Fetch {
            path: "docs/a.md".to_owned(),
            source: StorageError::not_found("docs/a.md"),
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let upstream = ServerError::from(ViewError::Fetch {
            path: "docs/a.md".to_owned(),
            source: StorageError::http_status(503),
        });
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
