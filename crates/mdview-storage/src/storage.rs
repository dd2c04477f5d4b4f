//! Storage trait and error types.
//!
//! Paths given to a [`Storage`] are document paths relative to the site root,
//! for example `docs/methods/sampling.md`. They have already passed document
//! path validation; backends still refuse anything that would leave their
//! root.

use std::path::PathBuf;

/// A Markdown document found by [`Storage::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Document path relative to the site root, `/`-separated.
    pub path: String,
    /// First H1 heading, else a title made from the file name.
    pub title: String,
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Document does not exist.
    NotFound,
    PermissionDenied,
    /// Path would escape the storage root.
    InvalidPath,
    /// Backend is temporarily unavailable (5xx, connection failure).
    Unavailable,
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    /// Path or URL the error refers to.
    pub path: Option<PathBuf>,
    /// Backend identifier ("Fs", "Http", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StorageErrorKind::Timeout,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }

    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn http_status(status: u16) -> Self {
        let kind = match status {
            404 | 410 => StorageErrorKind::NotFound,
            401 | 403 => StorageErrorKind::PermissionDenied,
            408 => StorageErrorKind::Timeout,
            429 | 500..=599 => StorageErrorKind::Unavailable,
            _ => StorageErrorKind::Other,
        };
        Self::new(kind).with_source(HttpStatus(status))
    }
}

/// Non-success status answered by an HTTP backend.
#[derive(Debug, thiserror::Error)]
#[error("HTTP {0}")]
pub struct HttpStatus(pub u16);

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // "[Backend] Kind: source (path: docs/a.md)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Unavailable => "Unavailable",
            StorageErrorKind::Timeout => "Timeout",
            StorageErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Where document text comes from.
///
/// Calls block; async callers run them on `spawn_blocking`.
pub trait Storage: Send + Sync {
    /// Read the raw text of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the document doesn't exist, can't be read,
    /// or the backend answers with a non-success status.
    fn read(&self, path: &str) -> Result<String, StorageError>;

    /// List the Markdown documents below `prefix`, sorted by path.
    ///
    /// Backends that cannot enumerate documents return an empty list.
    fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        let _ = prefix;
        Ok(Vec::new())
    }

    /// Short description for logs, like `fs:site` or `http://host/base/`.
    fn describe(&self) -> String;
}

/// Title from a document's first H1 heading.
pub(crate) fn title_from_content(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let heading = line.strip_prefix("# ")?.trim();
        (!heading.is_empty()).then(|| heading.to_owned())
    })
}

/// Title from a file name: `data-sources.md` becomes `Data Sources`.
pub(crate) fn title_from_filename(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem = name
        .rsplit_once('.')
        .map_or(name, |(stem, _)| stem);
    stem.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_storage_error_builders() {
        let err = StorageError::new(StorageErrorKind::Timeout)
            .with_backend("Fs")
            .with_path("docs/a.md");

        assert_eq!(err.kind, StorageErrorKind::Timeout);
        assert_eq!(err.backend, Some("Fs"));
        assert_eq!(err.path.as_deref(), Some(Path::new("docs/a.md")));
    }

    #[test]
    fn test_storage_error_io_mapping() {
        let not_found = StorageError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            Some(PathBuf::from("docs/a.md")),
        );
        assert_eq!(not_found.kind, StorageErrorKind::NotFound);
        assert_eq!(not_found.to_string(), "Not found: missing (path: docs/a.md)");

        let timeout = StorageError::io(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"), None);
        assert_eq!(timeout.kind, StorageErrorKind::Timeout);
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(StorageError::http_status(404).kind, StorageErrorKind::NotFound);
        assert_eq!(StorageError::http_status(403).kind, StorageErrorKind::PermissionDenied);

        assert_eq!(StorageError::http_status(429).kind, StorageErrorKind::Unavailable);
        assert_eq!(StorageError::http_status(503).kind, StorageErrorKind::Unavailable);
        assert_eq!(StorageError::http_status(302).kind, StorageErrorKind::Other);
    }

    #[test]
    fn test_storage_error_display() {
        assert_eq!(StorageError::new(StorageErrorKind::NotFound).to_string(), "Not found");

        let err = StorageError::http_status(500)
            .with_backend("Http")
            .with_path("http://host/docs/a.md");
        assert_eq!(
            err.to_string(),
            "[Http] Unavailable: HTTP 500 (path: http://host/docs/a.md)"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }

    #[test]
    fn test_title_from_content() {
        assert_eq!(
            title_from_content("intro\n# Sampling Plan \n## Other"),
            Some("Sampling Plan".to_owned())
        );
        assert_eq!(title_from_content("## Only H2\n#NoSpace"), None);
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("docs/data-sources.md"), "Data Sources");
        assert_eq!(title_from_filename("index.md"), "Index");
        assert_eq!(title_from_filename("docs/raw_notes_v2.md"), "Raw Notes V2");
    }
}
