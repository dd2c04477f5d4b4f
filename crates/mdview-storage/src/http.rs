//! HTTP storage implementation.
//!
//! Documents are fetched with `GET {base_url}{path}` and
//! `Cache-Control: no-store`, so edits on the server show up on the next
//! render. Any status outside 2xx is an error.

use std::time::Duration;

use ureq::Agent;
use url::Url;

use crate::storage::{Storage, StorageError, StorageErrorKind};

const BACKEND: &str = "Http";

/// Default HTTP timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads documents from a web server.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    agent: Agent,
    base_url: Url,
}

impl HttpStorage {
    /// Create storage rooted at `base_url`. A trailing `/` is added so
    /// document paths resolve below it.
    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StorageError> {
        let mut normalized = base_url.trim().to_owned();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(base_url)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Ok(Self { agent, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of a document. Paths that would leave the base are refused.
    fn document_url(&self, path: &str) -> Result<Url, StorageError> {
        let invalid = || {
            StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND)
        };
        if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
            return Err(invalid());
        }
        let url = self.base_url.join(path).map_err(|e| invalid().with_source(e))?;
        if !url.as_str().starts_with(self.base_url.as_str()) {
            return Err(invalid());
        }
        Ok(url)
    }
}

impl Storage for HttpStorage {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        let url = self.document_url(path)?;
        tracing::debug!(%url, "Fetching document");

        let response = self
            .agent
            .get(url.as_str())
            .header("Cache-Control", "no-store")
            .call()
            .map_err(|e| {
                let kind = match e {
                    ureq::Error::Timeout(_) => StorageErrorKind::Timeout,
                    _ => StorageErrorKind::Unavailable,
                };
                StorageError::new(kind)
                    .with_path(url.as_str())
                    .with_backend(BACKEND)
                    .with_source(e)
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(StorageError::http_status(status)
                .with_path(url.as_str())
                .with_backend(BACKEND));
        }

        response.into_body().read_to_string().map_err(|e| {
            StorageError::new(StorageErrorKind::Other)
                .with_path(url.as_str())
                .with_backend(BACKEND)
                .with_source(e)
        })
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}
