//! Mock storage implementation for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::storage::{Listing, Storage, StorageError, title_from_content, title_from_filename};

/// In-memory storage for tests.
///
/// # Example
///
/// ```ignore
/// use mdview_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_document("docs/guide.md", "# User Guide\n\nContent.")
///     .with_failure("docs/broken.md", 500);
///
/// let text = storage.read("docs/guide.md").unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    documents: RwLock<BTreeMap<String, String>>,
    failures: RwLock<HashMap<String, u16>>,
    reads: AtomicUsize,
}

impl MockStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_document(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents
            .write()
            .unwrap()
            .insert(path.into(), content.into());
        self
    }

    /// Make reads of `path` fail as if the backend answered `status`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, path: impl Into<String>, status: u16) -> Self {
        self.failures.write().unwrap().insert(path.into(), status);
        self
    }

    /// Replace a document's content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_document(&self, path: impl Into<String>, content: impl Into<String>) {
        self.documents
            .write()
            .unwrap()
            .insert(path.into(), content.into());
    }

    /// Number of `read` calls so far, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Storage for MockStorage {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.failures.read().unwrap().get(path) {
            return Err(StorageError::http_status(*status)
                .with_path(path)
                .with_backend("Mock"));
        }
        self.documents
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path).with_backend("Mock"))
    }

    fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        Ok(self
            .documents
            .read()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, content)| Listing {
                path: path.clone(),
                title: title_from_content(content).unwrap_or_else(|| title_from_filename(path)),
            })
            .collect())
    }

    fn describe(&self) -> String {
        "mock".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageErrorKind;

    #[test]
    fn test_mock_storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockStorage>();
    }

    #[test]
    fn test_read_and_count() {
        let storage = MockStorage::new().with_document("docs/a.md", "# A");

        assert_eq!(storage.read("docs/a.md").unwrap(), "# A");
        assert_eq!(storage.read("docs/b.md").unwrap_err().kind, StorageErrorKind::NotFound);
        assert_eq!(storage.read_count(), 2);
    }

    #[test]
    fn test_failure_overrides_content() {
        let storage = MockStorage::new()
            .with_document("docs/a.md", "# A")
            .with_failure("docs/a.md", 503);

        let err = storage.read("docs/a.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::Unavailable);
        assert_eq!(err.backend, Some("Mock"));
    }

    #[test]
    fn test_set_document_replaces_content() {
        let storage = MockStorage::new().with_document("docs/a.md", "old");
        storage.set_document("docs/a.md", "new");
        assert_eq!(storage.read("docs/a.md").unwrap(), "new");
    }

    #[test]
    fn test_list_by_prefix() {
        let storage = MockStorage::new()
            .with_document("docs/b-side.md", "text")
            .with_document("docs/a.md", "# Alpha")
            .with_document("other/c.md", "# C");

        let listings = storage.list("docs/").unwrap();
        assert_eq!(
            listings,
            vec![
                Listing {
                    path: "docs/a.md".to_owned(),
                    title: "Alpha".to_owned(),
                },
                Listing {
                    path: "docs/b-side.md".to_owned(),
                    title: "B Side".to_owned(),
                },
            ]
        );
    }
}
