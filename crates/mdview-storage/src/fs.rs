//! Filesystem storage implementation.

use std::fs;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::storage::{Listing, Storage, StorageError, StorageErrorKind, title_from_content, title_from_filename};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Reads documents below a source directory.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use mdview_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("site"));
/// let text = storage.read("docs/index.md")?;
/// ```
#[derive(Debug, Clone)]
pub struct FsStorage {
    source_dir: PathBuf,
}

impl FsStorage {
    #[must_use]
    pub fn new(source_dir: PathBuf) -> Self {
        Self { source_dir }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Reject paths that are absolute or climb out of the source directory.
    fn validate_path(path: &Path) -> Result<(), StorageError> {
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));

        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(())
    }

    /// Hidden and underscore-prefixed entries are not listed.
    fn is_listed(relative: &Path) -> bool {
        relative.components().all(|c| match c {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                !name.starts_with('.') && !name.starts_with('_')
            }
            _ => false,
        })
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        let relative = Path::new(path);
        Self::validate_path(relative)?;
        let full_path = self.source_dir.join(relative);
        tracing::debug!(path = %full_path.display(), "Reading document");
        fs::read_to_string(&full_path)
            .map_err(|e| StorageError::io(e, Some(PathBuf::from(path))).with_backend(BACKEND))
    }

    fn list(&self, prefix: &str) -> Result<Vec<Listing>, StorageError> {
        let prefix = prefix.trim_end_matches('/');
        Self::validate_path(Path::new(prefix))?;
        let base = if prefix.is_empty() {
            self.source_dir.clone()
        } else {
            self.source_dir.join(prefix)
        };
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = format!("{}/**/*.md", Pattern::escape(&base.to_string_lossy()));
        let entries = glob::glob_with(
            &pattern,
            glob::MatchOptions {
                case_sensitive: false,
                ..glob::MatchOptions::new()
            },
        )
        .map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(prefix)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        let mut listings = Vec::new();
        for entry in entries {
            let full_path = match entry {
                Ok(path) => path,
                Err(error) => {
                    tracing::debug!(%error, "Skipping unreadable entry");
                    continue;
                }
            };
            let Ok(relative) = full_path.strip_prefix(&self.source_dir) else {
                continue;
            };
            if !full_path.is_file() || !Self::is_listed(relative) {
                continue;
            }

            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let title = fs::read_to_string(&full_path)
                .ok()
                .and_then(|content| title_from_content(&content))
                .unwrap_or_else(|| title_from_filename(&path));
            listings.push(Listing { path, title });
        }
        listings.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listings)
    }

    fn describe(&self) -> String {
        format!("fs:{}", self.source_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn create_test_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs/methods")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "# Overview\n\nText.").unwrap();
        fs::write(dir.path().join("docs/methods/data-sources.md"), "No heading here.").unwrap();
        fs::write(dir.path().join("docs/methods/_draft.md"), "# Draft").unwrap();
        fs::write(dir.path().join("docs/notes.txt"), "not markdown").unwrap();
        fs::create_dir_all(dir.path().join("docs/.hidden")).unwrap();
        fs::write(dir.path().join("docs/.hidden/secret.md"), "# Secret").unwrap();
        fs::write(dir.path().join("README.md"), "# Readme").unwrap();
        dir
    }

    #[test]
    fn test_fs_storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FsStorage>();
    }

    #[test]
    fn test_read_existing_file() {
        let dir = create_test_dir();
        let storage = FsStorage::new(dir.path().to_path_buf());

        assert_eq!(storage.read("docs/index.md").unwrap(), "# Overview\n\nText.");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = create_test_dir();
        let storage = FsStorage::new(dir.path().to_path_buf());

        let err = storage.read("docs/missing.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
        assert_eq!(err.path.as_deref(), Some(Path::new("docs/missing.md")));
    }

    #[test]
    fn test_read_rejects_path_traversal() {
        let dir = create_test_dir();
        let storage = FsStorage::new(dir.path().join("docs"));

        let err = storage.read("../README.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidPath);

        let err = storage.read("/etc/passwd").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_list_titles_and_filters() {
        let dir = create_test_dir();
        let storage = FsStorage::new(dir.path().to_path_buf());

        let listings = storage.list("docs/").unwrap();
        assert_eq!(
            listings,
            vec![
                Listing {
                    path: "docs/index.md".to_owned(),
                    title: "Overview".to_owned(),
                },
                Listing {
                    path: "docs/methods/data-sources.md".to_owned(),
                    title: "Data Sources".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_list_whole_site_and_missing_prefix() {
        let dir = create_test_dir();
        let storage = FsStorage::new(dir.path().to_path_buf());

        let paths: Vec<_> = storage.list("").unwrap().into_iter().map(|l| l.path).collect();
        assert_eq!(paths, ["README.md", "docs/index.md", "docs/methods/data-sources.md"]);
        assert!(storage.list("nowhere/").unwrap().is_empty());
    }

    #[test]
    fn test_describe() {
        let storage = FsStorage::new(PathBuf::from("site"));
        assert_eq!(storage.describe(), "fs:site");
    }
}
