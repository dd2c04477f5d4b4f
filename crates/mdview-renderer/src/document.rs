//! Markdown document identifiers.

use std::fmt;

use url::form_urlencoded;

/// Why a document identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocPathError {
    #[error("document path is empty")]
    Empty,
    #[error("not a markdown document: {0}")]
    NotMarkdown(String),
    #[error("path traversal is not allowed: {0}")]
    Traversal(String),
    #[error("{path} is outside the document root {root}")]
    OutsideRoot { path: String, root: String },
}

/// A validated, normalized path to a `.md` document.
///
/// Normalization turns backslashes into `/` and removes one leading `./`.
/// The result must end in `.md` (any case), must not contain `..` anywhere,
/// and must start with `root` when a non-empty root is given.
///
/// ```
/// use mdview_renderer::{DocPath, DocPathError};
///
/// let doc = DocPath::parse(r".\docs\guide.md", "docs/").unwrap();
/// assert_eq!(doc.as_str(), "docs/guide.md");
/// assert!(matches!(DocPath::parse("guide.md", "docs/"), Err(DocPathError::OutsideRoot { .. })));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(String);

impl DocPath {
    pub fn parse(raw: &str, root: &str) -> Result<Self, DocPathError> {
        if raw.is_empty() {
            return Err(DocPathError::Empty);
        }
        let slashed = raw.replace('\\', "/");
        let normalized = slashed.strip_prefix("./").unwrap_or(&slashed);

        if normalized.is_empty() {
            return Err(DocPathError::Empty);
        }
        if !normalized.to_ascii_lowercase().ends_with(".md") {
            return Err(DocPathError::NotMarkdown(normalized.to_owned()));
        }
        if normalized.contains("..") {
            return Err(DocPathError::Traversal(normalized.to_owned()));
        }
        if !root.is_empty() && !normalized.starts_with(root) {
            return Err(DocPathError::OutsideRoot {
                path: normalized.to_owned(),
                root: root.to_owned(),
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Viewer link for this document.
    #[must_use]
    pub fn href(&self) -> String {
        doc_href(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Query string that opens `path` in the viewer, e.g. `?doc=docs%2Fa.md`.
#[must_use]
pub fn doc_href(path: &str) -> String {
    form_urlencoded::Serializer::new(String::from("?"))
        .append_pair("doc", path)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_path_under_root() {
        let doc = DocPath::parse("docs/guide.md", "docs/").unwrap();
        assert_eq!(doc.as_str(), "docs/guide.md");
    }

    #[test]
    fn test_rejects_path_outside_root() {
        assert_eq!(
            DocPath::parse("guide.md", "docs/"),
            Err(DocPathError::OutsideRoot {
                path: "guide.md".to_owned(),
                root: "docs/".to_owned(),
            })
        );
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(matches!(
            DocPath::parse("..//secret.md", ""),
            Err(DocPathError::Traversal(_))
        ));
        assert!(matches!(
            DocPath::parse("docs/../../etc/x.md", "docs/"),
            Err(DocPathError::Traversal(_))
        ));
        // Any `..` substring is rejected, not only path segments.
        assert!(DocPath::parse("docs/notes..md", "").is_err());
    }

    #[test]
    fn test_rejects_non_markdown() {
        assert_eq!(
            DocPath::parse("docs/data.csv", "docs/"),
            Err(DocPathError::NotMarkdown("docs/data.csv".to_owned()))
        );
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(DocPath::parse("", ""), Err(DocPathError::Empty));
        assert_eq!(DocPath::parse("./", ""), Err(DocPathError::Empty));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert!(DocPath::parse("docs/README.MD", "docs/").is_ok());
    }

    #[test]
    fn test_backslashes_and_dot_prefix_normalized() {
        let doc = DocPath::parse(r".\docs\methods\a.md", "").unwrap();
        assert_eq!(doc.to_string(), "docs/methods/a.md");
    }

    #[test]
    fn test_no_root_accepts_any_markdown() {
        assert!(DocPath::parse("anywhere/x.md", "").is_ok());
    }

    #[test]
    fn test_doc_href() {
        assert_eq!(doc_href("docs/a b.md"), "?doc=docs%2Fa+b.md");
        let doc = DocPath::parse("docs/实验.md", "").unwrap();
        assert_eq!(doc.href(), "?doc=docs%2F%E5%AE%9E%E9%AA%8C.md");
    }
}
