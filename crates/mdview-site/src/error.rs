//! Errors from the view pipeline and their inline rendering.

use mdview_renderer::{DocPathError, Locale, escape_html};
use mdview_storage::{StorageError, StorageErrorKind};

/// Why a document could not be shown.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("invalid document path: {0}")]
    InvalidPath(#[from] DocPathError),
    #[error("cannot read {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: StorageError,
    },
    /// The blocking fetch task panicked or was cancelled.
    #[error("fetch task failed for {path}: {reason}")]
    Task { path: String, reason: String },
}

impl ViewError {
    /// Whether the document itself is missing, as opposed to unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Fetch { source, .. } if source.kind == StorageErrorKind::NotFound
        )
    }

    /// Message shown in place of the document.
    pub fn message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::InvalidPath(_), Locale::En) => "Invalid Markdown document path.".to_owned(),
            (Self::InvalidPath(_), Locale::Zh) => "无效的 Markdown 目标路径。".to_owned(),
            (Self::Fetch { path, .. } | Self::Task { path, .. }, Locale::En) => {
                format!("Failed to load: cannot read file: {path}")
            }
            (Self::Fetch { path, .. } | Self::Task { path, .. }, Locale::Zh) => {
                format!("加载失败: 无法读取文件: {path}")
            }
        }
    }

    /// Inline markup that replaces the content area.
    pub fn to_inline_html(&self, locale: Locale) -> String {
        format!(
            r#"<p class="text-danger mb-0">{}</p>"#,
            escape_html(&self.message(locale))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_markup() {
        let error = ViewError::from(DocPathError::Empty);
        assert_eq!(
            error.to_inline_html(Locale::En),
            r#"<p class="text-danger mb-0">Invalid Markdown document path.</p>"#
        );
        assert_eq!(
            error.to_inline_html(Locale::Zh),
            r#"<p class="text-danger mb-0">无效的 Markdown 目标路径。</p>"#
        );
    }

    #[test]
    fn test_fetch_markup_escapes_path() {
        let error = ViewError::Fetch {
            path: "docs/<a>.md".to_owned(),
            source: StorageError::not_found("docs/<a>.md"),
        };
        assert!(error.is_not_found());
        assert_eq!(
            error.to_inline_html(Locale::Zh),
            r#"<p class="text-danger mb-0">加载失败: 无法读取文件: docs/&lt;a&gt;.md</p>"#
        );
    }

    #[test]
    fn test_unavailable_is_not_not_found() {
        let error = ViewError::Fetch {
            path: "docs/a.md".to_owned(),
            source: StorageError::http_status(502),
        };
        assert!(!error.is_not_found());
        assert_eq!(error.message(Locale::En), "Failed to load: cannot read file: docs/a.md");
    }
}
