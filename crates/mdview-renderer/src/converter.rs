//! Markup converters: text in, HTML fragment out.
//!
//! The admonition transformer converts callout bodies through the same
//! converter that renders the whole document, so the two stay consistent.

use crate::html::HtmlBackend;
use crate::labels::AdmonitionLabels;
use crate::renderer::MarkdownRenderer;
use crate::state::escape_html;

/// Converts one piece of document text into HTML.
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, text: &str) -> String;
}

/// Markdown conversion backed by [`MarkdownRenderer`].
#[derive(Clone, Debug, Default)]
pub struct MarkdownConverter {
    labels: AdmonitionLabels,
    doc_path: Option<String>,
}

impl MarkdownConverter {
    #[must_use]
    pub fn new(labels: AdmonitionLabels) -> Self {
        Self {
            labels,
            doc_path: None,
        }
    }

    /// Resolve relative document links against `path`.
    #[must_use]
    pub fn for_document(mut self, path: impl Into<String>) -> Self {
        self.doc_path = Some(path.into());
        self
    }

    fn renderer(&self) -> MarkdownRenderer<HtmlBackend> {
        let renderer = MarkdownRenderer::new().with_labels(self.labels.clone());
        match &self.doc_path {
            Some(path) => renderer.with_doc_path(path.clone()),
            None => renderer,
        }
    }

    /// Full render including title and table of contents.
    pub fn render(&self, text: &str) -> crate::RenderResult {
        self.renderer().with_title_extraction().render_markdown(text)
    }
}

impl MarkupConverter for MarkdownConverter {
    fn convert(&self, text: &str) -> String {
        self.renderer().render_markdown(text).html
    }
}

/// Fallback used when Markdown rendering is disabled: the text is escaped and
/// line breaks become `<br>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextConverter;

impl MarkupConverter for PlainTextConverter {
    fn convert(&self, text: &str) -> String {
        escape_html(text).replace('\n', "<br>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_converter() {
        let html = MarkdownConverter::default().convert("**bold**");
        assert_eq!(html, "<p><strong>bold</strong></p>");
    }

    #[test]
    fn test_markdown_converter_resolves_links_for_document() {
        let html = MarkdownConverter::default()
            .for_document("docs/a.md")
            .convert("[b](b.md)");
        assert!(html.contains(r#"href="?doc=docs%2Fb.md""#));
    }

    #[test]
    fn test_plain_text_converter() {
        assert_eq!(
            PlainTextConverter.convert("a < b\nnext"),
            "a &lt; b<br>next"
        );
    }
}
