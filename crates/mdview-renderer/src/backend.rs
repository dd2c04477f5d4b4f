//! Render backend trait for output-specific markup.
//!
//! The generic [`MarkdownRenderer`](crate::MarkdownRenderer) walks pulldown-cmark
//! events and delegates the elements whose markup is a presentation decision
//! (code blocks, blockquotes, callouts, images, math) to a backend.

use std::borrow::Cow;

use pulldown_cmark::BlockQuoteKind;

/// Kind of a GFM alert blockquote (`> [!NOTE]`).
///
/// Alerts are rendered with the same callout container as `!!!` admonitions,
/// so each variant maps onto a callout kind name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl AlertKind {
    /// Callout kind used for the container class.
    #[must_use]
    pub fn callout_kind(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Tip => "tip",
            Self::Important => "info",
            Self::Warning => "warning",
            Self::Caution => "danger",
        }
    }
}

impl From<BlockQuoteKind> for AlertKind {
    fn from(kind: BlockQuoteKind) -> Self {
        match kind {
            BlockQuoteKind::Note => Self::Note,
            BlockQuoteKind::Tip => Self::Tip,
            BlockQuoteKind::Important => Self::Important,
            BlockQuoteKind::Warning => Self::Warning,
            BlockQuoteKind::Caution => Self::Caution,
        }
    }
}

/// Backend trait for output-specific rendering operations.
pub trait RenderBackend {
    /// Render a fenced or indented code block.
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Open a callout container with an already-escaped title.
    fn callout_start(kind: &str, title: &str, out: &mut String);

    /// Close a callout container opened by [`callout_start`](Self::callout_start).
    fn callout_end(out: &mut String);

    /// Render an image.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Render TeX source so the math enrichment pass can find it later.
    fn math(tex: &str, display: bool, out: &mut String);

    /// Transform a link URL found in the document at `doc_path`.
    ///
    /// Default implementation returns the URL unchanged.
    #[must_use]
    fn transform_link<'a>(url: &'a str, _doc_path: Option<&str>) -> Cow<'a, str> {
        Cow::Borrowed(url)
    }

    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
