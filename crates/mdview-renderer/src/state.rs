//! Event-walk state for the markdown renderer.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

use crate::util::slugify;

/// Text that is being captured instead of written to the output.
///
/// Code block content and image alt text are buffered until their end tag so
/// the backend can render them in one piece.
#[derive(Debug, Default)]
pub(crate) enum Capture {
    #[default]
    Off,
    Code {
        lang: Option<String>,
        content: String,
    },
    Image {
        src: String,
        title: String,
        alt: String,
    },
}

impl Capture {
    /// Append text to whichever buffer is open. Returns `false` when off.
    pub(crate) fn push(&mut self, text: &str) -> bool {
        match self {
            Self::Off => false,
            Self::Code { content, .. } => {
                content.push_str(text);
                true
            }
            Self::Image { alt, .. } => {
                alt.push_str(text);
                true
            }
        }
    }

    pub(crate) fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// Column alignment and position inside a GFM table.
#[derive(Debug, Default)]
pub(crate) struct TableState {
    alignments: Vec<Alignment>,
    in_head: bool,
    cell: usize,
}

impl TableState {
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        *self = Self {
            alignments,
            ..Self::default()
        };
    }

    pub(crate) fn set_head(&mut self, in_head: bool) {
        self.in_head = in_head;
        self.cell = 0;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell += 1;
    }

    pub(crate) fn cell_tag(&self) -> &'static str {
        if self.in_head { "th" } else { "td" }
    }

    pub(crate) fn cell_style(&self) -> &'static str {
        match self.alignments.get(self.cell) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// A heading whose end tag has been reached.
pub(crate) struct FinishedHeading {
    pub level: u8,
    pub id: String,
    pub html: String,
}

/// Heading capture, title extraction and anchor allocation.
#[derive(Debug, Default)]
pub(crate) struct HeadingState {
    extract_title: bool,
    level: Option<u8>,
    text: String,
    html: String,
    title: Option<String>,
    toc: Vec<TocEntry>,
    ids: HashMap<String, usize>,
}

impl HeadingState {
    pub(crate) fn new(extract_title: bool) -> Self {
        Self {
            extract_title,
            ..Self::default()
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.level.is_some()
    }

    pub(crate) fn start(&mut self, level: u8) {
        self.level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Record plain text (for the slug and toc) and its markup.
    pub(crate) fn push(&mut self, text: &str, html: &str) {
        self.text.push_str(text);
        self.html.push_str(html);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    /// Close the heading. The first H1 becomes the title when extraction is
    /// enabled; every other heading is added to the toc.
    pub(crate) fn finish(&mut self) -> Option<FinishedHeading> {
        let level = self.level.take()?;
        let text = std::mem::take(&mut self.text);
        let title = text.trim().to_owned();
        let id = self.allocate_id(&title);

        if self.extract_title && level == 1 && self.title.is_none() {
            self.title = Some(title);
        } else {
            self.toc.push(TocEntry {
                level,
                title,
                id: id.clone(),
            });
        }

        Some(FinishedHeading {
            level,
            id,
            html: std::mem::take(&mut self.html),
        })
    }

    fn allocate_id(&mut self, text: &str) -> String {
        let base = slugify(text);
        let seen = self.ids.entry(base.clone()).or_default();
        let id = if *seen == 0 {
            base
        } else {
            format!("{base}-{seen}")
        };
        *seen += 1;
        id
    }

    pub(crate) fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    pub(crate) fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Escape HTML special characters.
///
/// ```
/// assert_eq!(mdview_renderer::escape_html("<a href='x'>"), "&lt;a href=&#x27;x&#x27;&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
