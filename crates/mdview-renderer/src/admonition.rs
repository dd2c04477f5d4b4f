//! `!!!` callout blocks.
//!
//! A marker line `!!! kind "Optional title"` followed by lines indented one
//! level (four spaces or a tab) forms a callout. The indented body is itself
//! scanned for callouts, converted to HTML, and wrapped in an
//! `md-admonition` container. Everything else passes through untouched, so
//! the output is still document text ready for conversion.
//!
//! ```text
//! !!! warning "Check the units"
//!     Concentrations are in **mM**.
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::backend::RenderBackend;
use crate::converter::MarkupConverter;
use crate::html::HtmlBackend;
use crate::labels::{AdmonitionLabels, DEFAULT_KIND};
use crate::state::escape_html;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!!!\s+([A-Za-z][A-Za-z0-9_-]*)(?:\s+(.*))?$").unwrap());

/// Nesting levels recognised before markers are left as literal text.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// A parsed callout marker and its dedented body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Callout {
    /// Lowercased kind, used in the container class.
    pub kind: String,
    /// Explicit title with surrounding quotes removed; empty when absent.
    pub title: String,
    /// Body text with one indent level removed.
    pub body: String,
}

impl Callout {
    /// Parse a marker line. Returns a callout with an empty body.
    #[must_use]
    pub fn parse_marker(line: &str) -> Option<Self> {
        let caps = MARKER.captures(line)?;
        let kind = caps[1].to_ascii_lowercase();
        let title = caps.get(2).map_or("", |m| m.as_str()).trim();
        Some(Self {
            kind: sanitize_kind(kind),
            title: strip_quotes(title).to_owned(),
            body: String::new(),
        })
    }
}

fn sanitize_kind(kind: String) -> String {
    let valid = kind
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid && !kind.is_empty() {
        kind
    } else {
        DEFAULT_KIND.to_owned()
    }
}

/// Remove one leading and one trailing quote character.
fn strip_quotes(title: &str) -> &str {
    let title = title.strip_prefix(['"', '\'']).unwrap_or(title);
    title.strip_suffix(['"', '\'']).unwrap_or(title)
}

fn indent_len(line: &str) -> Option<usize> {
    if line.starts_with("    ") {
        Some(4)
    } else if line.starts_with('\t') {
        Some(1)
    } else {
        None
    }
}

/// Rewrites callout blocks into HTML containers.
#[derive(Clone, Debug)]
pub struct AdmonitionTransformer {
    labels: AdmonitionLabels,
    max_depth: usize,
}

impl AdmonitionTransformer {
    #[must_use]
    pub fn new(labels: AdmonitionLabels) -> Self {
        Self {
            labels,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply callouts may nest.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace every callout block in `text`. Never fails: text that does not
    /// form a callout is returned line for line.
    ///
    /// ```
    /// use mdview_renderer::{AdmonitionLabels, AdmonitionTransformer, PlainTextConverter};
    ///
    /// let transformer = AdmonitionTransformer::new(AdmonitionLabels::default());
    /// let out = transformer.transform("!!! tip\n    Save often.", &PlainTextConverter);
    /// assert!(out.contains(r#"<div class="md-admonition-title">Tip</div>"#));
    /// assert!(out.contains("Save often."));
    /// ```
    pub fn transform(&self, text: &str, converter: &dyn MarkupConverter) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.transform_at(&normalized, converter, 0)
    }

    /// Like [`transform`](Self::transform), but the text around callouts is
    /// also passed through `converter`.
    ///
    /// Used when the document as a whole is not converted afterwards, so the
    /// surrounding text still needs escaping while container markup stays
    /// intact.
    pub fn transform_all(&self, text: &str, converter: &dyn MarkupConverter) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        if self.max_depth == 0 {
            return converter.convert(&normalized);
        }

        let mut out = String::with_capacity(normalized.len());
        let mut run: Vec<&str> = Vec::new();
        let mut first = true;
        for block in self.blocks(&normalized, converter, 0) {
            match block {
                Block::Text(line) => run.push(line),
                Block::Callout(html) => {
                    if !run.is_empty() {
                        push_piece(&mut out, &mut first, &converter.convert(&run.join("\n")));
                        run.clear();
                    }
                    push_piece(&mut out, &mut first, &html);
                }
            }
        }
        if !run.is_empty() {
            push_piece(&mut out, &mut first, &converter.convert(&run.join("\n")));
        }
        out
    }

    fn transform_at(&self, text: &str, converter: &dyn MarkupConverter, depth: usize) -> String {
        if depth >= self.max_depth {
            tracing::debug!(depth, "Callout nesting limit reached, leaving markers as text");
            return text.to_owned();
        }

        self.blocks(text, converter, depth)
            .into_iter()
            .map(|block| match block {
                Block::Text(line) => line.to_owned(),
                Block::Callout(html) => html,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn blocks<'a>(
        &self,
        text: &'a str,
        converter: &dyn MarkupConverter,
        depth: usize,
    ) -> Vec<Block<'a>> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut output = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let Some(mut callout) = Callout::parse_marker(lines[i]) else {
                output.push(Block::Text(lines[i]));
                i += 1;
                continue;
            };
            i += 1;

            let mut body: Vec<&str> = Vec::new();
            while let Some(line) = lines.get(i) {
                if let Some(indent) = indent_len(line) {
                    body.push(&line[indent..]);
                } else if line.trim().is_empty()
                    && lines.get(i + 1).is_some_and(|next| indent_len(next).is_some())
                {
                    body.push("");
                } else {
                    break;
                }
                i += 1;
            }
            callout.body = body.join("\n").trim_end().to_owned();

            output.push(Block::Callout(self.render(&callout, converter, depth)));
        }

        output
    }

    fn render(&self, callout: &Callout, converter: &dyn MarkupConverter, depth: usize) -> String {
        let body_source = self.transform_at(&callout.body, converter, depth + 1);
        let body_html = fold_blank_lines(&converter.convert(&body_source));

        let title = if callout.title.trim().is_empty() {
            self.labels.label(&callout.kind)
        } else {
            callout.title.trim()
        };

        let mut out = String::with_capacity(body_html.len() + 160);
        HtmlBackend::callout_start(&callout.kind, &escape_html(title), &mut out);
        out.push_str(&body_html);
        HtmlBackend::callout_end(&mut out);
        out
    }
}

impl Default for AdmonitionTransformer {
    fn default() -> Self {
        Self::new(AdmonitionLabels::default())
    }
}

enum Block<'a> {
    Text(&'a str),
    Callout(String),
}

fn push_piece(out: &mut String, first: &mut bool, piece: &str) {
    if !*first {
        out.push_str("<br>");
    }
    *first = false;
    out.push_str(piece);
}

/// Keep a rendered container free of blank lines.
///
/// The container is fed back through Markdown conversion as a raw HTML block,
/// which a blank line would end early. A newline that precedes a blank line is
/// written as `&#10;` instead, which renders the same inside `<pre>` and is
/// plain whitespace elsewhere.
fn fold_blank_lines(html: &str) -> String {
    let mut lines = html.split('\n').peekable();
    let mut out = String::with_capacity(html.len());
    while let Some(line) = lines.next() {
        out.push_str(line);
        match lines.peek() {
            Some(next) if next.trim().is_empty() => out.push_str("&#10;"),
            Some(_) => out.push('\n'),
            None => {}
        }
    }
    out
}
