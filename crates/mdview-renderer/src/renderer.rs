//! Generic markdown renderer with pluggable backend.

use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::backend::{AlertKind, RenderBackend};
use crate::labels::AdmonitionLabels;
use crate::state::{Capture, HeadingState, TableState, TocEntry, escape_html};
use crate::util::heading_level_to_num;

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Title extracted from first H1 heading (if title extraction was enabled).
    pub title: Option<String>,
    /// Table of contents entries.
    pub toc: Vec<TocEntry>,
}

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait to delegate presentation-specific elements
/// while handling common elements (tables, lists, inline formatting) generically.
/// GFM alerts (`> [!WARNING]`) are rendered as callouts titled with the
/// configured [`AdmonitionLabels`].
///
/// # Example
///
/// ```
/// use mdview_renderer::{HtmlBackend, MarkdownRenderer};
///
/// let result = MarkdownRenderer::<HtmlBackend>::new()
///     .with_title_extraction()
///     .render_markdown("# Hello\n\n**Bold** text");
/// assert_eq!(result.title.as_deref(), Some("Hello"));
/// assert!(result.html.contains("<strong>Bold</strong>"));
/// ```
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    capture: Capture,
    table: TableState,
    heading: HeadingState,
    doc_path: Option<String>,
    labels: AdmonitionLabels,
    /// One entry per open blockquote; `true` when it is rendered as a callout.
    quote_stack: Vec<bool>,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a new renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            capture: Capture::Off,
            table: TableState::default(),
            heading: HeadingState::new(false),
            doc_path: None,
            labels: AdmonitionLabels::default(),
            quote_stack: Vec::new(),
            _backend: PhantomData,
        }
    }

    /// Extract the first H1 heading as the document title.
    ///
    /// The heading is still rendered but left out of the table of contents.
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Path of the document being rendered, used to resolve relative links.
    #[must_use]
    pub fn with_doc_path(mut self, path: impl Into<String>) -> Self {
        self.doc_path = Some(path.into());
        self
    }

    /// Labels used to title GFM alert callouts.
    #[must_use]
    pub fn with_labels(mut self, labels: AdmonitionLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Parser options: GitHub Flavored Markdown (tables, strikethrough,
    /// task lists, alerts) plus math delimiters, so TeX survives inline
    /// parsing.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
            | Options::ENABLE_MATH
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, Self::parser_options());
        self.render(parser)
    }

    /// Render markdown events and return the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        RenderResult {
            html: std::mem::take(&mut self.output),
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if matches!(self.capture, Capture::Image { .. }) {
            // Only the plain text of alt content is kept.
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::InlineMath(tex) => self.math(&tex, false),
            Event::DisplayMath(tex) => self.math(&tex, true),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => B::hard_break(&mut self.output),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written at the end, once the id is known.
                self.heading.start(heading_level_to_num(level));
            }
            Tag::BlockQuote(Some(kind)) => {
                let kind = AlertKind::from(kind).callout_kind();
                let title = escape_html(self.labels.label(kind));
                B::callout_start(kind, &title, &mut self.output);
                self.quote_stack.push(true);
            }
            Tag::BlockQuote(None) => {
                B::blockquote_start(&mut self.output);
                self.quote_stack.push(false);
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    CodeBlockKind::Indented => None,
                };
                self.capture = Capture::Code {
                    lang,
                    content: String::new(),
                };
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => write!(self.output, r#"<ol start="{start}">"#).unwrap(),
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.set_head(true);
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                write!(
                    self.output,
                    "<{}{}>",
                    self.table.cell_tag(),
                    self.table.cell_style()
                )
                .unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link { dest_url, .. } => {
                let href = B::transform_link(&dest_url, self.doc_path.as_deref());
                let open = format!(r#"<a href="{}">"#, escape_html(&href));
                self.push_inline(&open);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.capture = Capture::Image {
                    src: dest_url.into_string(),
                    title: title.into_string(),
                    alt: String::new(),
                };
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.finish() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{html}</h{level}>"#,
                        level = heading.level,
                        id = heading.id,
                        html = heading.html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => {
                if self.quote_stack.pop().unwrap_or(false) {
                    B::callout_end(&mut self.output);
                } else {
                    B::blockquote_end(&mut self.output);
                }
            }
            TagEnd::CodeBlock => {
                if let Capture::Code { lang, content } = self.capture.take() {
                    B::code_block(lang.as_deref(), &content, &mut self.output);
                }
            }
            TagEnd::Image => {
                if let Capture::Image { src, title, alt } = self.capture.take() {
                    let mut img = String::new();
                    B::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.set_head(false);
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                write!(self.output, "</{}>", self.table.cell_tag()).unwrap();
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
        }
    }

    fn text(&mut self, text: &str) {
        if self.capture.push(text) {
            return;
        }
        let escaped = escape_html(text);
        if self.heading.is_active() {
            self.heading.push(text, &escaped);
        } else {
            self.output.push_str(&escaped);
        }
    }

    fn inline_code(&mut self, code: &str) {
        let html = format!("<code>{}</code>", escape_html(code));
        if self.heading.is_active() {
            self.heading.push(code, &html);
        } else {
            self.output.push_str(&html);
        }
    }

    fn math(&mut self, tex: &str, display: bool) {
        let mut html = String::new();
        B::math(tex, display, &mut html);
        if self.heading.is_active() {
            self.heading.push(tex, &html);
        } else {
            self.output.push_str(&html);
        }
    }

    fn soft_break(&mut self) {
        if !self.capture.push("\n") {
            self.push_inline("\n");
        }
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{HtmlBackend, Locale};

    fn render(markdown: &str) -> RenderResult {
        MarkdownRenderer::<HtmlBackend>::new().render_markdown(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render("Hello, world!").html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id() {
        let result = render("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(
            result.toc,
            vec![TocEntry {
                level: 2,
                title: "Section Title".to_owned(),
                id: "section-title".to_owned(),
            }]
        );
    }

    #[test]
    fn test_title_extraction() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_title_extraction()
            .render_markdown("# My Title\n\nSome content\n\n## Section");
        assert_eq!(result.title.as_deref(), Some("My Title"));
        assert!(result.html.contains(r#"<h1 id="my-title">My Title</h1>"#));
        assert_eq!(result.toc.len(), 1);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render("## Install `npm`");
        assert!(result.html.contains("<code>npm</code>"));
        assert_eq!(result.toc[0].title, "Install npm");
    }

    #[test]
    fn test_mermaid_code_block() {
        let result = render("```mermaid\ngraph TD\n  A-->B\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-mermaid\">graph TD\n  A--&gt;B\n</code></pre>"
        );
    }

    #[test]
    fn test_alert_rendered_as_callout() {
        let result = render("> [!WARNING]\n> Be **careful**.");
        assert!(
            result
                .html
                .starts_with(r#"<div class="md-admonition md-admonition-warning"><div class="md-admonition-title">Warning</div>"#)
        );
        assert!(result.html.contains("<strong>careful</strong>"));
        assert!(result.html.ends_with("</div></div>"));
    }

    #[test]
    fn test_alert_uses_localized_label() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_labels(AdmonitionLabels::new(Locale::Zh))
            .render_markdown("> [!CAUTION]\n> 小心");
        assert!(result.html.contains("md-admonition-danger"));
        assert!(result.html.contains("危险"));
    }

    #[test]
    fn test_regular_blockquote() {
        let result = render("> Just a quote");
        assert_eq!(result.html, "<blockquote><p>Just a quote</p></blockquote>");
    }

    #[test]
    fn test_math_survives_emphasis_rules() {
        let result = render("Energy $a_1 * b_2$ and\n\n$$x_i * y_i$$");
        assert!(result.html.contains("$a_1 * b_2$"));
        assert!(result.html.contains("$$x_i * y_i$$"));
        assert!(!result.html.contains("<em>"));
    }

    #[test]
    fn test_image_keeps_relative_src() {
        let result = render("![Plot](img/plot.png)");
        assert_eq!(result.html, r#"<p><img src="img/plot.png" alt="Plot"></p>"#);
    }

    #[test]
    fn test_table_alignment() {
        let result = render("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert!(result.html.contains(r#"<th style="text-align:left">A</th>"#));
        assert!(result.html.contains(r#"<td style="text-align:right">2</td>"#));
    }

    #[test]
    fn test_task_list() {
        let result = render("- [x] done\n- [ ] todo");
        assert!(result.html.contains(r#"<input type="checkbox" checked disabled>"#));
        assert!(result.html.contains(r#"<input type="checkbox" disabled>"#));
    }

    #[test]
    fn test_strikethrough() {
        let result = render("~~gone~~");
        assert_eq!(result.html, "<p><s>gone</s></p>");
    }

    #[test]
    fn test_doc_link_navigation() {
        let result = MarkdownRenderer::<HtmlBackend>::new()
            .with_doc_path("docs/methods/a.md")
            .render_markdown("[next](b.md)");
        assert_eq!(
            result.html,
            r#"<p><a href="?doc=docs%2Fmethods%2Fb.md">next</a></p>"#
        );
    }

    #[test]
    fn test_raw_html_block_passes_through() {
        let result = render("<div class=\"x\">raw</div>");
        assert_eq!(result.html, "<div class=\"x\">raw</div>\n");
    }

    #[test]
    fn test_image_alt_drops_inline_markup() {
        let result = render("![*Fig* 1](a.png)");
        assert_eq!(result.html, r#"<p><img src="a.png" alt="Fig 1"></p>"#);
    }

    #[test]
    fn test_ordered_list_start() {
        let result = render("3. three\n4. four");
        assert!(result.html.starts_with(r#"<ol start="3">"#));
    }
}
