//! HTML backend for markdown rendering.
//!
//! Produces the markup the viewer page styles: `md-admonition` callout
//! containers, `language-*` classed code blocks, and math left as delimited
//! TeX for the typesetting pass.

use std::borrow::Cow;
use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::document::doc_href;
use crate::state::escape_html;
use crate::util::{join_relative, parent_dir};

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<pre><code class="language-*">` for code blocks
/// - `md-admonition` containers for callouts and GFM alerts
/// - `?doc=` navigation links for relative `.md` links
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn callout_start(kind: &str, title: &str, out: &mut String) {
        write!(
            out,
            r#"<div class="md-admonition md-admonition-{kind}"><div class="md-admonition-title">{title}</div><div class="md-admonition-body">"#
        )
        .unwrap();
    }

    fn callout_end(out: &mut String) {
        out.push_str("</div></div>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }

    fn math(tex: &str, display: bool, out: &mut String) {
        let delim = if display { "$$" } else { "$" };
        write!(out, "{delim}{}{delim}", escape_html(tex)).unwrap();
    }

    fn transform_link<'a>(url: &'a str, doc_path: Option<&str>) -> Cow<'a, str> {
        match doc_path.and_then(|doc| resolve_doc_link(url, doc)) {
            Some(href) => Cow::Owned(href),
            None => Cow::Borrowed(url),
        }
    }
}

/// Resolve a link to another markdown document into viewer navigation.
///
/// - `./sibling.md` in `docs/a/page.md` → `?doc=docs%2Fa%2Fsibling.md`
/// - `../index.md#setup` → `?doc=docs%2Findex.md#setup`
/// - `/docs/b.md` → `?doc=docs%2Fb.md`
///
/// Returns `None` for external links, fragments and non-markdown targets.
fn resolve_doc_link(url: &str, doc_path: &str) -> Option<String> {
    if crate::assets::is_external_like(url) {
        return None;
    }

    let (path, fragment) = match url.find('#') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let path = path.split('?').next().unwrap_or_default();
    if !path.to_ascii_lowercase().ends_with(".md") {
        return None;
    }

    let resolved = match path.strip_prefix('/') {
        Some(absolute) => join_relative("", absolute),
        None => join_relative(parent_dir(doc_path), path),
    };
    Some(format!("{}{fragment}", doc_href(&resolved)))
}
