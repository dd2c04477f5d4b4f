//! The viewer page.
//!
//! Server-rendered HTML: the sidebar, the document and its table of
//! contents. Render errors are shown inline in the content area, so this
//! handler always answers 200.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::HeaderMap;
use axum::response::Html;
use mdview_renderer::{Locale, TocEntry, escape_html};
use mdview_site::{NavItem, Navigation, ViewerPage};

use super::page_location;
use crate::state::AppState;

/// Handle GET /.
pub(crate) async fn get_page(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Html<String> {
    let raw = state.viewer.requested(query.as_deref(), None);
    let location = page_location(&headers);
    let page = state.viewer.page(&raw, location.as_ref()).await;
    Html(render_page(
        &page,
        &state.site_title,
        state.viewer.config().locale,
    ))
}

fn render_page(page: &ViewerPage, site_title: &str, locale: Locale) -> String {
    let title = match &page.title {
        Some(doc_title) => format!("{} - {}", escape_html(doc_title), escape_html(site_title)),
        None => escape_html(site_title),
    };

    let mut out = String::with_capacity(page.content_html.len() + 4096);
    writeln!(
        out,
        "<!DOCTYPE html>\n\
         <html lang=\"{lang}\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/_mdview/site.css\">\n\
         <script src=\"/_mdview/site.js\"></script>\n\
         </head>\n\
         <body>",
        lang = locale.tag(),
    )
    .unwrap();

    write_nav(&page.nav, &mut out);
    out.push_str("<main>\n<article id=\"content\" class=\"markdown-body\">\n");
    out.push_str(&page.content_html);
    out.push_str("\n</article>\n</main>\n");
    write_toc(&page.toc, &mut out);
    out.push_str("</body>\n</html>\n");
    out
}

fn write_nav(nav: &Navigation, out: &mut String) {
    out.push_str("<nav class=\"sidebar\">\n");
    for group in &nav.groups {
        match &group.name {
            Some(name) => {
                let open = if group.expanded { " open" } else { "" };
                writeln!(
                    out,
                    "<details class=\"nav-group\"{open}><summary>{}</summary>",
                    escape_html(name)
                )
                .unwrap();
                write_items(&group.items, out);
                out.push_str("</details>\n");
            }
            None => write_items(&group.items, out),
        }
    }
    out.push_str("</nav>\n");
}

fn write_items(items: &[NavItem], out: &mut String) {
    out.push_str("<ul>\n");
    for item in items {
        let active = if item.active {
            " class=\"active\" aria-current=\"page\""
        } else {
            ""
        };
        writeln!(
            out,
            "<li><a href=\"{}\" data-md=\"{}\"{active}>{}</a></li>",
            escape_html(&item.href),
            escape_html(&item.doc),
            escape_html(&item.title),
        )
        .unwrap();
    }
    out.push_str("</ul>\n");
}

fn write_toc(toc: &[TocEntry], out: &mut String) {
    // Top-level headings are titles, not sections.
    let entries: Vec<&TocEntry> = toc.iter().filter(|entry| entry.level > 1).collect();
    if entries.is_empty() {
        return;
    }

    out.push_str("<aside class=\"toc\">\n<ul>\n");
    for entry in entries {
        writeln!(
            out,
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape_html(&entry.id),
            escape_html(&entry.title),
        )
        .unwrap();
    }
    out.push_str("</ul>\n</aside>\n");
}
