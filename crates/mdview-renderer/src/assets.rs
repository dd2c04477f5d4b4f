//! Asset URL rewriting for rendered documents.
//!
//! Rendered markup is inserted into a page whose URL differs from the
//! document's, so relative `src`/`srcset` references on `img` and `source`
//! elements are resolved in two steps: the document path against the page
//! URL, then the asset against the document.

use std::sync::LazyLock;

use lol_html::html_content::Element;
use lol_html::{HandlerResult, RewriteStrSettings, element, rewrite_str};
use regex::Regex;
use url::Url;

static EXTERNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*:|//|#)").unwrap());

/// Whether `url` has a scheme, is protocol-relative, or is a fragment.
#[must_use]
pub fn is_external_like(url: &str) -> bool {
    EXTERNAL.is_match(url)
}

/// Resolve one asset reference found in the document at `doc_path`.
///
/// External, fragment, `data:` and empty references are returned trimmed but
/// otherwise unchanged, as is anything that fails to resolve.
///
/// ```
/// use url::Url;
/// use mdview_renderer::resolve_asset_url;
///
/// let page = Url::parse("https://lab.example/viewer/?doc=docs%2Fa.md").unwrap();
/// assert_eq!(
///     resolve_asset_url("img/plot.png", "docs/a.md", &page),
///     "https://lab.example/viewer/docs/img/plot.png"
/// );
/// assert_eq!(resolve_asset_url("#fig-1", "docs/a.md", &page), "#fig-1");
/// ```
#[must_use]
pub fn resolve_asset_url(raw: &str, doc_path: &str, page_url: &Url) -> String {
    let raw = raw.trim();
    if raw.is_empty() || is_external_like(raw) || raw.starts_with("data:") {
        return raw.to_owned();
    }
    match page_url.join(doc_path).and_then(|doc| doc.join(raw)) {
        Ok(resolved) => resolved.into(),
        Err(err) => {
            tracing::debug!(raw, doc_path, %err, "Asset reference left unresolved");
            raw.to_owned()
        }
    }
}

/// Resolve every URL of a `srcset` value, keeping descriptors verbatim.
#[must_use]
pub fn rewrite_srcset(srcset: &str, doc_path: &str, page_url: &Url) -> String {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next().unwrap_or_default();
            let descriptor = parts.collect::<Vec<_>>().join(" ");
            let resolved = resolve_asset_url(url, doc_path, page_url);
            if descriptor.is_empty() {
                resolved
            } else {
                format!("{resolved} {descriptor}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrites relative asset references against the page the markup is shown on.
#[derive(Clone, Debug)]
pub struct AssetRewriter {
    page_url: Url,
}

impl AssetRewriter {
    #[must_use]
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }

    #[must_use]
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Rewrite `src` and `srcset` of every `img` and `source` element.
    ///
    /// If the markup cannot be processed it is returned unchanged.
    pub fn rewrite(&self, html: &str, doc_path: &str) -> String {
        if html.is_empty() {
            return String::new();
        }
        let page = &self.page_url;

        let result = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("img[src]", |el| rewrite_src(el, doc_path, page)),
                    element!("source[src]", |el| rewrite_src(el, doc_path, page)),
                    element!("img[srcset]", |el| rewrite_srcset_attr(el, doc_path, page)),
                    element!("source[srcset]", |el| rewrite_srcset_attr(el, doc_path, page)),
                ],
                ..RewriteStrSettings::default()
            },
        );

        match result {
            Ok(rewritten) => rewritten,
            Err(err) => {
                tracing::warn!(doc_path, error = %err, "Asset rewrite failed, keeping markup");
                html.to_owned()
            }
        }
    }
}

fn rewrite_src(el: &mut Element<'_, '_>, doc_path: &str, page: &Url) -> HandlerResult {
    if let Some(value) = el.get_attribute("src") {
        let next = resolve_asset_url(&value, doc_path, page);
        if !next.is_empty() {
            el.set_attribute("src", &next)?;
        }
    }
    Ok(())
}

fn rewrite_srcset_attr(el: &mut Element<'_, '_>, doc_path: &str, page: &Url) -> HandlerResult {
    if let Some(value) = el.get_attribute("srcset").filter(|v| !v.is_empty()) {
        el.set_attribute("srcset", &rewrite_srcset(&value, doc_path, page))?;
    }
    Ok(())
}
