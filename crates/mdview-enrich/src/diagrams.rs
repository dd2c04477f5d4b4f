//! Mermaid diagram pass.
//!
//! Mermaid code blocks in rendered markup are replaced by diagram hosts,
//! `<div class="mermaid" data-diagram="N">source</div>`. If a page has no
//! such blocks, hosts already present in the markup that have not been
//! processed are picked up instead. The hosts are then rendered to SVG
//! through Kroki; a rendered host is marked `data-processed="true"`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use lol_html::html_content::{ContentType, Element};
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use regex::Regex;

use crate::consts::{DEFAULT_LOAD_TIMEOUT, DEFAULT_TIMEOUT, MERMAID_THEME_VARIABLES};
use crate::kroki::{DiagramRequest, KrokiClient};
use crate::loader::{LazyLibrary, Library, LoadError, LoaderState};
use crate::text::unescape_html;

static SVG_PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(?:<\?xml[^>]*\?>\s*)?(?:<!DOCTYPE[^>]*>\s*)?").unwrap());

/// Diagram pass settings.
#[derive(Debug, Clone)]
pub struct DiagramConfig {
    /// Kroki server. Without one the library never becomes ready.
    pub kroki_url: Option<String>,
    pub load_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            kroki_url: None,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Mermaid `%%{init}%%` directive carrying the fixed theme.
#[must_use]
pub fn mermaid_init_directive() -> String {
    let variables: serde_json::Map<String, serde_json::Value> = MERMAID_THEME_VARIABLES
        .iter()
        .map(|(name, value)| ((*name).to_owned(), serde_json::Value::from(*value)))
        .collect();
    let init = serde_json::json!({
        "startOnLoad": false,
        "securityLevel": "loose",
        "theme": "base",
        "themeVariables": variables,
    });
    format!("%%{{init: {init}}}%%")
}

fn is_mermaid_code(el: &Element<'_, '_>) -> bool {
    let has_class = el.get_attribute("class").is_some_and(|classes| {
        classes
            .split_whitespace()
            .any(|class| class == "language-mermaid" || class == "lang-mermaid")
    });
    has_class || el.get_attribute("data-lang").as_deref() == Some("mermaid")
}

/// Where the hosts of a page come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum HostOrigin {
    /// Mermaid code blocks, each `pre` replaced by a new host.
    #[default]
    CodeBlocks,
    /// Unprocessed `div.mermaid` elements already in the markup, rendered in
    /// place.
    Existing,
}

/// Elements seen by one scan, and which of them are hosts.
#[derive(Debug, Default)]
struct Scan {
    /// Elements of the scanned kind seen so far.
    seen: usize,
    /// Ordinal of each host among those elements.
    positions: Vec<usize>,
    sources: Vec<String>,
    /// Host receiving text, if the current element is one.
    current: Option<usize>,
}

impl Scan {
    fn open_host(&mut self, position: usize) {
        self.positions.push(position);
        self.sources.push(String::new());
        self.current = Some(self.sources.len() - 1);
    }

    fn push_text(&mut self, text: &str) {
        if let Some(index) = self.current {
            self.sources[index].push_str(text);
        }
    }
}

/// Diagram hosts found in a page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiagramHosts {
    html: String,
    origin: HostOrigin,
    /// Ordinal of each host among the `pre` (or `div.mermaid`) elements.
    positions: Vec<usize>,
    /// Host text content (still HTML-escaped), by host index.
    sources: Vec<String>,
}

impl DiagramHosts {
    /// Find the hosts in `html`: Mermaid code blocks, or when there are none,
    /// unprocessed `div.mermaid` elements.
    #[must_use]
    pub fn collect(html: &str) -> Self {
        let blocks = RefCell::new(Scan::default());
        let existing = RefCell::new(Scan::default());

        let result = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("pre", |_| {
                        blocks.borrow_mut().seen += 1;
                        Ok(())
                    }),
                    element!("pre > code", |el: &mut Element<'_, '_>| {
                        let mut scan = blocks.borrow_mut();
                        scan.current = None;
                        let position = scan.seen.saturating_sub(1);
                        // One host per `pre`, from its first code element.
                        if is_mermaid_code(el) && scan.positions.last() != Some(&position) {
                            scan.open_host(position);
                        }
                        Ok(())
                    }),
                    text!("pre > code", |chunk| {
                        blocks.borrow_mut().push_text(chunk.as_str());
                        Ok(())
                    }),
                    element!("div.mermaid", |el: &mut Element<'_, '_>| {
                        let mut scan = existing.borrow_mut();
                        scan.current = None;
                        let position = scan.seen;
                        scan.seen += 1;
                        if !el.has_attribute("data-processed") {
                            scan.open_host(position);
                        }
                        Ok(())
                    }),
                    text!("div.mermaid", |chunk| {
                        existing.borrow_mut().push_text(chunk.as_str());
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        );
        if let Err(error) = result {
            tracing::warn!(%error, "Cannot scan markup for diagrams");
            return Self {
                html: html.to_owned(),
                ..Self::default()
            };
        }

        let blocks = blocks.into_inner();
        let (origin, scan) = if blocks.positions.is_empty() {
            (HostOrigin::Existing, existing.into_inner())
        } else {
            (HostOrigin::CodeBlocks, blocks)
        };
        Self {
            html: html.to_owned(),
            origin,
            positions: scan.positions,
            sources: scan.sources,
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Requests for the renderer, with sources unescaped and themed.
    #[must_use]
    pub fn requests(&self) -> Vec<DiagramRequest> {
        let init = mermaid_init_directive();
        self.sources
            .iter()
            .enumerate()
            .map(|(index, source)| DiagramRequest {
                index,
                source: format!("{init}\n{}", unescape_html(source).trim()),
            })
            .collect()
    }

    /// Rebuild the markup. Hosts with an entry in `rendered` get the SVG and
    /// `data-processed="true"`, the rest keep their source text.
    ///
    /// Code blocks become `<div class="mermaid" data-diagram="N">` hosts;
    /// existing hosts keep their attributes and gain `data-diagram`.
    #[must_use]
    pub fn assemble(&self, rendered: &HashMap<usize, String>) -> String {
        if self.is_empty() {
            return self.html.clone();
        }

        let mut seen = 0;
        let mut host_at = move || {
            let ordinal = seen;
            seen += 1;
            self.positions.binary_search(&ordinal).ok()
        };

        let handler = match self.origin {
            HostOrigin::CodeBlocks => element!("pre", |el: &mut Element<'_, '_>| {
                if let Some(index) = host_at() {
                    el.replace(&self.host_markup(index, rendered.get(&index)), ContentType::Html);
                }
                Ok(())
            }),
            HostOrigin::Existing => element!("div.mermaid", |el: &mut Element<'_, '_>| {
                if let Some(index) = host_at() {
                    el.set_attribute("data-diagram", &index.to_string())?;
                    if let Some(svg) = rendered.get(&index) {
                        el.set_attribute("data-processed", "true")?;
                        el.set_inner_content(svg, ContentType::Html);
                    }
                }
                Ok(())
            }),
        };

        let result = rewrite_str(
            &self.html,
            RewriteStrSettings {
                element_content_handlers: vec![handler],
                ..RewriteStrSettings::default()
            },
        );
        result.unwrap_or_else(|error| {
            tracing::warn!(%error, "Cannot insert diagrams, keeping markup");
            self.html.clone()
        })
    }

    fn host_markup(&self, index: usize, svg: Option<&String>) -> String {
        match svg {
            Some(svg) => format!(
                r#"<div class="mermaid" data-diagram="{index}" data-processed="true">{svg}</div>"#
            ),
            None => format!(
                r#"<div class="mermaid" data-diagram="{index}">{}</div>"#,
                self.sources[index]
            ),
        }
    }
}

/// Strip the XML declaration and doctype so the SVG can be inlined.
fn inline_svg(svg: &str) -> String {
    SVG_PROLOG.replace(svg, "").trim_end().to_owned()
}

/// Loads the Kroki connection after a health probe.
pub struct DiagramLibrary {
    config: DiagramConfig,
}

impl Library for DiagramLibrary {
    type Instance = KrokiClient;
    const NAME: &'static str = "mermaid";

    async fn load(&self) -> Result<KrokiClient, LoadError> {
        let Some(url) = self.config.kroki_url.clone() else {
            return Err(LoadError::NotConfigured("diagrams.kroki_url"));
        };
        let client = KrokiClient::new(&url, self.config.request_timeout);

        let probe = client.clone();
        tokio::task::spawn_blocking(move || probe.health())
            .await
            .map_err(|e| LoadError::Unavailable {
                library: Self::NAME,
                reason: e.to_string(),
            })?
            .map_err(|reason| LoadError::Unavailable {
                library: Self::NAME,
                reason,
            })?;
        Ok(client)
    }
}

/// The diagram pass with its lazily loaded renderer.
pub struct DiagramEnricher {
    loader: LazyLibrary<DiagramLibrary>,
}

impl DiagramEnricher {
    pub fn new(config: DiagramConfig) -> Self {
        let timeout = config.load_timeout;
        Self {
            loader: LazyLibrary::new(DiagramLibrary { config }, timeout),
        }
    }

    pub fn state(&self) -> LoaderState {
        self.loader.state()
    }

    /// Convert diagram blocks to hosts and render them.
    ///
    /// Hosts are created even when the renderer is unavailable; they then
    /// keep their source text.
    pub async fn apply_to(&self, html: &str) -> String {
        let hosts = DiagramHosts::collect(html);
        if hosts.is_empty() {
            return html.to_owned();
        }

        let Some(client) = self.loader.ensure_ready().await else {
            return hosts.assemble(&HashMap::new());
        };

        let requests = hosts.requests();
        let count = requests.len();
        let outcome =
            tokio::task::spawn_blocking(move || client.render_all(&requests)).await;

        let rendered = match outcome {
            Ok((rendered, errors)) => {
                for error in &errors {
                    tracing::warn!(%error, "Diagram left as source");
                }
                tracing::debug!(count, failed = errors.len(), "Rendered diagrams");
                rendered
                    .into_iter()
                    .map(|r| (r.index, inline_svg(&r.svg)))
                    .collect()
            }
            Err(error) => {
                tracing::warn!(%error, "Diagram rendering task failed");
                HashMap::new()
            }
        };
        hosts.assemble(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_code_blocks_become_hosts() {
        let html = concat!(
            "<p>a</p>",
            r#"<pre><code class="language-mermaid">graph TD&#10;A--&gt;B</code></pre>"#,
            r#"<pre><code class="language-rust">fn x() {}</code></pre>"#,
            r#"<pre><code data-lang="mermaid">pie</code></pre>"#,
        );
        let hosts = DiagramHosts::collect(html);
        assert_eq!(hosts.len(), 2);
        assert_eq!(
            hosts.assemble(&HashMap::new()),
            concat!(
                "<p>a</p>",
                r#"<div class="mermaid" data-diagram="0">graph TD&#10;A--&gt;B</div>"#,
                r#"<pre><code class="language-rust">fn x() {}</code></pre>"#,
                r#"<div class="mermaid" data-diagram="1">pie</div>"#,
            )
        );
    }

    #[test]
    fn test_lang_class_variant() {
        let hosts = DiagramHosts::collect(r#"<pre><code class="lang-mermaid x">pie</code></pre>"#);
        assert_eq!(hosts.len(), 1);
    }

    #[test]
    fn test_existing_hosts_used_when_nothing_converted() {
        let html = concat!(
            r#"<div class="mermaid">graph LR; A--&gt;B</div>"#,
            r#"<div class="mermaid" data-processed="true"><svg></svg></div>"#,
            r#"<div class="note">plain</div>"#,
        );
        let hosts = DiagramHosts::collect(html);
        assert_eq!(hosts.len(), 1);

        let mut rendered = HashMap::new();
        rendered.insert(0, "<svg>ok</svg>".to_owned());
        assert_eq!(
            hosts.assemble(&rendered),
            concat!(
                r#"<div class="mermaid" data-diagram="0" data-processed="true"><svg>ok</svg></div>"#,
                r#"<div class="mermaid" data-processed="true"><svg></svg></div>"#,
                r#"<div class="note">plain</div>"#,
            )
        );
    }

    #[test]
    fn test_existing_hosts_ignored_when_blocks_converted() {
        let html = concat!(
            r#"<div class="mermaid">old</div>"#,
            r#"<pre><code class="language-mermaid">new</code></pre>"#,
        );
        let hosts = DiagramHosts::collect(html);
        assert_eq!(hosts.len(), 1);
        assert!(hosts.assemble(&HashMap::new()).starts_with(r#"<div class="mermaid">old</div>"#));
    }

    #[test]
    fn test_existing_host_keeps_its_attributes() {
        let html = r#"<div class="mermaid wide" id="flow" style="width:50%">pie</div>"#;
        let hosts = DiagramHosts::collect(html);

        let mut rendered = HashMap::new();
        rendered.insert(0, "<svg/>".to_owned());
        assert_eq!(
            hosts.assemble(&rendered),
            r#"<div class="mermaid wide" id="flow" style="width:50%" data-diagram="0" data-processed="true"><svg/></div>"#
        );
        assert_eq!(
            hosts.assemble(&HashMap::new()),
            r#"<div class="mermaid wide" id="flow" style="width:50%" data-diagram="0">pie</div>"#
        );
    }

    #[test]
    fn test_markup_without_hosts_is_kept() {
        let html = r#"<pre><code>plain</code></pre><div class="note">x</div>"#;
        let hosts = DiagramHosts::collect(html);
        assert!(hosts.is_empty());
        assert_eq!(hosts.assemble(&HashMap::new()), html);
    }

    #[test]
    fn test_requests_are_unescaped_and_themed() {
        let hosts =
            DiagramHosts::collect(r#"<pre><code class="language-mermaid">A--&gt;B&#10;</code></pre>"#);
        let requests = hosts.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].source.starts_with("%%{init: {"));
        assert!(requests[0].source.ends_with("}}%%\nA-->B"));
    }

    #[test]
    fn test_init_directive_carries_theme() {
        let init = mermaid_init_directive();
        assert!(init.contains(r#""securityLevel":"loose""#));
        assert!(init.contains(r#""theme":"base""#));
        assert!(init.contains(r##""primaryColor":"#e8f3f7""##));
        assert!(init.contains(r#""fontFamily":"HarmonyOS Sans Black, sans-serif""#));
    }

    #[test]
    fn test_inline_svg_strips_prolog() {
        assert_eq!(
            inline_svg("<?xml version=\"1.0\"?>\n<!DOCTYPE svg>\n<svg/>\n"),
            "<svg/>"
        );
    }

    /// A Kroki stand-in on an ephemeral port.
    async fn stub_kroki() -> String {
        use axum::Router;
        use axum::routing::{get, post};

        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/mermaid/svg",
                post(|body: String| async move {
                    let id = if body.ends_with("A-->B") { "ab" } else { "other" };
                    format!("<?xml version=\"1.0\"?>\n<svg id=\"{id}\"></svg>\n")
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_renders_mermaid_blocks_through_kroki() {
        let enricher = DiagramEnricher::new(DiagramConfig {
            kroki_url: Some(stub_kroki().await),
            ..DiagramConfig::default()
        });
        let html = concat!(
            "<h2>Flow</h2>",
            r#"<pre><code class="language-mermaid">graph TD&#10;A--&gt;B</code></pre>"#,
            r#"<pre><code class="language-rust">fn main() {}</code></pre>"#,
        );

        let out = enricher.apply_to(html).await;
        assert_eq!(enricher.state(), LoaderState::Ready);
        assert_eq!(
            out,
            concat!(
                "<h2>Flow</h2>",
                r#"<div class="mermaid" data-diagram="0" data-processed="true"><svg id="ab"></svg></div>"#,
                r#"<pre><code class="language-rust">fn main() {}</code></pre>"#,
            )
        );
    }

    #[tokio::test]
    async fn test_without_kroki_hosts_keep_source() {
        let enricher = DiagramEnricher::new(DiagramConfig::default());
        let out = enricher
            .apply_to(r#"<pre><code class="language-mermaid">pie</code></pre>"#)
            .await;
        assert_eq!(out, r#"<div class="mermaid" data-diagram="0">pie</div>"#);
        assert_eq!(enricher.state(), LoaderState::Failed);
    }

    #[tokio::test]
    async fn test_no_hosts_skips_loading() {
        let enricher = DiagramEnricher::new(DiagramConfig::default());
        assert_eq!(enricher.apply_to("<p>x</p>").await, "<p>x</p>");
        assert_eq!(enricher.state(), LoaderState::Unloaded);
    }
}
