//! The render pipeline.
//!
//! One render runs these steps in order:
//! 1. validate the requested document path
//! 2. fetch the raw text from storage
//! 3. rewrite `!!!` callouts into container markup
//! 4. convert the text to HTML
//! 5. resolve relative asset references against the document
//! 6. run the enrichment passes (diagrams, then math)
//!
//! Nothing is cached between renders; every request fetches the document
//! again.

use std::sync::Arc;
use std::time::Instant;

use mdview_enrich::Enrichers;
use mdview_renderer::{
    AdmonitionLabels, AdmonitionTransformer, AssetRewriter, DEFAULT_MAX_DEPTH, DocPath, Locale,
    MarkdownConverter, PlainTextConverter, TocEntry,
};
use mdview_storage::Storage;
use url::Url;

use crate::error::ViewError;
use crate::location::requested_doc;
use crate::nav::Navigation;

/// Settings for a [`Viewer`].
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Required document path prefix; empty allows any path.
    pub root: String,
    /// Document shown when a request names none.
    pub default_doc: String,
    /// Base for asset resolution when a render has no page location.
    pub page_url: Url,
    /// Public URL of the viewer page. When set it replaces the location a
    /// request came from.
    pub public_url: Option<Url>,
    /// Convert Markdown; when off, documents are shown as escaped text.
    pub markdown: bool,
    /// Language of callout labels and error messages.
    pub locale: Locale,
    pub labels: AdmonitionLabels,
    pub max_depth: usize,
}

impl ViewerConfig {
    pub fn new(page_url: Url) -> Self {
        Self {
            root: String::new(),
            default_doc: String::new(),
            page_url,
            public_url: None,
            markdown: true,
            locale: Locale::En,
            labels: AdmonitionLabels::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A rendered document.
#[derive(Clone, Debug)]
pub struct View {
    pub doc: DocPath,
    /// Text of the first H1 heading.
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
    pub html: String,
}

/// Everything the viewer page shows for one request.
///
/// Errors are already turned into inline markup; `doc` is `None` then, and
/// no navigation item is active.
#[derive(Clone, Debug)]
pub struct ViewerPage {
    pub doc: Option<DocPath>,
    pub title: Option<String>,
    pub toc: Vec<TocEntry>,
    pub content_html: String,
    pub nav: Navigation,
}

/// Fetches, renders and enriches documents.
pub struct Viewer {
    storage: Arc<dyn Storage>,
    enrichers: Arc<Enrichers>,
    transformer: AdmonitionTransformer,
    navigation: Navigation,
    config: ViewerConfig,
}

impl Viewer {
    pub fn new(storage: Arc<dyn Storage>, enrichers: Arc<Enrichers>, config: ViewerConfig) -> Self {
        let transformer =
            AdmonitionTransformer::new(config.labels.clone()).with_max_depth(config.max_depth);
        Self {
            storage,
            enrichers,
            transformer,
            navigation: Navigation::default(),
            config,
        }
    }

    #[must_use]
    pub fn with_navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = navigation;
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn enrichers(&self) -> &Arc<Enrichers> {
        &self.enrichers
    }

    /// The raw document identifier for a request URL's query and fragment.
    pub fn requested(&self, query: Option<&str>, fragment: Option<&str>) -> String {
        requested_doc(query, fragment, &self.config.default_doc)
    }

    /// Validate a raw identifier against the configured root.
    pub fn parse_doc(&self, raw: &str) -> Result<DocPath, ViewError> {
        Ok(DocPath::parse(raw, &self.config.root)?)
    }

    /// The URL relative asset references resolve against: the public URL
    /// if configured, else the page the request came from, else the default
    /// page URL.
    pub fn asset_base<'a>(&'a self, location: Option<&'a Url>) -> &'a Url {
        self.config
            .public_url
            .as_ref()
            .or(location)
            .unwrap_or(&self.config.page_url)
    }

    /// Render a document: fetch, transform, convert, rewrite, enrich.
    ///
    /// `location` is the URL of the page the markup will be shown on.
    pub async fn render(&self, raw: &str, location: Option<&Url>) -> Result<View, ViewError> {
        let started = Instant::now();
        let doc = self.parse_doc(raw)?;
        let text = self.fetch(&doc).await?;

        let mut view = self.render_text(doc, &text, self.asset_base(location));
        view.html = self.enrichers.apply(&view.html).await;

        tracing::info!(
            doc = %view.doc,
            elapsed_ms = started.elapsed().as_millis(),
            "Rendered document"
        );
        Ok(view)
    }

    /// The synchronous part of a render: transform, convert, rewrite.
    pub fn render_text(&self, doc: DocPath, text: &str, page_url: &Url) -> View {
        let (html, title, toc) = if self.config.markdown {
            let converter =
                MarkdownConverter::new(self.config.labels.clone()).for_document(doc.as_str());
            let transformed = self.transformer.transform(text, &converter);
            let result = converter.render(&transformed);
            (result.html, result.title, result.toc)
        } else {
            let html = self.transformer.transform_all(text, &PlainTextConverter);
            (html, None, Vec::new())
        };

        let html = AssetRewriter::new(page_url.clone()).rewrite(&html, doc.as_str());
        View {
            doc,
            title,
            toc,
            html,
        }
    }

    /// Render the page content for a raw identifier. Never fails: errors
    /// become inline markup and clear the active navigation item.
    pub async fn page(&self, raw: &str, location: Option<&Url>) -> ViewerPage {
        match self.render(raw, location).await {
            Ok(view) => ViewerPage {
                nav: self.navigation.with_active(Some(view.doc.as_str())),
                doc: Some(view.doc),
                title: view.title,
                toc: view.toc,
                content_html: view.html,
            },
            Err(error) => {
                tracing::warn!(doc = raw, %error, "Document not shown");
                ViewerPage {
                    nav: self.navigation.with_active(None),
                    doc: None,
                    title: None,
                    toc: Vec::new(),
                    content_html: error.to_inline_html(self.config.locale),
                }
            }
        }
    }

    async fn fetch(&self, doc: &DocPath) -> Result<String, ViewError> {
        let storage = Arc::clone(&self.storage);
        let path = doc.as_str().to_owned();
        let read_path = path.clone();

        match tokio::task::spawn_blocking(move || storage.read(&read_path)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(source)) => Err(ViewError::Fetch { path, source }),
            Err(e) => Err(ViewError::Task {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use mdview_enrich::{DiagramConfig, MathConfig};
    use mdview_renderer::DocPathError;
    use mdview_storage::MockStorage;
    use pretty_assertions::assert_eq;

    use super::*;

    fn viewer(storage: MockStorage, math: bool) -> (Viewer, Arc<MockStorage>) {
        let storage = Arc::new(storage);
        let enrichers = Arc::new(Enrichers::new(
            DiagramConfig::default(),
            math.then(MathConfig::default),
        ));
        let config = ViewerConfig {
            root: "docs/".to_owned(),
            default_doc: "docs/index.md".to_owned(),
            ..ViewerConfig::new(Url::parse("https://lab.example/site/index.html").unwrap())
        };
        let nav = Navigation::from_entries([
            ("Overview", "docs/index.md", None),
            ("Guide", "docs/methods/guide.md", Some("Methods".to_owned())),
        ]);
        let viewer = Viewer::new(Arc::clone(&storage) as Arc<dyn Storage>, enrichers, config)
            .with_navigation(nav);
        (viewer, storage)
    }

    #[tokio::test]
    async fn test_render_full_pipeline() {
        let text = "# Guide\n\n!!! warning \"Careful\"\n    Check ![fig](img/a.png) first.\n\nSee [next](next.md).\n";
        let (viewer, _) = viewer(
            MockStorage::new().with_document("docs/methods/guide.md", text),
            false,
        );

        let view = viewer.render("docs/methods/guide.md", None).await.unwrap();
        assert_eq!(view.doc.as_str(), "docs/methods/guide.md");
        assert_eq!(view.title.as_deref(), Some("Guide"));
        assert!(view.html.contains(
            r#"<div class="md-admonition md-admonition-warning"><div class="md-admonition-title">Careful</div>"#
        ));
        assert!(view.html.contains(r#"src="https://lab.example/site/docs/methods/img/a.png""#));
        assert!(view.html.contains(r#"href="?doc=docs%2Fmethods%2Fnext.md""#));
    }

    #[tokio::test]
    async fn test_assets_follow_request_location() {
        let text = "![fig](img/a.png)\n";
        let (viewer, _) = viewer(MockStorage::new().with_document("docs/a.md", text), false);
        let location = Url::parse("http://notes.local:8080/").unwrap();

        let view = viewer.render("docs/a.md", Some(&location)).await.unwrap();
        assert!(view.html.contains(r#"src="http://notes.local:8080/docs/img/a.png""#));

        let view = viewer.render("docs/a.md", None).await.unwrap();
        assert!(view.html.contains(r#"src="https://lab.example/site/docs/img/a.png""#));
    }

    #[test]
    fn test_public_url_overrides_location() {
        let (mut viewer, _) = viewer(MockStorage::new(), false);
        let location = Url::parse("http://0.0.0.0:7979/").unwrap();
        assert_eq!(viewer.asset_base(Some(&location)), &location);

        let public = Url::parse("https://notes.example/").unwrap();
        viewer.config.public_url = Some(public.clone());
        assert_eq!(viewer.asset_base(Some(&location)), &public);
        assert_eq!(viewer.asset_base(None), &public);
    }

    #[tokio::test]
    async fn test_invalid_path_is_not_fetched() {
        let (viewer, storage) = viewer(MockStorage::new(), false);

        for raw in ["", "docs/../secret.md", "docs/a.txt", "other/a.md"] {
            let error = viewer.render(raw, None).await.unwrap_err();
            assert!(matches!(error, ViewError::InvalidPath(_)), "{raw}");
        }
        assert!(matches!(
            viewer.render("other/a.md", None).await,
            Err(ViewError::InvalidPath(DocPathError::OutsideRoot { .. }))
        ));
        assert_eq!(storage.read_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let (viewer, _) = viewer(MockStorage::new().with_failure("docs/a.md", 500), false);
        let error = viewer.render("docs/a.md", None).await.unwrap_err();
        assert!(matches!(error, ViewError::Fetch { ref path, .. } if path == "docs/a.md"));
        assert!(!error.is_not_found());
    }

    #[tokio::test]
    async fn test_page_marks_active_item() {
        let (viewer, _) = viewer(
            MockStorage::new().with_document("docs/methods/guide.md", "# Guide\n\nBody."),
            false,
        );

        let page = viewer.page("docs/methods/guide.md", None).await;
        assert_eq!(page.doc.as_ref().map(DocPath::as_str), Some("docs/methods/guide.md"));
        assert_eq!(page.nav.active().map(|item| item.title.as_str()), Some("Guide"));
        assert!(page.nav.groups[1].expanded);
    }

    #[tokio::test]
    async fn test_page_errors_render_inline() {
        let (viewer, _) = viewer(MockStorage::new(), false);

        let invalid = viewer.page("../x.md", None).await;
        assert_eq!(
            invalid.content_html,
            r#"<p class="text-danger mb-0">Invalid Markdown document path.</p>"#
        );
        assert!(invalid.nav.active().is_none());
        assert!(invalid.doc.is_none());

        let missing = viewer.page("docs/missing.md", None).await;
        assert_eq!(
            missing.content_html,
            r#"<p class="text-danger mb-0">Failed to load: cannot read file: docs/missing.md</p>"#
        );
        assert!(missing.nav.active().is_none());
    }

    #[tokio::test]
    async fn test_math_enrichment_runs_after_conversion() {
        let (viewer, _) = viewer(
            MockStorage::new().with_document("docs/index.md", "Euler: $e^{i\\pi}$\n\n```\n$not math$\n```\n"),
            true,
        );

        let view = viewer.render("docs/index.md", None).await.unwrap();
        assert!(view.html.contains(r#"<span class="math math-inline" data-math-source="$e^{i\pi}$">"#));
        assert!(view.html.contains("<code>$not math$\n</code>"));
    }

    #[tokio::test]
    async fn test_plain_text_mode() {
        let storage = Arc::new(MockStorage::new().with_document("docs/a.md", "a <b>\n!!! tip\n    body"));
        let config = ViewerConfig {
            markdown: false,
            ..ViewerConfig::new(Url::parse("http://localhost:7979/").unwrap())
        };
        let viewer = Viewer::new(
            storage,
            Arc::new(Enrichers::new(DiagramConfig::default(), None)),
            config,
        );

        let view = viewer.render("docs/a.md", None).await.unwrap();
        assert!(view.html.starts_with("a &lt;b&gt;<br>"));
        assert!(view.html.contains(r#"<div class="md-admonition-title">Tip</div>"#));
        assert!(view.title.is_none());
    }

    #[test]
    fn test_requested_uses_default() {
        let (viewer, _) = viewer(MockStorage::new(), false);
        assert_eq!(viewer.requested(None, None), "docs/index.md");
        assert_eq!(viewer.requested(Some("doc=docs%2Fa.md"), None), "docs/a.md");
    }
}
