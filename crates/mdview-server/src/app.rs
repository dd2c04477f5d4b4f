//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/render", get(handlers::render::get_render))
        .route("/api/navigation", get(handlers::navigation::get_navigation));

    let [csp, nosniff, deny] =
        security::HEADERS.map(|(name, value)| security::header_layer(name, value));

    Router::new()
        .route("/", get(handlers::page::get_page))
        .merge(api_routes)
        .merge(static_files::static_router(state.static_dir.as_deref()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(csp)
                .layer(nosniff)
                .layer(deny),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use mdview_enrich::{DiagramConfig, Enrichers};
    use mdview_site::{Navigation, Viewer, ViewerConfig};
    use mdview_storage::{MockStorage, Storage};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;
    use url::Url;

    use super::*;

    fn router(static_dir: Option<PathBuf>) -> Router {
        let storage = MockStorage::new()
            .with_document("docs/index.md", "# Home\n\n!!! tip\n    Start here.\n")
            .with_document("docs/guide.md", "# Guide\n\n## Setup\n\nText.\n")
            .with_document("docs/figure.md", "# Figure\n\n![plot](img/plot.png)\n")
            .with_failure("docs/down.md", 503);
        let config = ViewerConfig {
            root: "docs/".to_owned(),
            default_doc: "docs/index.md".to_owned(),
            ..ViewerConfig::new(Url::parse("http://localhost:7979/").unwrap())
        };
        let viewer = Viewer::new(
            Arc::new(storage) as Arc<dyn Storage>,
            Arc::new(Enrichers::new(DiagramConfig::default(), None)),
            config,
        )
        .with_navigation(Navigation::from_entries([
            ("Home", "docs/index.md", None),
            ("Guide", "docs/guide.md", None),
        ]));

        create_router(Arc::new(AppState {
            viewer: Arc::new(viewer),
            static_dir,
            site_title: "Notes".to_owned(),
            version: "test".to_owned(),
        }))
    }

    async fn send(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_page_renders_default_document() {
        let response = send(router(None), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("content-security-policy"));

        let html = body_text(response).await;
        assert!(html.contains("<title>Home - Notes</title>"));
        assert!(html.contains(r#"<div class="md-admonition-title">Tip</div>"#));
        assert!(html.contains(r#"data-md="docs/index.md" class="active""#));
    }

    #[tokio::test]
    async fn test_page_shows_errors_inline() {
        let response = send(router(None), "/?doc=..%2Fetc%2Fpasswd.md").await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains(r#"<p class="text-danger mb-0">Invalid Markdown document path.</p>"#));
        assert!(!html.contains("class=\"active\""));
    }

    #[tokio::test]
    async fn test_render_api() {
        let response = send(router(None), "/api/render?doc=docs%2Fguide.md").await;
        assert_eq!(response.status(), StatusCode::OK);
        let etag = response.headers()[header::ETAG].clone();

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["path"], "docs/guide.md");
        assert_eq!(json["title"], "Guide");
        assert_eq!(json["toc"][0]["id"], "setup");

        let cached = router(None)
            .oneshot(
                Request::get("/api/render?doc=docs%2Fguide.md")
                    .header(header::IF_NONE_MATCH, etag)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_render_api_error_statuses() {
        let cases = [
            ("/api/render?doc=docs%2Fa.txt", StatusCode::BAD_REQUEST),
            ("/api/render?doc=docs%2Fmissing.md", StatusCode::NOT_FOUND),
            ("/api/render?doc=docs%2Fdown.md", StatusCode::BAD_GATEWAY),
        ];
        for (uri, status) in cases {
            assert_eq!(send(router(None), uri).await.status(), status, "{uri}");
        }
    }

    async fn send_from(router: Router, uri: &str, host: &str) -> Response {
        router
            .oneshot(
                Request::get(uri)
                    .header(header::HOST, host)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_assets_resolve_against_request_host() {
        let page = send_from(router(None), "/?doc=docs%2Ffigure.md", "notes.local:8080").await;
        let html = body_text(page).await;
        assert!(html.contains(r#"src="http://notes.local:8080/docs/img/plot.png""#));
        assert!(!html.contains("localhost:7979"));

        let api = send_from(router(None), "/api/render?doc=docs%2Ffigure.md", "127.0.0.1:7979").await;
        let json: serde_json::Value = serde_json::from_str(&body_text(api).await).unwrap();
        assert!(
            json["html"]
                .as_str()
                .unwrap()
                .contains(r#"src="http://127.0.0.1:7979/docs/img/plot.png""#)
        );
    }

    #[tokio::test]
    async fn test_assets_without_host_use_configured_page() {
        let html = body_text(send(router(None), "/?doc=docs%2Ffigure.md").await).await;
        assert!(html.contains(r#"src="http://localhost:7979/docs/img/plot.png""#));
    }

    #[tokio::test]
    async fn test_navigation_api() {
        let response = send(router(None), "/api/navigation?doc=docs%2Fguide.md").await;
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["groups"][0]["items"][1]["title"], "Guide");
        assert_eq!(json["groups"][0]["items"][1]["active"], true);
        assert_eq!(json["groups"][0]["items"][0]["active"], false);
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/a.svg"), "<svg/>").unwrap();

        let response = send(router(Some(dir.path().to_path_buf())), "/img/a.svg").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<svg/>");

        let missing = send(router(None), "/img/a.svg").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let css = send(router(None), "/_mdview/site.css").await;
        assert_eq!(css.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    }
}
