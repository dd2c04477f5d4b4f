//! Static file serving.
//!
//! The viewer's own stylesheet and script are compiled into the binary and
//! served under `/_mdview/`. Every other path outside the routes is served
//! from the documents source directory, so raw Markdown and the assets
//! documents reference resolve against the site root.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::services::ServeDir;

use crate::state::AppState;

const SITE_CSS: &str = include_str!("../assets/site.css");
const SITE_JS: &str = include_str!("../assets/site.js");

/// Create router for static file serving.
///
/// Without a source directory (documents fetched from a remote base URL)
/// unknown paths answer 404.
pub(crate) fn static_router(static_dir: Option<&Path>) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/_mdview/site.css", get(site_css))
        .route("/_mdview/site.js", get(site_js));

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found),
    }
}

async fn site_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], SITE_CSS)
}

async fn site_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SITE_JS,
    )
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
