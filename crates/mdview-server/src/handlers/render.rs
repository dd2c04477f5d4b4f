//! Render API endpoint.
//!
//! Returns a rendered document as JSON: path, title, table of contents and
//! the enriched HTML.

use std::sync::Arc;

use axum::Json;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use md5::{Digest, Md5};
use mdview_renderer::TocEntry;
use serde::Serialize;

use super::page_location;
use crate::error::ServerError;
use crate::state::AppState;

/// Response for GET /api/render.
#[derive(Serialize)]
struct RenderResponse {
    /// Validated document path.
    path: String,
    /// Text of the first H1 heading.
    title: Option<String>,
    toc: Vec<TocEntry>,
    html: String,
}

/// Handle GET /api/render?doc=<path>.
pub(crate) async fn get_render(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let raw = state.viewer.requested(query.as_deref(), None);
    let location = page_location(&headers);
    let view = state.viewer.render(&raw, location.as_ref()).await?;

    let etag = compute_etag(&state.version, &view.html);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == etag.as_bytes()
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let response = RenderResponse {
        path: view.doc.as_str().to_owned(),
        title: view.title,
        toc: view.toc,
        html: view.html,
    };

    // Documents are fetched fresh on every render, so clients revalidate.
    Ok((
        [
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "no-cache".to_owned()),
        ],
        Json(response),
    )
        .into_response())
}

/// Compute `ETag` from version and content.
///
/// Uses MD5 hash truncated to 64 bits (16 hex chars).
fn compute_etag(version: &str, content: &str) -> String {
    let hash = Md5::digest(format!("{version}:{content}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}
