//! Navigation API endpoint.
//!
//! Returns the sidebar for the viewer, with the requested document marked
//! active.

use std::sync::Arc;

use axum::Json;
use axum::extract::{RawQuery, State};
use mdview_renderer::DocPath;
use mdview_site::Navigation;

use crate::state::AppState;

/// Handle GET /api/navigation.
///
/// The `doc` query parameter selects the active item; an invalid or unknown
/// document leaves every item inactive.
pub(crate) async fn get_navigation(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Json<Navigation> {
    let raw = state.viewer.requested(query.as_deref(), None);
    let active = state.viewer.parse_doc(&raw).ok();
    Json(
        state
            .viewer
            .navigation()
            .with_active(active.as_ref().map(DocPath::as_str)),
    )
}
