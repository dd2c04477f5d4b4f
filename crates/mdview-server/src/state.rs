//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use mdview_site::Viewer;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Render pipeline and sidebar.
    pub(crate) viewer: Arc<Viewer>,
    /// Directory served for paths outside the routes (`None` when documents
    /// come from a remote base URL).
    pub(crate) static_dir: Option<PathBuf>,
    /// Site name shown in page titles.
    pub(crate) site_title: String,
    /// Application version, mixed into `ETag`s.
    pub(crate) version: String,
}
