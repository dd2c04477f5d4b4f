//! HTTP server for the mdview document viewer.
//!
//! This crate provides an axum server serving:
//! - `GET /`: the viewer page for the `doc` query parameter
//! - `GET /api/render?doc=`: a rendered document as JSON
//! - `GET /api/navigation`: the sidebar as JSON
//! - every other path from the documents source directory
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mdview_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let viewer = Arc::new(build_viewer());
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_owned(),
//!         port: 7979,
//!         static_dir: Some("site".into()),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config, viewer).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (mdview-server)
//!                        │
//!                        ├─► / and /api/* ──► Viewer (fetch, render, enrich)
//!                        │
//!                        └─► anything else ──► tower-http ServeDir
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;
mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub use error::ServerError;
use mdview_site::Viewer;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory served for paths outside the routes.
    pub static_dir: Option<PathBuf>,
    /// Site name shown in page titles.
    pub site_title: String,
    /// Application version (mixed into `ETag`s).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            static_dir: None,
            site_title: "mdview".to_owned(),
            version: String::new(),
        }
    }
}

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address does not parse or cannot be bound.
pub async fn run_server(config: ServerConfig, viewer: Arc<Viewer>) -> Result<(), ServerError> {
    let state = Arc::new(AppState {
        viewer,
        static_dir: config.static_dir,
        site_title: config.site_title,
        version: config.version,
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
