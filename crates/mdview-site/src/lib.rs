//! Document viewing for mdview.
//!
//! This crate ties the pieces of a render together:
//! - [`Viewer`]: validates a requested path, fetches the text from a
//!   [`Storage`](mdview_storage::Storage) backend, renders and enriches it
//! - [`Navigation`]: the sidebar of document links, with the current one
//!   marked active
//! - [`requested_doc`]: which document a page URL asks for
//!
//! # Quick Start
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use mdview_enrich::{DiagramConfig, Enrichers};
//! use mdview_site::{Viewer, ViewerConfig};
//! use mdview_storage::FsStorage;
//! use url::Url;
//!
//! let storage = Arc::new(FsStorage::new(PathBuf::from("docs")));
//! let enrichers = Arc::new(Enrichers::new(DiagramConfig::default(), None));
//! let config = ViewerConfig::new(Url::parse("http://localhost:7979/")?);
//! let viewer = Viewer::new(storage, enrichers, config);
//!
//! let view = viewer.render("guide/setup.md", None).await?;
//! println!("{}", view.html);
//! # Ok(())
//! # }
//! ```

mod error;
mod location;
mod nav;
mod viewer;

pub use error::ViewError;
pub use location::requested_doc;
pub use nav::{NavGroup, NavItem, Navigation};
pub use viewer::{View, Viewer, ViewerConfig, ViewerPage};

// Re-export TocEntry from mdview-renderer for convenience
pub use mdview_renderer::TocEntry;
