//! Document fetch for mdview.
//!
//! The [`Storage`] trait returns the raw text of a document by its path
//! relative to the site root. Backends:
//!
//! - [`FsStorage`] reads below a local directory
//! - [`HttpStorage`] fetches from a web server, bypassing caches
//! - [`MockStorage`] keeps documents in memory (behind the `mock` feature)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use mdview_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("site"));
//! let text = storage.read("docs/index.md")?;
//! ```

mod fs;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use fs::FsStorage;
pub use http::HttpStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use storage::{HttpStatus, Listing, Storage, StorageError, StorageErrorKind};
