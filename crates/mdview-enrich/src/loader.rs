//! Lazily initialised enrichment libraries.
//!
//! A [`LazyLibrary`] moves through `Unloaded → Loading → Ready | Failed`
//! exactly once. The first [`ensure_ready`](LazyLibrary::ensure_ready) call
//! starts the load; callers arriving while it runs wait for the same result.
//! A load that errors or outlives its timeout ends in `Failed`, which callers
//! treat as "ready, but do nothing".

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::OnceCell;

/// Lifecycle of a lazily loaded library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Why a library could not be made ready.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("{library} is unavailable: {reason}")]
    Unavailable {
        library: &'static str,
        reason: String,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {what}: {reason}")]
    Invalid { what: String, reason: String },
}

/// Something that can be loaded once and then used by many renders.
pub trait Library: Send + Sync + 'static {
    /// The loaded, ready-to-use library.
    type Instance: Send + Sync + 'static;

    /// Name used in logs.
    const NAME: &'static str;

    fn load(&self) -> impl Future<Output = Result<Self::Instance, LoadError>> + Send;
}

/// Single-shot loader for a [`Library`].
pub struct LazyLibrary<L: Library> {
    library: L,
    timeout: Duration,
    started: AtomicBool,
    cell: OnceCell<Option<Arc<L::Instance>>>,
}

impl<L: Library> LazyLibrary<L> {
    pub fn new(library: L, timeout: Duration) -> Self {
        Self {
            library,
            timeout,
            started: AtomicBool::new(false),
            cell: OnceCell::new(),
        }
    }

    pub fn state(&self) -> LoaderState {
        match self.cell.get() {
            Some(Some(_)) => LoaderState::Ready,
            Some(None) => LoaderState::Failed,
            None if self.started.load(Ordering::Acquire) => LoaderState::Loading,
            None => LoaderState::Unloaded,
        }
    }

    /// Load the library if nobody has yet, and wait for the outcome.
    ///
    /// Returns `None` once the loader has failed; it never retries.
    pub async fn ensure_ready(&self) -> Option<Arc<L::Instance>> {
        self.cell
            .get_or_init(|| async {
                self.started.store(true, Ordering::Release);
                tracing::debug!(library = L::NAME, "Loading library");

                match tokio::time::timeout(self.timeout, self.library.load()).await {
                    Ok(Ok(instance)) => {
                        tracing::info!(library = L::NAME, "Library ready");
                        Some(Arc::new(instance))
                    }
                    Ok(Err(error)) => {
                        tracing::warn!(library = L::NAME, %error, "Library failed to load");
                        None
                    }
                    Err(_) => {
                        tracing::warn!(
                            library = L::NAME,
                            timeout_ms = self.timeout.as_millis(),
                            "Library load timed out"
                        );
                        None
                    }
                }
            })
            .await
            .clone()
    }
}
