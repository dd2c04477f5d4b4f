//! CLI error types.

use mdview_config::ConfigError;
use mdview_server::ServerError;
use mdview_site::ViewError;
use mdview_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    View(#[from] ViewError),

    #[error("{0}")]
    Validation(String),
}
