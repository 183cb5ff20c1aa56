//! CLI error type.

use bookshop_core::CatalogError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that end a command or the whole program.
///
/// Problems the user can fix at the prompt (unknown ids, field errors) are
/// printed by the shell and never surface here.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `CliError`.
pub type Result<T> = std::result::Result<T, CliError>;
