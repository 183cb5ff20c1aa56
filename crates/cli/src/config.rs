//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKSHOP_CATALOG_PATH` - JSON catalog file (overridden by `--catalog`)
//!
//! ## Optional
//! - `BOOKSHOP_DEFAULT_QUERY` - Query used when the search box is empty (default: javascript)
//! - `BOOKSHOP_PAGE_SIZE` - Results per search page, 1-40 (default: 10)
//! - `BOOKSHOP_CURRENCY` - Currency for books without a list price (default: USD)
//! - `BOOKSHOP_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `RUST_LOG` - Tracing filter directives

use std::path::PathBuf;
use std::str::FromStr;

use bookshop_core::CurrencyCode;
use bookshop_core::catalog::{DEFAULT_PAGE_SIZE, DEFAULT_QUERY};
use thiserror::Error;

const MAX_PAGE_SIZE: usize = 40;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("expected `pretty` or `json`, got `{s}`")),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// JSON catalog file
    pub catalog_path: PathBuf,
    /// Query used when the search box is empty
    pub default_query: String,
    /// Results per search page
    pub page_size: usize,
    /// Currency for books without a list price
    pub currency: CurrencyCode,
    /// Log output format
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    /// `catalog_override` (the `--catalog` flag) wins over
    /// `BOOKSHOP_CATALOG_PATH`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env(catalog_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(catalog_override, |key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(catalog_override: Option<PathBuf>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let catalog_path = match catalog_override {
            Some(path) => path,
            None => lookup("BOOKSHOP_CATALOG_PATH")
                .map(PathBuf::from)
                .ok_or_else(|| ConfigError::MissingEnvVar("BOOKSHOP_CATALOG_PATH".to_string()))?,
        };

        let default_query = lookup("BOOKSHOP_DEFAULT_QUERY")
            .filter(|query| !query.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        let page_size = parse_or_default(&lookup, "BOOKSHOP_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::InvalidEnvVar(
                "BOOKSHOP_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE} (got {page_size})"),
            ));
        }

        let currency = parse_or_default(&lookup, "BOOKSHOP_CURRENCY", CurrencyCode::default())?;
        let log_format = parse_or_default(&lookup, "BOOKSHOP_LOG_FORMAT", LogFormat::default())?;

        Ok(Self {
            catalog_path,
            default_query,
            page_size,
            currency,
            log_format,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
