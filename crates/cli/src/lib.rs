//! Bookshop terminal storefront.
//!
//! Wires the `bookshop-core` basket and checkout to a line-oriented shell,
//! with a JSON file standing in for the remote book catalog.
//!
//! # Modules
//!
//! - [`catalog`] - JSON file catalog provider
//! - [`config`] - Environment configuration
//! - [`error`] - CLI error type
//! - [`shell`] - Shell command parsing
//! - [`storefront`] - Session state and command execution

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod shell;
pub mod storefront;

pub use catalog::JsonCatalog;
pub use config::{CliConfig, ConfigError, LogFormat};
pub use error::{CliError, Result};
pub use shell::{ShellCommand, parse_line};
pub use storefront::{Flow, Storefront};
