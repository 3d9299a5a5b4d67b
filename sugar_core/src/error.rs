//! Error types for the sugar_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sugar_core operations
///
/// The tracker never returns these from user actions; store failures are
/// turned into `StoreWarning`s. They surface from config loading, the file
/// store, and legacy migration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Store or config file could not be opened, locked, read, or replaced
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Store file or a stored value is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file is not valid TOML
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Tracker defaults out of range (limit below 1, capacity 0, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Built-in or stored custom items have empty names, bad grams, or duplicates
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Store contents have the wrong shape, or a write was rejected
    #[error("Store error: {0}")]
    Store(String),

    /// Command-level failure such as an unknown item name
    #[error("{0}")]
    Other(String),
}
