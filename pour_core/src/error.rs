//! Error types for the pour_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pour_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Session transition attempted from a disallowed state
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Candidate drink id missing from the catalog
    #[error("Unknown drink: {0}")]
    UnknownDrink(String),

    /// Portion must be a positive number
    #[error("Invalid portion: {0}")]
    InvalidPortion(f64),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
