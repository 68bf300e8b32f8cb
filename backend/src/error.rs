//! Error types for the DealsHub backend.
//!
//! - [`CsvError`] - CSV file and serialization errors
//! - [`FetchError`] - Sheet download errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`CatalogError`] - Invalid deal queries
//! - [`ServerError`] - Top-level errors of the CLI and HTTP server
//!
//! Parsing itself never fails: malformed rows become
//! [`crate::parser::RowWarning`]s instead of errors.

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors around CSV input and output.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to write CSV output.
    #[error("Failed to write CSV: {0}")]
    WriteError(#[from] csv::Error),

    /// Written bytes were not valid UTF-8.
    #[error("CSV output is not valid UTF-8: {0}")]
    EncodingError(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors from the published sheet fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport level failure (DNS, connect, timeout, body read).
    #[error("Failed to fetch sheet: {0}")]
    Request(#[from] reqwest::Error),

    /// The sheet answered with a non-success status.
    #[error("Failed to fetch sheet: HTTP {status} {reason}")]
    Status { status: u16, reason: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: String, value: String },
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors from deal queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Unknown tab name.
    #[error("Unknown tab: '{0}' (expected all, amazon, flipkart, electronics or fashion)")]
    UnknownTab(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// Top-level errors of the CLI and HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Fetch error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// IO error (socket bind, serve).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
