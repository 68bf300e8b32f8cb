//! # DealsHub - deals feed from a published spreadsheet
//!
//! DealsHub reads a spreadsheet published as CSV, turns each row into a
//! [`Product`] and serves the result as a filterable deals feed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Sheet (CSV) │────▶│   Parser    │────▶│  Products   │────▶│  Deals API  │
//! │ (cached 1h) │     │ (+warnings) │     │ (defaults)  │     │ (tab, q)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use dealshub::{parse_delimited_text, products_from_records};
//!
//! let parsed = parse_delimited_text("Title,Merchant\nEarbuds,Amazon\nbad,row,here");
//! let products = products_from_records(&parsed.records);
//!
//! assert_eq!(products[0].title, "Earbuds");
//! assert_eq!(products[0].category, "N/A");
//! assert_eq!(parsed.warnings.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Environment configuration
//! - [`parser`] - CSV to records parser
//! - [`models`] - Product model and projection defaults
//! - [`catalog`] - Tabs, search and trending selection
//! - [`sheet`] - Published sheet client with revalidation window
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Listing
pub mod catalog;

// Sheet source
pub mod sheet;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors and config
// =============================================================================

pub use config::AppConfig;
pub use error::{CatalogError, ConfigError, CsvError, FetchError, ServerError};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    parse_delimited_text,
    parse_file,
    rows_to_records,
    tokenize,
    write_delimited_text,
    ParseResult,
    Record,
    RowWarning,
};

// =============================================================================
// Re-exports - Models and catalog
// =============================================================================

pub use catalog::{search, trending, DealQuery, Tab};
pub use models::{products_from_records, Product};

// =============================================================================
// Re-exports - Sheet client
// =============================================================================

pub use sheet::{Feed, SheetClient};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, DealsMetadata, DealsResponse, ParseResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
