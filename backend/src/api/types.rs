//! REST API response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::catalog::Tab;
use crate::models::Product;
use crate::parser::{ParseResult, Record, RowWarning};
use crate::sheet::Feed;

/// Response of `GET /api/deals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealsResponse {
    pub request_id: String,

    /// "ok", or "unavailable" when the sheet could not be read
    pub status: String,

    /// Deals matching the tab and search text
    pub deals: Vec<Product>,

    /// Trending picks over the whole feed
    pub trending: Vec<Product>,

    pub metadata: DealsMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealsMetadata {
    /// Number of deals in `deals`
    pub total: usize,
    /// Number of products in the whole feed
    pub feed_size: usize,
    pub tab: Tab,
    pub query: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Sheet rows dropped for a column count mismatch
    pub skipped_rows: usize,
}

impl DealsResponse {
    /// Build a response from a feed and the already filtered deals.
    pub fn new(
        feed: &Feed,
        deals: Vec<Product>,
        trending: Vec<Product>,
        tab: Tab,
        query: Option<String>,
    ) -> Self {
        DealsResponse {
            request_id: Uuid::new_v4().to_string(),
            status: if feed.error.is_some() { "unavailable" } else { "ok" }.to_string(),
            metadata: DealsMetadata {
                total: deals.len(),
                feed_size: feed.products.len(),
                tab,
                query,
                fetched_at: feed.fetched_at,
                skipped_rows: feed.warnings.len(),
            },
            deals,
            trending,
        }
    }
}

/// Response of `POST /api/parse` and `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub job_id: String,

    /// "ready", or "warning" when rows were skipped
    pub status: String,

    pub headers: Vec<String>,
    pub records: Vec<Record>,
    pub warnings: Vec<RowWarning>,
}

impl From<ParseResult> for ParseResponse {
    fn from(result: ParseResult) -> Self {
        ParseResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if result.warnings.is_empty() { "ready" } else { "warning" }.to_string(),
            headers: result.headers,
            records: result.records,
            warnings: result.warnings,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
