//! Published spreadsheet client.
//!
//! Downloads the sheet's CSV export and keeps the text in memory for a
//! revalidation window, so a busy deals page does not hit the sheet on every
//! request. Each download is a single attempt: there is no retry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dealshub::{AppConfig, SheetClient};
//!
//! let client = SheetClient::new(&AppConfig::from_env()?)?;
//! let products = client.fetch_products().await; // empty on failure
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::api::logs::{log_error, log_info, log_row_warnings, log_success};
use crate::config::AppConfig;
use crate::error::{FetchError, FetchResult};
use crate::models::{products_from_records, Product};
use crate::parser::{parse_delimited_text, RowWarning};

/// Sheet text with the time it was downloaded.
#[derive(Debug, Clone)]
struct CachedSheet {
    body: String,
    fetched_at: Instant,
    fetched_at_utc: DateTime<Utc>,
}

/// Products of one sheet read, with what went wrong along the way.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub products: Vec<Product>,
    /// Rows dropped by the parser
    pub warnings: Vec<RowWarning>,
    /// When the served text was downloaded
    pub fetched_at: Option<DateTime<Utc>>,
    /// Fetch failure message, if the sheet could not be read
    pub error: Option<String>,
}

/// HTTP client for the published sheet
pub struct SheetClient {
    http: reqwest::Client,
    url: String,
    revalidate: Duration,
    cache: RwLock<Option<CachedSheet>>,
}

impl SheetClient {
    /// Create a client from configuration.
    pub fn new(config: &AppConfig) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            http,
            url: config.sheet_url.clone(),
            revalidate: config.revalidate,
            cache: RwLock::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download time of the cached text, if any.
    pub async fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.as_ref().map(|c| c.fetched_at_utc)
    }

    /// Forget the cached text; the next read downloads again.
    pub async fn invalidate(&self) {
        self.cache.write().await.take();
    }

    /// Return the sheet text, downloading it when the cache is empty or stale.
    ///
    /// A failed download is returned as an error and leaves the cache empty.
    pub async fn fetch_text(&self) -> FetchResult<String> {
        self.fetch_snapshot().await.map(|(body, _)| body)
    }

    /// Sheet text together with the download time of that exact text.
    async fn fetch_snapshot(&self) -> FetchResult<(String, DateTime<Utc>)> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.revalidate {
                return Ok((cached.body.clone(), cached.fetched_at_utc));
            }
        }

        let body = match self.download().await {
            Ok(body) => body,
            Err(e) => {
                self.cache.write().await.take();
                return Err(e);
            }
        };

        let fetched_at_utc = Utc::now();
        *self.cache.write().await = Some(CachedSheet {
            body: body.clone(),
            fetched_at: Instant::now(),
            fetched_at_utc,
        });

        Ok((body, fetched_at_utc))
    }

    async fn download(&self) -> FetchResult<String> {
        log_info(format!("Fetching sheet: {}", self.url));

        let response = self.http.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.text().await?;
        log_success(format!("Fetched {} bytes", body.len()));
        Ok(body)
    }

    /// Read and parse the sheet. Never fails: a fetch error yields an
    /// empty feed with `error` set.
    pub async fn fetch_feed(&self) -> Feed {
        let (text, fetched_at) = match self.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_error(format!("Error fetching products from sheet: {}", e));
                return Feed {
                    error: Some(e.to_string()),
                    ..Feed::default()
                };
            }
        };

        let parsed = parse_delimited_text(&text);
        log_row_warnings(&parsed.warnings);

        Feed {
            products: products_from_records(&parsed.records),
            warnings: parsed.warnings,
            fetched_at: Some(fetched_at),
            error: None,
        }
    }

    /// Products of the sheet, or an empty list when it cannot be read.
    pub async fn fetch_products(&self) -> Vec<Product> {
        self.fetch_feed().await.products
    }
}
