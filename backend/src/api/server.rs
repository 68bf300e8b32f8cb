//! HTTP Server for the DealsHub API.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                              |
//! |--------|------------------------|------------------------------------------|
//! | GET    | `/health`              | Health check                             |
//! | GET    | `/api/deals`           | Deals filtered by `tab` and `q`          |
//! | GET    | `/api/deals/trending`  | Trending deals (`limit`)                 |
//! | POST   | `/api/parse`           | Parse a raw CSV request body             |
//! | POST   | `/api/upload`          | Parse an uploaded CSV file (`file` part) |
//! | POST   | `/api/refresh`         | Drop the cached sheet                    |
//! | GET    | `/api/logs`            | SSE stream for real-time logs            |

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_row_warnings, LOG_BROADCASTER};
use super::types::{error_response, DealsResponse, ParseResponse};
use crate::catalog::{trending, DealQuery, Tab};
use crate::config::AppConfig;
use crate::error::ServerResult;
use crate::models::Product;
use crate::parser::parse_delimited_text;
use crate::sheet::SheetClient;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub sheet: Arc<SheetClient>,
    pub trending_limit: usize,
}

impl AppState {
    pub fn new(config: &AppConfig) -> ServerResult<Self> {
        Ok(Self {
            sheet: Arc::new(SheetClient::new(config)?),
            trending_limit: config.trending_limit,
        })
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/deals", get(deals))
        .route("/api/deals/trending", get(trending_deals))
        .route("/api/parse", post(parse_body))
        .route("/api/upload", post(upload_csv))
        .route("/api/refresh", post(refresh))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> ServerResult<()> {
    let state = AppState::new(&config)?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        port = config.port,
        sheet = %config.sheet_url,
        revalidate_secs = config.revalidate.as_secs(),
        "DealsHub server running on http://localhost:{}",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dealshub",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "deals": "GET /api/deals?tab=&q=",
            "trending": "GET /api/deals/trending?limit=",
            "parse": "POST /api/parse",
            "upload": "POST /api/upload",
            "refresh": "POST /api/refresh",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DealsParams {
    pub tab: Option<String>,
    pub q: Option<String>,
}

/// Deals listing. A sheet failure yields an empty list, never an error.
async fn deals(
    State(state): State<AppState>,
    Query(params): Query<DealsParams>,
) -> Result<Json<DealsResponse>, ApiError> {
    let tab: Tab = params
        .tab
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|e: crate::error::CatalogError| bad_request(&e.to_string()))?;
    let query = params.q.filter(|q| !q.trim().is_empty());

    let feed = state.sheet.fetch_feed().await;
    let selected: Vec<Product> = DealQuery::new(tab, query.clone())
        .apply(&feed.products)
        .into_iter()
        .cloned()
        .collect();
    let hot: Vec<Product> = trending(&feed.products, state.trending_limit)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(DealsResponse::new(&feed, selected, hot, tab, query)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendingParams {
    pub limit: Option<usize>,
}

async fn trending_deals(
    State(state): State<AppState>,
    Query(params): Query<TrendingParams>,
) -> Json<Vec<Product>> {
    let products = state.sheet.fetch_products().await;
    let limit = params.limit.unwrap_or(state.trending_limit);
    Json(trending(&products, limit).into_iter().cloned().collect())
}

/// Parse the request body as CSV text
async fn parse_body(body: String) -> Json<ParseResponse> {
    log_info(format!("Parsing {} bytes of CSV", body.len()));
    let parsed = parse_delimited_text(&body);
    log_row_warnings(&parsed.warnings);
    Json(ParseResponse::from(parsed))
}

/// Upload CSV endpoint
async fn upload_csv(mut multipart: Multipart) -> Result<Json<ParseResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = file_data.ok_or_else(|| bad_request("No file provided"))?;
    let text = String::from_utf8(bytes).map_err(|_| bad_request("CSV file must be UTF-8"))?;

    log_info(format!(
        "Upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        text.len()
    ));

    let parsed = parse_delimited_text(&text);
    log_row_warnings(&parsed.warnings);
    Ok(Json(ParseResponse::from(parsed)))
}

/// Drop the cached sheet so the next read downloads it again
async fn refresh(State(state): State<AppState>) -> Json<Value> {
    state.sheet.invalidate().await;
    log_info("Sheet cache invalidated");
    Json(json!({ "status": "ok" }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::logs::LogLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SHEET: &str = "Title,Description,Merchant,Category,Rating\n\
                         Earbuds,Wireless,Amazon,Electronics,4.7\n\
                         Sneakers,Running shoes,Flipkart,Fashion,4.1\n\
                         Kettle,Electric kettle,Amazon,Home,3.9\n";

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_counted_sheet() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/sheet.csv",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    SHEET
                }
            }),
        );
        (format!("{}/sheet.csv", serve(app).await), hits)
    }

    async fn spawn_sheet() -> String {
        spawn_counted_sheet().await.0
    }

    /// Serve the full API router and return its base URL.
    async fn spawn_app(state: AppState) -> String {
        serve(router(state)).await
    }

    fn upload_form(bytes: Vec<u8>) -> reqwest::multipart::Form {
        let part = reqwest::multipart::Part::bytes(bytes).file_name("deals.csv");
        reqwest::multipart::Form::new().part("file", part)
    }

    fn state(url: String) -> AppState {
        let config = AppConfig {
            fetch_timeout: Duration::from_secs(5),
            ..AppConfig::default().with_sheet_url(url)
        };
        AppState::new(&config).unwrap()
    }

    fn params(tab: Option<&str>, q: Option<&str>) -> Query<DealsParams> {
        Query(DealsParams {
            tab: tab.map(String::from),
            q: q.map(String::from),
        })
    }

    #[tokio::test]
    async fn test_deals_filtered_by_tab() {
        let state = state(spawn_sheet().await);

        let Json(response) = deals(State(state), params(Some("amazon"), None))
            .await
            .unwrap();

        assert_eq!(response.status, "ok");
        assert_eq!(response.metadata.total, 2);
        assert_eq!(response.metadata.feed_size, 3);
        assert_eq!(response.deals[1].title, "Kettle");
        assert_eq!(response.trending[0].title, "Earbuds");
        assert_eq!(response.trending.len(), 3);
    }

    #[tokio::test]
    async fn test_deals_search() {
        let state = state(spawn_sheet().await);

        let Json(response) = deals(State(state), params(None, Some("shoes"))).await.unwrap();

        assert_eq!(response.metadata.tab, Tab::All);
        assert_eq!(response.deals.len(), 1);
        assert_eq!(response.deals[0].title, "Sneakers");
    }

    #[tokio::test]
    async fn test_unknown_tab_is_bad_request() {
        let state = state("http://127.0.0.1:1/sheet.csv".to_string());

        let (status, Json(body)) = deals(State(state), params(Some("toys"), None))
            .await
            .unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_unreachable_sheet_gives_empty_list() {
        let state = state("http://127.0.0.1:1/sheet.csv".to_string());

        let Json(response) = deals(State(state), params(None, None)).await.unwrap();

        assert_eq!(response.status, "unavailable");
        assert!(response.deals.is_empty());
        assert!(response.trending.is_empty());
    }

    #[tokio::test]
    async fn test_trending_limit() {
        let state = state(spawn_sheet().await);

        let limit = Query(TrendingParams { limit: Some(1) });
        let Json(products) = trending_deals(State(state), limit).await;

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Earbuds");
    }

    #[tokio::test]
    async fn test_parse_body() {
        let Json(response) = parse_body("X,Y\n\"a,b\",c\nd\n".to_string()).await;

        assert_eq!(response.records.len(), 1);
        assert_eq!(response.records[0]["X"], "a,b");
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.status, "warning");
    }

    #[tokio::test]
    async fn test_parse_body_streams_row_warnings() {
        let mut rx = LOG_BROADCASTER.subscribe();

        parse_body("A,B,C\n1,2,3\n4,5\n".to_string()).await;

        // The global channel is shared with other tests
        let entry = loop {
            match rx.try_recv() {
                Ok(e) if e.message == "Row 2 has 2 columns, expected 3. Skipping." => break e,
                Ok(_) | Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(e) => panic!("row warning not streamed: {}", e),
            }
        };
        assert_eq!(entry.level, LogLevel::Warning);
    }

    #[tokio::test]
    async fn test_router_upload() {
        let base = spawn_app(state("http://127.0.0.1:1/sheet.csv".to_string())).await;
        let http = reqwest::Client::new();

        let form = upload_form(b"Title,Merchant\nEarbuds,Amazon\nBroken\n".to_vec());
        let response = http
            .post(format!("{}/api/upload", base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: ParseResponse = response.json().await.unwrap();
        assert_eq!(body.status, "warning");
        assert_eq!(body.headers, vec!["Title", "Merchant"]);
        assert_eq!(body.records.len(), 1);
        assert_eq!(body.records[0]["Merchant"], "Amazon");
        assert_eq!(body.warnings[0].row_index, 2);
    }

    #[tokio::test]
    async fn test_router_upload_rejects_non_utf8() {
        let base = spawn_app(state("http://127.0.0.1:1/sheet.csv".to_string())).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/upload", base))
            .multipart(upload_form(vec![0xff, 0xfe, b'a']))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "CSV file must be UTF-8");
    }

    #[tokio::test]
    async fn test_router_upload_without_file_field() {
        let base = spawn_app(state("http://127.0.0.1:1/sheet.csv".to_string())).await;

        let form = reqwest::multipart::Form::new().text("other", "Title\nx\n");
        let response = reqwest::Client::new()
            .post(format!("{}/api/upload", base))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_router_unknown_tab() {
        let base = spawn_app(state("http://127.0.0.1:1/sheet.csv".to_string())).await;

        let response = reqwest::get(format!("{}/api/deals?tab=toys", base))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_router_deals_query() {
        let (sheet, _) = spawn_counted_sheet().await;
        let base = spawn_app(state(sheet)).await;

        let response = reqwest::get(format!("{}/api/deals?tab=flipkart&q=RUNNING", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: DealsResponse = response.json().await.unwrap();
        assert_eq!(body.metadata.tab, Tab::Flipkart);
        assert_eq!(body.metadata.query.as_deref(), Some("RUNNING"));
        assert_eq!(body.deals.len(), 1);
        assert_eq!(body.deals[0].title, "Sneakers");
        assert!(body.metadata.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_router_refresh_downloads_again() {
        let (sheet, hits) = spawn_counted_sheet().await;
        let base = spawn_app(state(sheet)).await;
        let http = reqwest::Client::new();
        let deals_url = format!("{}/api/deals", base);

        http.get(&deals_url).send().await.unwrap();
        http.get(&deals_url).send().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let response = http
            .post(format!("{}/api/refresh", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let body: DealsResponse = http.get(&deals_url).send().await.unwrap().json().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(body.metadata.feed_size, 3);
    }

    #[tokio::test]
    async fn test_router_cors() {
        let base = spawn_app(state("http://127.0.0.1:1/sheet.csv".to_string())).await;

        let response = reqwest::Client::new()
            .get(format!("{}/health", base))
            .header(reqwest::header::ORIGIN, "http://localhost:5173")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let allow = response
            .headers()
            .get(reqwest::header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap();
        assert_eq!(allow, "*");
    }

    #[tokio::test]
    async fn test_router_logs_stream() {
        let base = spawn_app(state("http://127.0.0.1:1/sheet.csv".to_string())).await;

        let response = reqwest::get(format!("{}/api/logs", base)).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("text/event-stream"));
    }
}
