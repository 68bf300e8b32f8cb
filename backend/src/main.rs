//! DealsHub CLI - serve and inspect the deals sheet
//!
//! ```bash
//! dealshub serve                      # Start HTTP server (port 3000)
//! dealshub parse deals.csv            # Parse a local CSV to JSON records
//! dealshub parse deals.csv -f csv     # Normalize a CSV file
//! dealshub fetch                      # Download the sheet, print products
//! dealshub deals --tab amazon -q tv   # Filtered listing, as served by the API
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use dealshub::{
    parse_delimited_text, parse_file, products_from_records, trending, write_delimited_text,
    AppConfig, DealQuery, SheetClient, Tab,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dealshub")]
#[command(about = "Serve a published spreadsheet as a deals feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: DEALSHUB_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Sheet CSV URL (default: DEALSHUB_SHEET_URL)
        #[arg(long)]
        url: Option<String>,
    },

    /// Parse a local CSV file
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the sheet once and print its products
    Fetch {
        /// Sheet CSV URL (default: DEALSHUB_SHEET_URL)
        #[arg(long)]
        url: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the filtered deals listing
    Deals {
        /// Tab: all, amazon, flipkart, electronics, fashion
        #[arg(short, long, default_value = "all")]
        tab: String,

        /// Search text
        #[arg(short, long)]
        query: Option<String>,

        /// Sheet CSV URL (default: DEALSHUB_SHEET_URL)
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port, url } => cmd_serve(port, url).await,

        Commands::Parse { input, format, output } => cmd_parse(&input, format, output.as_deref()),

        Commands::Fetch { url, output } => cmd_fetch(url, output.as_deref()).await,

        Commands::Deals { tab, query, url } => cmd_deals(&tab, query, url).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(url: Option<String>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    Ok(match url {
        Some(url) => config.with_sheet_url(url),
        None => config,
    })
}

async fn cmd_serve(
    port: Option<u16>,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(url)?;
    if let Some(port) = port {
        config = config.with_port(port);
    }
    dealshub::server::start_server(config).await?;
    Ok(())
}

fn cmd_parse(
    input: &Path,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Parsing CSV: {}", input.display());

    let result = parse_file(input)?;

    tracing::info!(
        columns = result.headers.len(),
        skipped = result.warnings.len(),
        "Parsed {} records",
        result.records.len()
    );

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result.records)?,
        OutputFormat::Csv => write_delimited_text(&result.headers, &result.records)?,
    };
    write_output(&content, output)
}

async fn cmd_fetch(
    url: Option<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(url)?;
    let client = SheetClient::new(&config)?;

    // Unlike the API, surface the failure instead of printing an empty list
    let text = client.fetch_text().await?;
    let parsed = parse_delimited_text(&text);
    let products = products_from_records(&parsed.records);

    tracing::info!(skipped = parsed.warnings.len(), "{} products", products.len());

    let json = serde_json::to_string_pretty(&products)?;
    write_output(&json, output)
}

async fn cmd_deals(
    tab: &str,
    query: Option<String>,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tab: Tab = tab.parse()?;
    let config = load_config(url)?;
    let client = SheetClient::new(&config)?;

    let products = client.fetch_products().await;
    let deals = DealQuery::new(tab, query).apply(&products);
    let hot = trending(&products, config.trending_limit);

    let json = serde_json::to_string_pretty(&json!({
        "tab": tab,
        "total": deals.len(),
        "deals": deals,
        "trending": hot,
    }))?;
    write_output(&json, None)
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            tracing::info!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
