//! CLI entry point for the AQI history tool.
//!
//! Provides subcommands for aggregating a station readings file into
//! time buckets and for answering a location-based history query.

use anyhow::Result;
use aqi_history::analyzers::aggregate::aggregate;
use aqi_history::{
    config::AggregatorConfig,
    fetch::{BasicClient, HttpClient, auth::UrlParam},
    granularity::Granularity,
    output::{append_buckets, print_json, print_pretty},
    query::{DEFAULT_RADIUS_KM, HistoryRequest, handle_history_query},
    source::{ObservationSource, ReadingStore},
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqi_history")]
#[command(about = "Aggregate historical air-quality readings and classify trends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate every reading in a file or URL into time buckets
    Aggregate {
        /// Path to file or URL to fetch (CSV or JSON array)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Range start (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Range end (RFC 3339), inclusive
        #[arg(long)]
        end: DateTime<Utc>,

        /// Bucket size: hourly, daily, weekly or monthly
        #[arg(short, long, default_value = "daily")]
        granularity: String,

        /// Optional: CSV file to append bucket rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Optional: JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Answer a history query for stations around a point
    Query {
        /// Path to file or URL to fetch (CSV or JSON array)
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,

        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,

        /// Search radius around the point, in kilometres
        #[arg(short, long, default_value_t = DEFAULT_RADIUS_KM)]
        radius_km: f64,

        /// Range start (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Range end (RFC 3339), inclusive
        #[arg(long)]
        end: DateTime<Utc>,

        /// Bucket size: hourly, daily, weekly or monthly
        #[arg(short, long, default_value = "daily")]
        granularity: String,

        /// Optional: JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqi_history.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqi_history.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            source,
            start,
            end,
            granularity,
            output,
            config,
        } => {
            let granularity: Granularity = granularity.parse()?;
            let config = AggregatorConfig::resolve(config.as_deref())?;
            let store = open_store(&source)?;

            let observations = store.observations(None, start, end).await?;
            let result = aggregate(&observations, start, end, granularity, &config)?;

            print_pretty(&result);
            print_json(&result)?;

            if let Some(path) = output {
                append_buckets(&path, granularity.as_str(), &result.buckets)?;
                info!(path, rows = result.buckets.len(), "Bucket rows written");
            }
        }
        Commands::Query {
            source,
            latitude,
            longitude,
            radius_km,
            start,
            end,
            granularity,
            config,
        } => {
            let config = AggregatorConfig::resolve(config.as_deref())?;
            let store = open_store(&source)?;

            let request = HistoryRequest {
                latitude,
                longitude,
                start_date: start,
                end_date: end,
                granularity,
                radius_km,
            };
            let response = handle_history_query(&store, &request, &config).await?;

            print_pretty(&response);
            print_json(&response)?;
        }
    }

    Ok(())
}

/// Opens a readings store over a local path or an HTTP(S) URL.
///
/// When `AQI_SOURCE_API_KEY` is set, remote requests carry it as a query
/// parameter named by `AQI_SOURCE_API_KEY_PARAM` (default `API_KEY`).
fn open_store(location: &str) -> Result<ReadingStore> {
    if !location.starts_with("http") {
        return Ok(ReadingStore::local(location));
    }

    let client = BasicClient::new()?;
    let client: Box<dyn HttpClient> = match std::env::var("AQI_SOURCE_API_KEY") {
        Ok(key) => {
            let param_name = std::env::var("AQI_SOURCE_API_KEY_PARAM")
                .unwrap_or_else(|_| "API_KEY".to_string());
            info!(param = %param_name, "Appending API key to source requests");
            Box::new(UrlParam {
                inner: client,
                param_name,
                key,
            })
        }
        Err(_) => Box::new(client),
    };

    Ok(ReadingStore::remote(location, client))
}
