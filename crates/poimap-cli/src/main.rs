mod commands;

use clap::{Parser, Subcommand};
use poimap_api::LocationApiClient;
use poimap_core::{LngLat, TypeId};
use poimap_store::LocationStore;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "poimap-cli")]
#[command(about = "Browse points of interest from the location backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the type catalog as filter options
    Types,
    /// Fetch every location
    All {
        /// Only show locations of this type (repeatable)
        #[arg(long = "type")]
        types: Vec<TypeId>,
    },
    /// Fetch locations inside a map viewport
    Bounds {
        /// North-east corner as LNG,LAT
        #[arg(long, value_parser = parse_lng_lat, allow_hyphen_values = true)]
        ne: LngLat,
        /// South-west corner as LNG,LAT
        #[arg(long, value_parser = parse_lng_lat, allow_hyphen_values = true)]
        sw: LngLat,
        /// Only show locations of this type (repeatable)
        #[arg(long = "type")]
        types: Vec<TypeId>,
    },
    /// Search with form fields given as FIELD=VALUE
    Search {
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
        /// Only show locations of this type (repeatable)
        #[arg(long = "type")]
        types: Vec<TypeId>,
    },
    /// Show one location as JSON
    Show { id: i64 },
}

fn parse_lng_lat(raw: &str) -> Result<LngLat, String> {
    let (lng, lat) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LNG,LAT, got '{raw}'"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    Ok(LngLat(lng, lat))
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = poimap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    let store = LocationStore::new(LocationApiClient::from_config(&config)?);
    commands::run(&store, cli.command).await
}
