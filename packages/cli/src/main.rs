#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the station geocoder.
//!
//! `run` geocodes a CSV of `location`/`subdistrict` rows through the Google
//! Geocoding API, checkpointing after every batch so an interrupted run
//! can be restarted with the same arguments. `status` reports how far a
//! file has progressed.
//!
//! Uses `indicatif-log-bridge` (via [`station_geocoder_cli_utils::init_logger`])
//! so log lines and the progress bar never fight for the terminal.

mod report;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use station_geocoder_batch::runner::{DEFAULT_BATCH_SIZE, DEFAULT_DELAY_MS, RunConfig, run_file};
use station_geocoder_cli_utils::IndicatifProgress;
use station_geocoder_client::google::GoogleGeocoder;
use station_geocoder_client::service_registry;
use station_geocoder_dataset::DatasetError;
use station_geocoder_dataset::checkpoint::CheckpointStore;
use station_geocoder_dataset::status::inspect;

/// Environment variable holding the provider API key.
const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Value left in templates by users who have not configured a key yet.
const API_KEY_PLACEHOLDER: &str = "YOUR_GOOGLE_MAPS_API_KEY_HERE";

#[derive(Parser)]
#[command(name = "station_geocoder", about = "Resumable batch geocoder for CSV address lists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode rows that do not have coordinates yet
    Run(RunArgs),
    /// Show geocoding progress for a CSV file
    Status {
        /// CSV file to inspect
        path: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input CSV with `location` and `subdistrict` columns
    #[arg(long)]
    input: PathBuf,
    /// Output CSV. When omitted the input file is updated in place.
    #[arg(long)]
    output: Option<PathBuf>,
    /// First row to process (0-based)
    #[arg(long, default_value = "0")]
    start_row: usize,
    /// Row to stop before (exclusive). Defaults to the end of the file.
    #[arg(long)]
    end_row: Option<usize>,
    /// Rows per batch; progress is checkpointed after each batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    /// Pause after each lookup, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    delay_ms: u64,
    /// Region bias (ccTLD), overriding the service default
    #[arg(long)]
    region: Option<String>,
    /// Result language, overriding the service default
    #[arg(long)]
    language: Option<String>,
    /// API key (falls back to the `GOOGLE_MAPS_API_KEY` environment variable)
    #[arg(long)]
    api_key: Option<String>,
    /// Process even if the file already reports no pending rows
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = station_geocoder_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { path } => {
            let status = inspect(&path).inspect_err(report_read_error)?;
            report::print_status(&path, &status);
        }
        Commands::Run(args) => run(args, &multi).await?,
    }

    Ok(())
}

async fn run(
    args: RunArgs,
    multi: &station_geocoder_cli_utils::MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = resolve_api_key(args.api_key)?;

    let status = inspect(&args.input).inspect_err(report_read_error)?;
    report::print_status(&args.input, &status);
    if status.is_complete() && !args.force {
        println!("Geocoding is already complete.");
        return Ok(());
    }

    let service = service_registry::service("google")?;
    let geocoder = GoogleGeocoder::from_service(&service, api_key, args.region, args.language)?;

    let destination = args.output.unwrap_or_else(|| args.input.clone());
    let store = CheckpointStore::new(destination);
    let config = RunConfig {
        start_row: args.start_row,
        end_row: args.end_row,
        batch_size: args.batch_size,
        delay: Duration::from_millis(args.delay_ms),
    };

    report::print_plan(&args.input, &store, &config, &geocoder);

    let progress = IndicatifProgress::rows_bar(multi, "Geocoding");
    let summary = run_file(&args.input, &store, &config, &geocoder, &progress)
        .await
        .inspect_err(|e| log::error!("Run aborted: {e}"))?;

    report::print_summary(&summary);
    println!("Saved to {}", store.destination().display());

    let final_status = inspect(store.destination())?;
    report::print_status(store.destination(), &final_status);

    Ok(())
}

/// Picks the API key from the flag or the environment.
fn resolve_api_key(flag: Option<String>) -> Result<String, String> {
    let key = flag
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty() && k != API_KEY_PLACEHOLDER);

    key.ok_or_else(|| {
        format!(
            "No Google Maps API key configured. Pass --api-key or set {API_KEY_ENV}.\n\
             To get a key:\n  \
             1. Open the Google Cloud Console\n  \
             2. Create or select a project\n  \
             3. Enable the Geocoding API\n  \
             4. Create an API key"
        )
    })
}

fn report_read_error(e: &DatasetError) {
    if let DatasetError::NotFound { path } = e {
        log::error!("Input file not found: {}", path.display());
    } else {
        log::error!("Cannot read input: {e}");
    }
}
