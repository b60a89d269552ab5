//! Console output for the `run` and `status` commands.

use std::path::Path;

use station_geocoder_batch::runner::RunConfig;
use station_geocoder_client::google::GoogleGeocoder;
use station_geocoder_dataset::checkpoint::CheckpointStore;
use station_geocoder_models::{FileStatus, RunSummary};

pub fn print_status(path: &Path, status: &FileStatus) {
    println!("Status of {}:", path.display());
    println!("  total rows: {}", status.total);
    println!(
        "  completed:  {} ({:.1}%)",
        status.completed,
        status.completion_rate() * 100.0
    );
    println!("  errored:    {}", status.errored);
    println!("  pending:    {}", status.pending);
    if !status.has_geocoding {
        println!("  (no geocoding columns yet)");
    }
}

pub fn print_plan(
    input: &Path,
    store: &CheckpointStore,
    config: &RunConfig,
    geocoder: &GoogleGeocoder,
) {
    let end = config
        .end_row
        .map_or_else(|| "last".to_string(), |e| e.to_string());
    let mode = if store.destination() == input {
        "update input in place"
    } else {
        "write new file"
    };

    println!();
    println!("Starting run:");
    println!("  rows:       {}-{end}", config.start_row + 1);
    println!("  batch size: {}", config.batch_size);
    println!("  delay:      {} ms", config.delay.as_millis());
    println!("  region:     {} ({})", geocoder.region(), geocoder.language());
    println!("  mode:       {mode} ({})", store.destination().display());
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("Run complete:");
    println!("  processed:  {}", summary.processed);
    println!("  succeeded:  {}", summary.succeeded);
    println!("  errored:    {}", summary.errored);
    println!("  not found:  {}", summary.not_found);
    if let Some(rate) = summary.success_rate() {
        println!("  success:    {rate:.2}%");
    }
}
