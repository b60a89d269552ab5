//! The batch loop.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use station_geocoder_client::{GeocodeClient, GeocodeOutcome};
use station_geocoder_dataset::Dataset;
use station_geocoder_dataset::checkpoint::CheckpointStore;
use station_geocoder_models::{ProcessingRange, RunSummary};

use crate::BatchError;
use crate::policy::{apply, ensure_search_address, needs_processing};
use crate::progress::ProgressCallback;

/// Default number of rows between checkpoints.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause after each lookup, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Default pause after each lookup.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(DEFAULT_DELAY_MS);

/// Parameters for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// First row to process (0-based).
    pub start_row: usize,
    /// Row to stop before; `None` runs to the end of the dataset.
    pub end_row: Option<usize>,
    /// Rows per batch (checkpoint interval).
    pub batch_size: usize,
    /// Pause after each row that was sent to the provider.
    pub delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_row: 0,
            end_row: None,
            batch_size: DEFAULT_BATCH_SIZE,
            delay: DEFAULT_DELAY,
        }
    }
}

/// Loads `input`, geocodes the configured range, and commits the result
/// to `store`'s destination.
///
/// Pass `input` as the destination for in-place updates, or a different
/// path to leave the input untouched.
///
/// # Errors
///
/// Returns [`BatchError`] if the input cannot be read, the range or batch
/// size is invalid, or a checkpoint cannot be written.
pub async fn run_file(
    input: &Path,
    store: &CheckpointStore,
    config: &RunConfig,
    client: &dyn GeocodeClient,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, BatchError> {
    log::info!("Reading {}", input.display());
    let mut dataset = Dataset::load(input)?;
    run(&mut dataset, config, client, store, progress).await
}

/// Geocodes rows `[start_row, end_row)` of `dataset` in place.
///
/// Rows are handled strictly in ascending order, one at a time. Complete
/// rows are skipped without delay; every other row is looked up, the
/// outcome applied, and the loop then sleeps for `config.delay`. The full
/// dataset is checkpointed after every batch and committed once at the
/// end.
///
/// The returned summary covers only rows in the range.
///
/// # Errors
///
/// * [`BatchError::Range`] / [`BatchError::InvalidBatchSize`] before any
///   row is touched
/// * [`BatchError::Dataset`] if a checkpoint or the final commit fails
pub async fn run(
    dataset: &mut Dataset,
    config: &RunConfig,
    client: &dyn GeocodeClient,
    store: &CheckpointStore,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, BatchError> {
    let range = ProcessingRange::new(config.start_row, config.end_row, dataset.len())?;
    let batch_size = NonZeroUsize::new(config.batch_size).ok_or(BatchError::InvalidBatchSize)?;

    log::info!("Processing rows {range} ({} rows)", range.len());

    for record in &mut dataset.records_mut()[range.start()..range.end()] {
        ensure_search_address(record);
    }

    progress.set_total(range.len() as u64);

    let mut processed = 0u64;

    for batch in range.batches(batch_size) {
        log::info!("Processing rows {}-{} of {range}", batch.start + 1, batch.end);
        progress.set_message(format!("Rows {}-{}", batch.start + 1, batch.end));

        for idx in batch {
            let record = &dataset.records()[idx];
            let address = record.search_address.clone().unwrap_or_default();

            if !needs_processing(record) {
                log::debug!("Skipping row {} (already geocoded): {address}", idx + 1);
                progress.inc(1);
                continue;
            }

            let outcome = client.lookup(&address).await;
            log_outcome(idx, &address, &outcome);
            apply(&mut dataset.records_mut()[idx], &outcome);

            processed += 1;
            progress.inc(1);

            if !config.delay.is_zero() {
                tokio::time::sleep(config.delay).await;
            }
        }

        store.save_incremental(dataset)?;
    }

    store.commit_final(dataset)?;

    let summary = RunSummary::tally(range.slice(dataset.records()), processed);
    log_summary(&range, &summary);
    progress.finish(format!(
        "{} processed, {} succeeded, {} errored",
        summary.processed, summary.succeeded, summary.errored
    ));

    Ok(summary)
}

fn log_outcome(idx: usize, address: &str, outcome: &GeocodeOutcome) {
    match outcome {
        GeocodeOutcome::Found(_) => log::info!("Row {}: found {address}", idx + 1),
        GeocodeOutcome::NotFound { provider_status } => {
            log::warn!("Row {}: no match for {address} ({provider_status})", idx + 1);
        }
        GeocodeOutcome::TransportError(e) => {
            log::warn!("Row {}: lookup failed for {address}: {e}", idx + 1);
        }
    }
}

fn log_summary(range: &ProcessingRange, summary: &RunSummary) {
    log::info!("Summary for rows {range}:");
    log::info!("  processed: {}", summary.processed);
    log::info!("  succeeded: {}", summary.succeeded);
    log::info!("  errored:   {}", summary.errored);
    log::info!("  not found: {}", summary.not_found);
    if let Some(rate) = summary.success_rate() {
        log::info!("  success rate: {rate:.2}%");
    }
}
