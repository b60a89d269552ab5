#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Resumable batch geocoding engine.
//!
//! [`runner::run`] walks a validated row range in fixed-size batches, one
//! row at a time, pausing after every lookup to respect provider rate
//! limits. Rows that are already complete are skipped (see [`policy`]),
//! so a run interrupted at any point can simply be started again. After
//! each batch the full dataset is snapshotted through the
//! [`CheckpointStore`](station_geocoder_dataset::checkpoint::CheckpointStore);
//! the destination is only replaced once the last batch is done.
//!
//! Per-row failures are data: a transport error marks the row `"ERROR"`
//! and the loop moves on. Range, batch-size, and file errors abort the
//! run.

pub mod policy;
pub mod progress;
pub mod runner;

use station_geocoder_dataset::DatasetError;
use station_geocoder_models::RangeError;
use thiserror::Error;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Invalid row range; nothing was processed.
    #[error("Invalid row range: {0}")]
    Range(#[from] RangeError),

    /// Batch size of zero.
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    /// Reading the input or writing a checkpoint failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
