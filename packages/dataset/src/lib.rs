#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV dataset persistence for the station geocoder.
//!
//! - [`Dataset`] loads a UTF-8 CSV into fixed-schema
//!   [`Record`](station_geocoder_models::Record)s, keeping unknown columns
//!   and their header positions so a save never drops data.
//! - [`checkpoint::CheckpointStore`] writes incremental snapshots to a
//!   `.temp` sibling of the destination and commits the final file by
//!   renaming the snapshot into place.
//! - [`status::inspect`] summarizes how far geocoding has progressed in a
//!   file without loading it into records.

pub mod checkpoint;
pub mod dataset;
pub mod status;

use std::path::PathBuf;

use thiserror::Error;

pub use dataset::Dataset;

/// Errors from reading or writing dataset files.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The input file does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be parsed as CSV.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// I/O error while opening a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Column name.
        column: &'static str,
    },

    /// A source or derived column appears more than once in the header.
    #[error("Column '{column}' appears more than once")]
    DuplicateColumn {
        /// Column name.
        column: String,
    },

    /// A cell could not be converted to its column's type.
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        /// 0-based data row index.
        row: usize,
        /// Column name.
        column: &'static str,
        /// Offending cell contents.
        value: String,
    },

    /// A destination or snapshot file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
