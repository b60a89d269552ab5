#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record, status, and summary types for the station geocoder.
//!
//! A dataset is an ordered list of [`Record`]s. Each record carries the two
//! source fields (`location`, `subdistrict`), the seven derived geocoding
//! fields, and any unrecognized columns from the input file so they survive
//! a load/save round trip untouched.

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column names of the required source fields.
pub const LOCATION_COLUMN: &str = "location";
/// See [`LOCATION_COLUMN`].
pub const SUBDISTRICT_COLUMN: &str = "subdistrict";

/// Derived columns, in the order they are appended when absent from input.
pub const DERIVED_COLUMNS: [&str; 7] = [
    "search_address",
    "formatted_address",
    "latitude",
    "longitude",
    "place_id",
    "geocoding_status",
    "geocoding_types",
];

/// A latitude/longitude pair (WGS84).
///
/// Stored as a pair so a record can never hold one coordinate without the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// Outcome status recorded on a row after a lookup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GeocodingStatus {
    /// The provider returned a match (`"OK"`).
    Ok,
    /// The lookup could not be completed (`"ERROR"`); retried next run.
    Error,
    /// Any other status code reported by the provider (`"ZERO_RESULTS"`,
    /// `"REQUEST_DENIED"`, ...).
    Provider(String),
}

impl GeocodingStatus {
    /// Literal status string for a successful lookup.
    pub const OK: &'static str = "OK";
    /// Sentinel status string written for transport failures.
    pub const ERROR: &'static str = "ERROR";

    /// Returns the status as it appears in the `geocoding_status` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => Self::OK,
            Self::Error => Self::ERROR,
            Self::Provider(code) => code,
        }
    }
}

impl From<String> for GeocodingStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::OK => Self::Ok,
            Self::ERROR => Self::Error,
            _ => Self::Provider(value),
        }
    }
}

impl From<&str> for GeocodingStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<GeocodingStatus> for String {
    fn from(value: GeocodingStatus) -> Self {
        match value {
            GeocodingStatus::Provider(code) => code,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for GeocodingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One location to geocode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Venue or place name (source field).
    pub location: String,
    /// Subdistrict name (source field).
    pub subdistrict: String,
    /// Free-text address sent to the provider. Derived once, never
    /// recomputed so manual edits survive.
    pub search_address: Option<String>,
    /// Normalized address returned by the provider.
    pub formatted_address: Option<String>,
    /// Resolved coordinates.
    pub coordinates: Option<Coordinates>,
    /// Provider place identifier.
    pub place_id: Option<String>,
    /// Status of the most recent lookup attempt.
    pub geocoding_status: Option<GeocodingStatus>,
    /// Comma-joined provider category tags.
    pub geocoding_types: Option<String>,
    /// Unrecognized columns as `(header, value)` pairs, in file order.
    /// Repeated header names each keep their own entry.
    pub extra: Vec<(String, String)>,
}

impl Record {
    /// Creates a record with only the source fields populated.
    #[must_use]
    pub fn new(location: impl Into<String>, subdistrict: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            subdistrict: subdistrict.into(),
            ..Self::default()
        }
    }

    /// Whether the record has coordinates and its last attempt did not end
    /// in a transport error.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.coordinates.is_some() && self.geocoding_status != Some(GeocodingStatus::Error)
    }

    /// Value of the first unrecognized column named `name`.
    #[must_use]
    pub fn extra_value(&self, name: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    /// Latitude, if resolved.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.latitude)
    }

    /// Longitude, if resolved.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.map(|c| c.longitude)
    }
}

/// Invalid row-range parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// `start_row` does not address a row in the dataset.
    #[error("start row {start_row} is out of range (0-{})", .len.saturating_sub(1))]
    Start {
        /// Requested start row.
        start_row: usize,
        /// Dataset length.
        len: usize,
    },
    /// `end_row` is not after `start_row` or runs past the dataset.
    #[error("end row {end_row} is out of range ({}-{len})", .start_row + 1)]
    End {
        /// Requested start row.
        start_row: usize,
        /// Requested end row (exclusive).
        end_row: usize,
        /// Dataset length.
        len: usize,
    },
}

/// A validated half-open interval `[start, end)` of row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingRange {
    start: usize,
    end: usize,
}

impl ProcessingRange {
    /// Validates `[start_row, end_row)` against a dataset of `len` rows.
    ///
    /// `end_row` of `None` means "through the last row".
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] if `start_row >= len`, `end_row <= start_row`
    /// or `end_row > len`.
    pub fn new(start_row: usize, end_row: Option<usize>, len: usize) -> Result<Self, RangeError> {
        if start_row >= len {
            return Err(RangeError::Start { start_row, len });
        }

        let end_row = end_row.unwrap_or(len);
        if end_row <= start_row || end_row > len {
            return Err(RangeError::End {
                start_row,
                end_row,
                len,
            });
        }

        Ok(Self {
            start: start_row,
            end: end_row,
        })
    }

    /// First row index (inclusive).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Last row index (exclusive).
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always `false`; a validated range holds at least one row.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Splits the range into consecutive batches of at most `batch_size`
    /// rows. The last batch may be shorter.
    pub fn batches(&self, batch_size: NonZeroUsize) -> impl Iterator<Item = Range<usize>> + use<> {
        let end = self.end;
        (self.start..end)
            .step_by(batch_size.get())
            .map(move |i| i..(i + batch_size.get()).min(end))
    }

    /// Borrowed slice of `records` covered by this range.
    #[must_use]
    pub fn slice<'a, T>(&self, records: &'a [T]) -> &'a [T] {
        &records[self.start..self.end]
    }
}

impl fmt::Display for ProcessingRange {
    /// 1-based inclusive span, as shown to users.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start + 1, self.end)
    }
}

/// Aggregate counts for one run, computed over its processing range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows actually sent to the provider this run (skips excluded).
    pub processed: u64,
    /// Rows in range whose status is `"OK"`.
    pub succeeded: u64,
    /// Rows in range with no status or status `"ERROR"`.
    pub errored: u64,
    /// Rows in range with any other provider status.
    pub not_found: u64,
}

impl RunSummary {
    /// Tallies statuses across `records` (already sliced to the range).
    #[must_use]
    pub fn tally(records: &[Record], processed: u64) -> Self {
        let mut summary = Self {
            processed,
            ..Self::default()
        };

        for record in records {
            match &record.geocoding_status {
                Some(GeocodingStatus::Ok) => summary.succeeded += 1,
                None | Some(GeocodingStatus::Error) => summary.errored += 1,
                Some(GeocodingStatus::Provider(_)) => summary.not_found += 1,
            }
        }

        summary
    }

    /// `succeeded / processed` as a percentage, or `None` when nothing was
    /// processed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        (self.processed > 0).then(|| self.succeeded as f64 / self.processed as f64 * 100.0)
    }
}

/// Progress snapshot of a dataset file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStatus {
    /// Number of data rows.
    pub total: u64,
    /// Rows with both coordinates present.
    pub completed: u64,
    /// Rows whose status is exactly `"ERROR"`.
    pub errored: u64,
    /// Everything else.
    pub pending: u64,
    /// Whether the file has `latitude` and `longitude` columns at all.
    pub has_geocoding: bool,
}

impl FileStatus {
    /// `completed / total`, or `0.0` for an empty file.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Whether a run would have nothing left to do.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.has_geocoding && self.pending == 0
    }
}
