#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding client for the station geocoder.
//!
//! Turns a free-text address into a [`GeocodeOutcome`]. Three outcomes are
//! kept strictly apart:
//!
//! - [`GeocodeOutcome::Found`]: the provider returned a match; only the
//!   top-ranked candidate is kept.
//! - [`GeocodeOutcome::NotFound`]: the provider answered, but with a
//!   non-`"OK"` status. This is a legitimate result and is recorded as-is.
//! - [`GeocodeOutcome::TransportError`]: the call never produced a usable
//!   answer (network failure, HTTP error, malformed body). The row must be
//!   retried on a later run, so this must never be folded into `NotFound`.
//!
//! Provider endpoints are configured by TOML files embedded from
//! `services/` (see [`service_registry`]).

pub mod google;
pub mod service_registry;

use async_trait::async_trait;
use thiserror::Error;

/// The top-ranked match returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    /// Normalized address.
    pub formatted_address: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Provider place identifier.
    pub place_id: String,
    /// Category tags, in provider order.
    pub types: Vec<String>,
    /// Literal status string reported with the match (normally `"OK"`).
    pub provider_status: String,
}

/// Result of a single lookup.
#[derive(Debug)]
pub enum GeocodeOutcome {
    /// The provider matched the address.
    Found(GeocodeMatch),
    /// The provider answered but had no usable match.
    NotFound {
        /// Literal provider status (e.g. `"ZERO_RESULTS"`).
        provider_status: String,
    },
    /// The lookup could not be completed.
    TransportError(GeocodeError),
}

impl From<Result<Self, GeocodeError>> for GeocodeOutcome {
    fn from(result: Result<Self, GeocodeError>) -> Self {
        result.unwrap_or_else(Self::TransportError)
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed or returned an error status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Client configuration is unusable.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

/// A geocoding backend.
///
/// Implementations hold no per-call state beyond a shared connection pool.
#[async_trait]
pub trait GeocodeClient: Send + Sync {
    /// Looks up a single free-text address.
    async fn lookup(&self, address: &str) -> GeocodeOutcome;
}
