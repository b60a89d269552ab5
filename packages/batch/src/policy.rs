//! Per-row rules: whether a record needs a lookup, and how an outcome is
//! written back onto it.

use station_geocoder_client::GeocodeOutcome;
use station_geocoder_models::{Coordinates, GeocodingStatus, Record};

/// Separator used when joining provider category tags.
const TYPES_SEPARATOR: &str = ", ";

/// Whether `record` should be sent to the provider.
///
/// Only complete records (coordinates present and last status not
/// `"ERROR"`) are skipped. Never-attempted, not-found, errored, and
/// half-filled rows all qualify.
#[must_use]
pub fn needs_processing(record: &Record) -> bool {
    !record.is_complete()
}

/// Fills `search_address` from `location` and `subdistrict` if it is
/// missing, and returns it. An existing value is never recomputed.
pub fn ensure_search_address(record: &mut Record) -> &str {
    record
        .search_address
        .get_or_insert_with(|| format!("{} {}", record.location, record.subdistrict))
        .as_str()
}

/// Writes a lookup outcome onto `record`.
///
/// - `Found` sets all six derived fields from the match.
/// - `NotFound` records the provider status and clears address, place,
///   coordinate, and type fields.
/// - `TransportError` sets status `"ERROR"` and leaves everything else
///   as it was.
pub fn apply(record: &mut Record, outcome: &GeocodeOutcome) {
    match outcome {
        GeocodeOutcome::Found(m) => {
            record.formatted_address = Some(m.formatted_address.clone());
            record.coordinates = Some(Coordinates {
                latitude: m.latitude,
                longitude: m.longitude,
            });
            record.place_id = Some(m.place_id.clone());
            record.geocoding_status = Some(GeocodingStatus::from(m.provider_status.as_str()));
            record.geocoding_types = if m.types.is_empty() {
                None
            } else {
                Some(m.types.join(TYPES_SEPARATOR))
            };
        }
        GeocodeOutcome::NotFound { provider_status } => {
            record.formatted_address = None;
            record.coordinates = None;
            record.place_id = None;
            record.geocoding_types = None;
            record.geocoding_status = Some(GeocodingStatus::from(provider_status.as_str()));
        }
        GeocodeOutcome::TransportError(_) => {
            record.geocoding_status = Some(GeocodingStatus::Error);
        }
    }
}
