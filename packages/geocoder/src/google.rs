//! Google Maps Geocoding API client.
//!
//! Sends one `GET` per address with the API key and a uniform
//! region/language bias. Only the first (best-ranked) result is consumed.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{GeocodeClient, GeocodeError, GeocodeMatch, GeocodeOutcome};

/// Status returned for a request with no address.
const INVALID_REQUEST: &str = "INVALID_REQUEST";

/// Google Geocoding API client.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    region: String,
    language: String,
}

impl GoogleGeocoder {
    /// Creates a client from a service configuration.
    ///
    /// `region` and `language` override the values from the service TOML
    /// when given.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the API key is empty, or
    /// [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(
        service: &GeocodingService,
        api_key: String,
        region: Option<String>,
        language: Option<String>,
    ) -> Result<Self, GeocodeError> {
        if api_key.trim().is_empty() {
            return Err(GeocodeError::Config {
                message: "API key is empty".to_string(),
            });
        }

        let ProviderConfig::Google {
            base_url,
            region: default_region,
            language: default_language,
            timeout_secs,
        } = &service.provider;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(*timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.clone(),
            api_key,
            region: region.unwrap_or_else(|| default_region.clone()),
            language: language.unwrap_or_else(|| default_language.clone()),
        })
    }

    /// Region bias sent with every request.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Language sent with every request.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    async fn request(&self, address: &str) -> Result<GeocodeOutcome, GeocodeError> {
        log::debug!("Geocoding '{address}' (region={})", self.region);

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("address", address),
                ("key", self.api_key.as_str()),
                ("region", self.region.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        parse_response(body)
    }
}

#[async_trait]
impl GeocodeClient for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> GeocodeOutcome {
        if address.trim().is_empty() {
            return GeocodeOutcome::NotFound {
                provider_status: INVALID_REQUEST.to_string(),
            };
        }

        self.request(address).await.into()
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
    place_id: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Parses a Geocoding API response body.
///
/// Any status other than `"OK"` is a [`GeocodeOutcome::NotFound`]. An
/// `"OK"` body without results is malformed and treated as a parse error.
fn parse_response(body: serde_json::Value) -> Result<GeocodeOutcome, GeocodeError> {
    let resp: GeocodeResponse =
        serde_json::from_value(body).map_err(|e| GeocodeError::Parse {
            message: format!("Unexpected geocode response shape: {e}"),
        })?;

    if resp.status != "OK" {
        return Ok(GeocodeOutcome::NotFound {
            provider_status: resp.status,
        });
    }

    let Some(first) = resp.results.into_iter().next() else {
        return Err(GeocodeError::Parse {
            message: "Status OK but results array is empty".to_string(),
        });
    };

    Ok(GeocodeOutcome::Found(GeocodeMatch {
        formatted_address: first.formatted_address,
        latitude: first.geometry.location.lat,
        longitude: first.geometry.location.lng,
        place_id: first.place_id,
        types: first.types,
        provider_status: resp.status,
    }))
}
