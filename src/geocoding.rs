//! Free-text place resolution via a Nominatim-style search service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::pricing::models::{Coordinate, CoordinateError};

/// Geocoding failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeocodeError {
    #[error("place name is empty")]
    EmptyQuery,

    /// Upstream answered but had no match. Terminal for the estimate.
    #[error("no match for '{query}'")]
    NotFound { query: String },

    /// Timeout, connection failure, non-2xx or unreadable body
    #[error("geocoding service unavailable: {0}")]
    Transient(String),

    #[error("geocoding service returned an invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
}

impl GeocodeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeocodeError::Transient(_))
    }
}

/// Resolves a place name to the coordinate of its best match
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    async fn resolve(&self, place: &str) -> Result<Coordinate, GeocodeError>;
}

/// One entry of the search response. Nominatim sends lat/lon as strings.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SearchHit {
    fn coordinate(&self) -> Result<Coordinate, GeocodeError> {
        let latitude: f64 = self
            .lat
            .trim()
            .parse()
            .map_err(|_| GeocodeError::Transient(format!("unparsable lat '{}'", self.lat)))?;
        let longitude: f64 = self
            .lon
            .trim()
            .parse()
            .map_err(|_| GeocodeError::Transient(format!("unparsable lon '{}'", self.lon)))?;

        Ok(Coordinate::new(latitude, longitude)?)
    }
}

/// `GeocodingClient` for `GET <url>?format=json&countrycodes=<cc>&q=<text>`
#[derive(Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    search_url: String,
    country_codes: String,
}

impl NominatimClient {
    pub fn new(
        search_url: &str,
        country_codes: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            search_url: search_url.to_string(),
            country_codes: country_codes.to_string(),
        })
    }
}

#[async_trait]
impl GeocodingClient for NominatimClient {
    #[instrument(skip(self))]
    async fn resolve(&self, place: &str) -> Result<Coordinate, GeocodeError> {
        let query = place.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("format", "json"),
                ("countrycodes", self.country_codes.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Transient(format!("status {}", status)));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Transient(e.to_string()))?;

        let best = hits.first().ok_or_else(|| GeocodeError::NotFound {
            query: query.to_string(),
        })?;

        let coordinate = best.coordinate()?;
        debug!(
            matched = best.display_name.as_deref().unwrap_or(""),
            lat = coordinate.latitude,
            lon = coordinate.longitude,
            "Resolved place"
        );
        Ok(coordinate)
    }
}
