//! Estimate service functions with upstream access.
//!
//! These functions resolve places and rates through the external
//! collaborators, then hand off to the pure calculators.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, instrument, warn};

use crate::config::RateFallback;
use crate::geocoding::{GeocodeError, GeocodingClient};

use super::calculators::{distance_to_decimal, estimate_price, haversine_distance_km};
use super::models::{
    Coordinate, CoordinateError, PriceEstimate, PricingRate, RateSnapshot, ShipmentType,
};
use super::rates::PricingRepository;

/// Heaviest package accepted for an estimate (1000 tonnes)
pub const MAX_WEIGHT_KG: Decimal = dec!(1000000);

/// Estimate error types
#[derive(Debug, Clone, PartialEq)]
pub enum PricingError {
    PlaceNotFound {
        place: String,
    },
    GeocodingUnavailable {
        place: String,
        message: String,
    },
    RatesUnavailable {
        message: String,
    },
    InvalidCoordinate {
        field: String,
        message: String,
    },
    InvalidWeight {
        weight_kg: Decimal,
    },
    InvalidDistance,
    /// Rates and inputs produce an amount too large to represent
    PriceOutOfRange,
}

impl PricingError {
    /// Whether re-issuing the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PricingError::GeocodingUnavailable { .. } | PricingError::RatesUnavailable { .. }
        )
    }

    fn from_geocode(place: &str, err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound { .. } | GeocodeError::EmptyQuery => {
                PricingError::PlaceNotFound {
                    place: place.to_string(),
                }
            }
            GeocodeError::Transient(message) => PricingError::GeocodingUnavailable {
                place: place.to_string(),
                message,
            },
            GeocodeError::InvalidCoordinate(e) => PricingError::InvalidCoordinate {
                field: place.to_string(),
                message: e.to_string(),
            },
        }
    }

    fn from_coordinate(field: &str, err: CoordinateError) -> Self {
        PricingError::InvalidCoordinate {
            field: field.to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::PlaceNotFound { place } => {
                write!(f, "No location found for '{}'", place)
            }
            PricingError::GeocodingUnavailable { place, message } => {
                write!(f, "Could not look up '{}': {}", place, message)
            }
            PricingError::RatesUnavailable { message } => {
                write!(f, "Pricing rates unavailable: {}", message)
            }
            PricingError::InvalidCoordinate { field, message } => {
                write!(f, "Invalid coordinate for {}: {}", field, message)
            }
            PricingError::InvalidWeight { weight_kg } => write!(
                f,
                "Weight must be greater than 0 and at most {} kg, got {}",
                MAX_WEIGHT_KG, weight_kg
            ),
            PricingError::InvalidDistance => write!(f, "Distance could not be computed"),
            PricingError::PriceOutOfRange => write!(f, "Estimated price is out of range"),
        }
    }
}

impl std::error::Error for PricingError {}

/// Orchestrates geocoding, rate lookup and the pricing calculators.
///
/// Holds no per-request state; each call is independent.
#[derive(Clone)]
pub struct EstimateService {
    geocoder: Arc<dyn GeocodingClient>,
    rates: Arc<dyn PricingRepository>,
    fallback: RateFallback,
}

impl EstimateService {
    pub fn new(
        geocoder: Arc<dyn GeocodingClient>,
        rates: Arc<dyn PricingRepository>,
        fallback: RateFallback,
    ) -> Self {
        Self {
            geocoder,
            rates,
            fallback,
        }
    }

    /// Fetch a rate snapshot, applying the configured fallback on failure.
    #[instrument(skip(self))]
    pub async fn current_rates(&self) -> Result<RateSnapshot, PricingError> {
        match self.rates.current_rates().await {
            Ok(rate) => Ok(RateSnapshot {
                rate,
                fetched_at: Utc::now(),
                degraded: false,
            }),
            Err(e) => match self.fallback {
                RateFallback::Unavailable => {
                    warn!("Rate fetch failed, estimate unavailable: {}", e);
                    Err(PricingError::RatesUnavailable {
                        message: e.to_string(),
                    })
                }
                RateFallback::Zero => {
                    warn!("Rate fetch failed, pricing with zero rates: {}", e);
                    Ok(RateSnapshot {
                        rate: PricingRate::ZERO,
                        fetched_at: Utc::now(),
                        degraded: true,
                    })
                }
            },
        }
    }

    /// Estimate between two free-text places.
    ///
    /// Both endpoints are resolved concurrently; if either fails the
    /// estimate is unavailable.
    #[instrument(skip(self))]
    pub async fn estimate_between_places(
        &self,
        from: &str,
        to: &str,
        weight_kg: Decimal,
        shipment_type: ShipmentType,
    ) -> Result<PriceEstimate, PricingError> {
        validate_weight(weight_kg)?;

        let (origin, destination) =
            tokio::join!(self.geocoder.resolve(from), self.geocoder.resolve(to));
        let origin = origin.map_err(|e| PricingError::from_geocode(from, e))?;
        let destination = destination.map_err(|e| PricingError::from_geocode(to, e))?;

        self.estimate_between_coordinates(origin, destination, weight_kg, shipment_type)
            .await
    }

    /// Estimate between two known coordinates, skipping geocoding.
    #[instrument(skip(self))]
    pub async fn estimate_between_coordinates(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        weight_kg: Decimal,
        shipment_type: ShipmentType,
    ) -> Result<PriceEstimate, PricingError> {
        validate_weight(weight_kg)?;
        let origin = origin
            .validated()
            .map_err(|e| PricingError::from_coordinate("origin", e))?;
        let destination = destination
            .validated()
            .map_err(|e| PricingError::from_coordinate("destination", e))?;

        let distance_km = haversine_distance_km(origin, destination);
        let distance = distance_to_decimal(distance_km).ok_or(PricingError::InvalidDistance)?;

        let snapshot = self.current_rates().await?;
        let amount = estimate_price(distance, weight_kg, &snapshot.rate, shipment_type)
            .ok_or(PricingError::PriceOutOfRange)?;

        info!(
            distance_km,
            %amount,
            ?shipment_type,
            degraded = snapshot.degraded,
            "Computed estimate"
        );

        Ok(PriceEstimate {
            distance_km,
            amount,
            shipment_type,
            degraded_rates: snapshot.degraded,
        })
    }
}

fn validate_weight(weight_kg: Decimal) -> Result<(), PricingError> {
    if weight_kg <= Decimal::ZERO || weight_kg > MAX_WEIGHT_KG {
        return Err(PricingError::InvalidWeight { weight_kg });
    }
    Ok(())
}
