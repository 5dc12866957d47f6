//! Value types for distance and price estimation.
//!
//! Everything here is ephemeral: created per estimate, never persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coordinate validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Build a validated coordinate.
    ///
    /// Non-finite values fail the range check as well.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a coordinate without range checks.
    pub const fn unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Re-run range validation on a coordinate that came from the outside
    pub fn validated(self) -> Result<Self, CoordinateError> {
        Self::new(self.latitude, self.longitude)
    }
}

/// Per-kilometer and per-kilogram rates from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingRate {
    #[serde(with = "rust_decimal::serde::str")]
    pub per_kilometer: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub per_kilogram: Decimal,
}

impl PricingRate {
    /// Explicit fallback used when rates cannot be fetched and the
    /// service is configured to price anyway.
    pub const ZERO: PricingRate = PricingRate {
        per_kilometer: Decimal::ZERO,
        per_kilogram: Decimal::ZERO,
    };

    pub fn new(per_kilometer: Decimal, per_kilogram: Decimal) -> Self {
        Self {
            per_kilometer,
            per_kilogram,
        }
    }
}

/// Point-in-time view of the rates used for an estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    pub rate: PricingRate,
    pub fetched_at: DateTime<Utc>,
    /// True when the zero-rate fallback was substituted for a failed fetch
    pub degraded: bool,
}

/// Whether the shipment travels alone or consolidated with others
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentType {
    #[default]
    Individual,
    Group,
}

/// Result of a successful estimate
#[derive(Debug, Clone, PartialEq)]
pub struct PriceEstimate {
    pub distance_km: f64,
    /// Rounded to whole currency units
    pub amount: Decimal,
    pub shipment_type: ShipmentType,
    pub degraded_rates: bool,
}
