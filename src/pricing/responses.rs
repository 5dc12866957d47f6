//! Response DTOs for pricing API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::round_money;
use super::models::{PriceEstimate, PricingRate, RateSnapshot, ShipmentType};

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

/// Response for a distance/price estimate
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    /// Kilometers, rounded to 2 places for display
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_km: Decimal,
    pub price: MoneyResponse,
    pub shipment_type: ShipmentType,
    /// Zero-rate fallback was used; the price understates the real cost
    pub degraded_rates: bool,
}

impl EstimateResponse {
    pub fn from_estimate(estimate: PriceEstimate, currency: &str) -> Self {
        let distance_km = Decimal::try_from(estimate.distance_km)
            .map(|d| round_money(d, 2))
            .unwrap_or(Decimal::ZERO);

        Self {
            distance_km,
            price: MoneyResponse {
                amount: estimate.amount,
                currency: currency.to_string(),
            },
            shipment_type: estimate.shipment_type,
            degraded_rates: estimate.degraded_rates,
        }
    }
}

/// Response for the current rate snapshot
#[derive(Debug, Serialize)]
pub struct RatesResponse {
    #[serde(flatten)]
    pub rate: PricingRate,
    pub currency: String,
    pub fetched_at: DateTime<Utc>,
    pub degraded: bool,
}

impl RatesResponse {
    pub fn from_snapshot(snapshot: RateSnapshot, currency: &str) -> Self {
        Self {
            rate: snapshot.rate,
            currency: currency.to_string(),
            fetched_at: snapshot.fetched_at,
            degraded: snapshot.degraded,
        }
    }
}

/// Generic pricing error response
#[derive(Debug, Serialize)]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    pub retryable: bool,
}
