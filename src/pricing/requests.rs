//! Request DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::models::{Coordinate, ShipmentType};

/// Request to estimate between two free-text places
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub from: String,
    pub to: String,
    /// JSON number or numeric string
    pub weight_kg: Decimal,
    #[serde(default)]
    pub shipment_type: ShipmentType,
}

/// Request to estimate between two known coordinates
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub weight_kg: Decimal,
    #[serde(default)]
    pub shipment_type: ShipmentType,
}
