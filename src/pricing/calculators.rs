//! Core distance and pricing calculation functions.
//!
//! Pure functions for estimate math - no network access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::models::{Coordinate, PricingRate, ShipmentType};

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Multiplier applied to group shipments (20% off)
pub const GROUP_DISCOUNT: Decimal = dec!(0.8);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use trip_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Great-circle distance between two coordinates in kilometers.
///
/// Inputs are not range-checked; validate at the boundary with
/// [`Coordinate::new`].
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // Clamp guards asin against h drifting just above 1.0 for antipodes
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Estimate the price of moving `weight_kg` over `distance_km`.
///
/// `raw = per_km * distance + per_kg * weight`, discounted for group
/// shipments, then rounded to whole currency units. Callers must pass a
/// positive weight; negative inputs are not rejected here.
///
/// Returns `None` when the amount does not fit in a `Decimal`.
pub fn estimate_price(
    distance_km: Decimal,
    weight_kg: Decimal,
    rate: &PricingRate,
    shipment_type: ShipmentType,
) -> Option<Decimal> {
    let distance_part = rate.per_kilometer.checked_mul(distance_km)?;
    let weight_part = rate.per_kilogram.checked_mul(weight_kg)?;
    let mut raw = distance_part.checked_add(weight_part)?;

    if shipment_type == ShipmentType::Group {
        raw = raw.checked_mul(GROUP_DISCOUNT)?;
    }

    Some(round_money(raw, 0))
}

/// Convert a computed distance for use in decimal pricing.
///
/// Returns `None` for NaN or infinite distances.
pub fn distance_to_decimal(distance_km: f64) -> Option<Decimal> {
    if !distance_km.is_finite() {
        return None;
    }
    Decimal::from_f64(distance_km)
}
