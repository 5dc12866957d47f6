//! Distance and price estimation for instant cargo bookings.
//!
//! The calculators are pure; services wire them to the geocoding and rate
//! collaborators; routes expose them over HTTP/JSON.

pub mod calculators;
pub mod models;
pub mod rates;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{estimate_price, haversine_distance_km, round_money};
pub use models::{Coordinate, PriceEstimate, PricingRate, ShipmentType};
pub use rates::{BackendRatesClient, PricingRepository};
pub use routes::router;
pub use services::{EstimateService, PricingError};
