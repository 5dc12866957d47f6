//! Trip pricing service
//!
//! Estimates distance and price for instant cargo bookings from two place
//! names and a package weight.

pub mod cache;
pub mod config;
pub mod error;
pub mod estimator;
pub mod geocoding;
pub mod pricing;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cache::{CacheStats, CachedGeocoder, GeoCache};
use config::Config;
use geocoding::NominatimClient;
use pricing::{BackendRatesClient, EstimateService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: EstimateService,
    pub geocache: GeoCache,
    pub currency: String,
}

impl AppState {
    /// Build the HTTP collaborators described by `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let geocache = GeoCache::new(config.geocode_cache_ttl);
        let nominatim = NominatimClient::new(
            &config.geocoding_url,
            &config.geocoding_country_codes,
            config.http_timeout,
            &config.http_user_agent,
        )?;
        let geocoder = CachedGeocoder::new(Arc::new(nominatim), geocache.clone());
        let rates = BackendRatesClient::new(
            &config.backend_url,
            config.backend_api_token.clone(),
            config.http_timeout,
            &config.http_user_agent,
        )?;

        Ok(Self {
            service: EstimateService::new(
                Arc::new(geocoder),
                Arc::new(rates),
                config.rate_fallback,
            ),
            geocache,
            currency: config.currency.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.geocache.stats(),
    })
}

async fn not_found() -> error::AppError {
    error::AppError::NotFound
}

/// Full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/pricing", pricing::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
