//! HTTP handlers for pricing endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::AppState;

use super::requests::{EstimateRequest, QuoteRequest};
use super::responses::{EstimateResponse, RatesResponse};

/// Pricing routes, mounted under `/api/pricing`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/estimate", post(estimate))
        .route("/quote", post(quote))
        .route("/rates", get(rates))
}

/// Estimate between two place names
pub async fn estimate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>> {
    let Json(request) = payload?;
    let estimate = state
        .service
        .estimate_between_places(
            &request.from,
            &request.to,
            request.weight_kg,
            request.shipment_type,
        )
        .await?;

    Ok(Json(EstimateResponse::from_estimate(estimate, &state.currency)))
}

/// Estimate between two coordinates the client already has
pub async fn quote(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<EstimateResponse>> {
    let Json(request) = payload?;
    let estimate = state
        .service
        .estimate_between_coordinates(
            request.origin,
            request.destination,
            request.weight_kg,
            request.shipment_type,
        )
        .await?;

    Ok(Json(EstimateResponse::from_estimate(estimate, &state.currency)))
}

/// Current rate snapshot
pub async fn rates(State(state): State<AppState>) -> Result<Json<RatesResponse>> {
    let snapshot = state.service.current_rates().await?;
    Ok(Json(RatesResponse::from_snapshot(snapshot, &state.currency)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::GeoCache;
    use crate::config::RateFallback;
    use crate::pricing::models::PricingRate;
    use crate::pricing::services::testing::{service, StaticGeocoder};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(rate: Option<PricingRate>, fallback: RateFallback) -> axum::Router {
        let state = AppState {
            service: service(StaticGeocoder::nepal(), rate, fallback),
            geocache: GeoCache::default(),
            currency: "NPR".to_string(),
        };
        crate::app(state)
    }

    async fn send(
        app: axum::Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_estimate_endpoint() {
        let (status, body) = send(
            app(Some(PricingRate::new(dec!(10), dec!(5))), RateFallback::Unavailable),
            "POST",
            "/api/pricing/estimate",
            Some(json!({
                "from": "Kathmandu",
                "to": "Pokhara",
                "weight_kg": 20,
                "shipment_type": "group"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"]["amount"], "1219");
        assert_eq!(body["price"]["currency"], "NPR");
        assert_eq!(body["shipment_type"], "group");
        assert_eq!(body["degraded_rates"], false);
        assert_eq!(body["distance_km"], "142.39");
    }

    #[tokio::test]
    async fn test_estimate_unknown_place() {
        let (status, body) = send(
            app(Some(PricingRate::new(dec!(10), dec!(5))), RateFallback::Unavailable),
            "POST",
            "/api/pricing/estimate",
            Some(json!({ "from": "Kathmandu", "to": "Atlantis", "weight_kg": "20" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_type"], "place_not_found");
        assert_eq!(body["retryable"], false);
        assert!(body.get("price").is_none());
    }

    #[tokio::test]
    async fn test_estimate_rates_down() {
        let (status, body) = send(
            app(None, RateFallback::Unavailable),
            "POST",
            "/api/pricing/estimate",
            Some(json!({ "from": "Kathmandu", "to": "Pokhara", "weight_kg": 20 })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error_type"], "rates_unavailable");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        let bodies = [
            json!({ "from": "Kathmandu", "to": "Pokhara", "weight_kg": "abc" }),
            json!({ "from": "Kathmandu", "weight_kg": 20 }),
            json!({
                "from": "Kathmandu",
                "to": "Pokhara",
                "weight_kg": 20,
                "shipment_type": "bulk"
            }),
        ];

        for body in bodies {
            let (status, response) = send(
                app(Some(PricingRate::new(dec!(10), dec!(5))), RateFallback::Unavailable),
                "POST",
                "/api/pricing/estimate",
                Some(body),
            )
            .await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error_type"], "bad_request");
            assert_eq!(response["retryable"], false);
        }
    }

    #[tokio::test]
    async fn test_quote_without_content_type_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/pricing/quote")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(Some(PricingRate::ZERO), RateFallback::Unavailable)
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_huge_weight_is_bad_request() {
        let (status, body) = send(
            app(Some(PricingRate::new(dec!(10), dec!(5))), RateFallback::Unavailable),
            "POST",
            "/api/pricing/estimate",
            Some(json!({
                "from": "Kathmandu",
                "to": "Pokhara",
                "weight_kg": "79228162514264337593543950335"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "invalid_weight");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let (status, body) = send(
            app(Some(PricingRate::ZERO), RateFallback::Unavailable),
            "GET",
            "/api/pricing/nothing-here",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_type"], "not_found");
    }

    #[tokio::test]
    async fn test_quote_rejects_bad_latitude() {
        let (status, body) = send(
            app(Some(PricingRate::new(dec!(10), dec!(5))), RateFallback::Unavailable),
            "POST",
            "/api/pricing/quote",
            Some(json!({
                "origin": { "latitude": 123.0, "longitude": 85.3 },
                "destination": { "latitude": 28.2096, "longitude": 83.9856 },
                "weight_kg": 5
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "invalid_coordinate");
    }

    #[tokio::test]
    async fn test_rates_endpoint_degraded() {
        let (status, body) =
            send(app(None, RateFallback::Zero), "GET", "/api/pricing/rates", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["per_kilometer"], "0");
        assert_eq!(body["degraded"], true);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(
            app(Some(PricingRate::ZERO), RateFallback::Unavailable),
            "GET",
            "/health",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"]["places_size"], 0);
    }
}
