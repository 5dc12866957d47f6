//! Error handling for the application

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::pricing::responses::PricingErrorResponse;
use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, bool) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", false),
            AppError::Pricing(e) => match e {
                PricingError::PlaceNotFound { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "place_not_found", false)
                }
                PricingError::GeocodingUnavailable { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "geocoding_unavailable", true)
                }
                PricingError::RatesUnavailable { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "rates_unavailable", true)
                }
                PricingError::InvalidCoordinate { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_coordinate", false)
                }
                PricingError::InvalidWeight { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_weight", false)
                }
                PricingError::InvalidDistance => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_distance", false)
                }
                PricingError::PriceOutOfRange => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "price_out_of_range", false)
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, retryable) = self.parts();

        let message = match &self {
            AppError::Pricing(e) if e.is_retryable() => {
                tracing::warn!("Estimate unavailable: {}", e);
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = PricingErrorResponse {
            error_type: error_type.to_string(),
            message,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_mapping() {
        let not_found: AppError = PricingError::PlaceNotFound {
            place: "x".to_string(),
        }
        .into();
        assert_eq!(not_found.parts().0, StatusCode::UNPROCESSABLE_ENTITY);

        let outage: AppError = PricingError::RatesUnavailable {
            message: "502".to_string(),
        }
        .into();
        assert_eq!(
            outage.parts(),
            (StatusCode::SERVICE_UNAVAILABLE, "rates_unavailable", true)
        );

        let weight: AppError = PricingError::InvalidWeight {
            weight_kg: dec!(0),
        }
        .into();
        assert_eq!(weight.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_price_out_of_range_status() {
        let err: AppError = PricingError::PriceOutOfRange.into();
        assert_eq!(
            err.parts(),
            (StatusCode::UNPROCESSABLE_ENTITY, "price_out_of_range", false)
        );
    }

    #[test]
    fn test_bad_request_is_json_400() {
        let response = AppError::BadRequest("missing field `to`".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
    }
}
