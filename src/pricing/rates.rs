//! Rate lookups against the application backend.
//!
//! Rates are fetched fresh for every estimate; nothing here is cached.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::{debug, instrument};

use super::models::PricingRate;

/// Rate fetch failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum RatesError {
    #[error("rates request failed: {0}")]
    Transport(String),

    #[error("rates endpoint returned status {0}")]
    Status(u16),

    #[error("malformed rates response: {0}")]
    Malformed(String),

    #[error("negative rate {field} = {value}")]
    Negative { field: &'static str, value: Decimal },
}

/// Source of the current per-kilometer and per-kilogram rates
#[async_trait]
pub trait PricingRepository: Send + Sync {
    async fn current_rates(&self) -> Result<PricingRate, RatesError>;
}

/// Body of `GET /pricing`
#[derive(Debug, Deserialize)]
pub struct RatesPayload {
    #[serde(deserialize_with = "decimal_from_number_or_string")]
    pub price_per_km: Decimal,
    #[serde(deserialize_with = "decimal_from_number_or_string")]
    pub price_per_kg: Decimal,
}

impl RatesPayload {
    /// Reject negative rates rather than pricing with them
    pub fn into_rate(self) -> Result<PricingRate, RatesError> {
        if self.price_per_km < Decimal::ZERO {
            return Err(RatesError::Negative {
                field: "price_per_km",
                value: self.price_per_km,
            });
        }
        if self.price_per_kg < Decimal::ZERO {
            return Err(RatesError::Negative {
                field: "price_per_kg",
                value: self.price_per_kg,
            });
        }
        Ok(PricingRate::new(self.price_per_km, self.price_per_kg))
    }
}

/// The backend sends rates either as JSON numbers or numeric strings
fn decimal_from_number_or_string<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => Decimal::from_str(s.trim()).map_err(serde::de::Error::custom),
        Raw::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Decimal::from(i));
            }
            n.as_f64()
                .and_then(Decimal::from_f64)
                .ok_or_else(|| serde::de::Error::custom(format!("unrepresentable rate {}", n)))
        }
    }
}

/// `PricingRepository` backed by the booking backend's REST API
#[derive(Clone)]
pub struct BackendRatesClient {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl BackendRatesClient {
    pub fn new(
        backend_url: &str,
        api_token: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/pricing", backend_url.trim_end_matches('/')),
            api_token,
        })
    }
}

#[async_trait]
impl PricingRepository for BackendRatesClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn current_rates(&self) -> Result<PricingRate, RatesError> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RatesError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RatesError::Status(status.as_u16()));
        }

        let payload: RatesPayload = response
            .json()
            .await
            .map_err(|e| RatesError::Malformed(e.to_string()))?;

        let rate = payload.into_rate()?;
        debug!(
            per_km = %rate.per_kilometer,
            per_kg = %rate.per_kilogram,
            "Fetched current rates"
        );
        Ok(rate)
    }
}
