//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_COUNTRY_CODES: &str = "np";
const DEFAULT_CURRENCY: &str = "NPR";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_GEOCODE_CACHE_TTL_SECS: u64 = 60 * 60;
const MAX_GEOCODE_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;
const DEFAULT_USER_AGENT: &str = concat!("trip-pricing/", env!("CARGO_PKG_VERSION"));

/// What to do when the backend rates cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateFallback {
    /// Report the estimate as unavailable
    #[default]
    Unavailable,
    /// Price with zero rates and flag the estimate as degraded
    Zero,
}

impl FromStr for RateFallback {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unavailable" => Ok(RateFallback::Unavailable),
            "zero" => Ok(RateFallback::Zero),
            other => Err(ConfigError::Invalid {
                key: "RATE_FALLBACK",
                value: other.to_string(),
            }),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub geocoding_url: String,
    pub geocoding_country_codes: String,
    pub backend_url: String,
    pub backend_api_token: Option<String>,
    pub http_timeout: Duration,
    pub http_user_agent: String,
    pub rate_fallback: RateFallback,
    pub currency: String,
    pub geocode_cache_ttl: Duration,
}

impl Config {
    /// Load from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr: SocketAddr = parse_or(&get, "BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let backend_url = get("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let http_timeout_secs: u64 =
            parse_or(&get, "HTTP_TIMEOUT_SECS", &DEFAULT_HTTP_TIMEOUT_SECS.to_string())?;
        if http_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        let cache_ttl_secs: u64 = parse_or(
            &get,
            "GEOCODE_CACHE_TTL_SECS",
            &DEFAULT_GEOCODE_CACHE_TTL_SECS.to_string(),
        )?;
        if cache_ttl_secs == 0 || cache_ttl_secs > MAX_GEOCODE_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: "GEOCODE_CACHE_TTL_SECS",
                value: cache_ttl_secs.to_string(),
            });
        }
        let rate_fallback = match get("RATE_FALLBACK") {
            Some(v) => v.parse()?,
            None => RateFallback::default(),
        };

        Ok(Self {
            bind_addr,
            geocoding_url: get("GEOCODING_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            geocoding_country_codes: get("GEOCODING_COUNTRY_CODES")
                .unwrap_or_else(|| DEFAULT_COUNTRY_CODES.to_string()),
            backend_url,
            backend_api_token: get("BACKEND_API_TOKEN"),
            http_timeout: Duration::from_secs(http_timeout_secs),
            http_user_agent: get("HTTP_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            rate_fallback,
            currency: get("CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            geocode_cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key).unwrap_or_else(|| default.to_string());
    raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("BACKEND_URL", "https://api.example.test")]).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.geocoding_url, DEFAULT_GEOCODING_URL);
        assert_eq!(config.geocoding_country_codes, "np");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.rate_fallback, RateFallback::Unavailable);
        assert_eq!(config.currency, "NPR");
        assert!(config.backend_api_token.is_none());
    }

    #[test]
    fn test_backend_url_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("BACKEND_URL"))));
        assert!(matches!(
            load(&[("BACKEND_URL", "  ")]),
            Err(ConfigError::Missing("BACKEND_URL"))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BACKEND_URL", "https://api.example.test"),
            ("BACKEND_API_TOKEN", "tok"),
            ("HTTP_TIMEOUT_SECS", "3"),
            ("RATE_FALLBACK", "Zero"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();

        assert_eq!(config.backend_api_token.as_deref(), Some("tok"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.rate_fallback, RateFallback::Zero);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_cache_ttl_upper_bound_accepted() {
        let config = load(&[
            ("BACKEND_URL", "https://api.example.test"),
            ("GEOCODE_CACHE_TTL_SECS", "2592000"),
        ])
        .unwrap();

        assert_eq!(config.geocode_cache_ttl, Duration::from_secs(2_592_000));
        crate::cache::GeoCache::new(config.geocode_cache_ttl);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            load(&[("BACKEND_URL", "x"), ("HTTP_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::Invalid { key: "HTTP_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            load(&[("BACKEND_URL", "x"), ("HTTP_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { key: "HTTP_TIMEOUT_SECS", .. })
        ));
        for ttl in ["0", "999999999999", "18446744073709551615"] {
            assert!(matches!(
                load(&[("BACKEND_URL", "x"), ("GEOCODE_CACHE_TTL_SECS", ttl)]),
                Err(ConfigError::Invalid { key: "GEOCODE_CACHE_TTL_SECS", .. })
            ));
        }
        assert!(matches!(
            load(&[("BACKEND_URL", "x"), ("RATE_FALLBACK", "guess")]),
            Err(ConfigError::Invalid { key: "RATE_FALLBACK", .. })
        ));
    }
}
