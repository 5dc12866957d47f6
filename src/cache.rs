//! In-memory caching using moka
//!
//! Successful geocoding lookups are cached so that repeated estimates for the
//! same addresses do not hit the upstream search service on every keystroke.
//! Rates are never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info};

use crate::geocoding::{GeocodeError, GeocodingClient};
use crate::pricing::models::Coordinate;

/// Cache of resolved place names
#[derive(Clone)]
pub struct GeoCache {
    /// Normalised place name -> coordinate
    pub places: Cache<String, Coordinate>,
}

impl GeoCache {
    /// Create a cache holding up to 1000 places for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            places: Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .time_to_idle(ttl / 2)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            places_size: self.places.entry_count(),
        }
    }

    /// Invalidate all cached places
    pub fn invalidate_all(&self) {
        self.places.invalidate_all();
        info!("Geocode cache invalidated");
    }

    /// Case and whitespace insensitive cache key
    pub fn place_key(place: &str) -> String {
        place
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub places_size: u64,
}

/// `GeocodingClient` decorator that consults a `GeoCache` first.
///
/// Only successful lookups are stored; NotFound and transient failures always
/// go back upstream on the next call.
pub struct CachedGeocoder {
    inner: Arc<dyn GeocodingClient>,
    cache: GeoCache,
}

impl CachedGeocoder {
    pub fn new(inner: Arc<dyn GeocodingClient>, cache: GeoCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }
}

#[async_trait]
impl GeocodingClient for CachedGeocoder {
    async fn resolve(&self, place: &str) -> Result<Coordinate, GeocodeError> {
        let key = GeoCache::place_key(place);
        if key.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        if let Some(cached) = self.cache.places.get(&key).await {
            debug!("Cache HIT for place: {}", key);
            return Ok(cached);
        }

        debug!("Cache MISS for place: {}", key);
        let coordinate = self.inner.resolve(place).await?;
        self.cache.places.insert(key, coordinate).await;
        Ok(coordinate)
    }
}
