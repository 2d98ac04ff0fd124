//! Response DTOs for the operations API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Statistics of one named cache (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct NamedCacheStats {
    pub name: String,
    pub capacity: usize,
    pub ttl_secs: u64,
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl NamedCacheStats {
    pub fn new(name: impl Into<String>, capacity: usize, ttl_secs: u64, stats: CacheStats) -> Self {
        Self {
            name: name.into(),
            capacity,
            ttl_secs,
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub caches: Vec<NamedCacheStats>,
}

/// Response body for the invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The cache that was invalidated
    pub cache: String,
    /// The key that was deleted, absent when the whole cache was cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl InvalidateResponse {
    pub fn cleared(cache: impl Into<String>) -> Self {
        let cache = cache.into();
        Self {
            message: format!("Cache '{}' cleared", cache),
            cache,
            key: None,
        }
    }

    pub fn deleted(cache: impl Into<String>, key: impl Into<String>) -> Self {
        let cache = cache.into();
        let key = key.into();
        Self {
            message: format!("Key '{}' invalidated in cache '{}'", key, cache),
            cache,
            key: Some(key),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
