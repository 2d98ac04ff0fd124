//! API Handlers
//!
//! HTTP request handlers for the cache operations endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::caches::AppCaches;
use crate::config::Config;
use crate::error::Result;
use crate::models::{HealthResponse, InvalidateResponse, StatsResponse};

/// Application state shared across all handlers.
///
/// The named caches are handles over shared state, so cloning the state per
/// request is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct AppState {
    pub caches: AppCaches,
}

impl AppState {
    /// Creates a new AppState around already built caches.
    pub fn new(caches: AppCaches) -> Self {
        Self { caches }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails when any named cache has a zero capacity or TTL.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(AppCaches::from_config(config)?))
    }
}

/// Handler for GET /stats
///
/// Returns statistics for every named cache.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        caches: state.caches.stats(),
    })
}

/// Handler for DELETE /caches/:name
///
/// Drops every entry of one named cache.
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    state.caches.clear(&name)?;
    info!(cache = %name, "cache cleared via API");

    Ok(Json(InvalidateResponse::cleared(name)))
}

/// Handler for DELETE /caches/:name/keys/:key
///
/// Invalidates one key. Deleting an absent key succeeds.
///
/// The path segment is percent-decoded before lookup, so the `%` escapes
/// that `build_key` writes must themselves be encoded as `%25` in the URL
/// (`metadata:a%3Ab` is sent as `metadata:a%253Ab`).
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<InvalidateResponse>> {
    state.caches.delete(&name, &key)?;
    info!(cache = %name, key = %key, "key invalidated via API");

    Ok(Json(InvalidateResponse::deleted(name, key)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
