//! Error types for the caching core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the caching core itself.
///
/// Reads, writes and invalidations are infallible; only construction and a
/// producer task that dies without reporting can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity or TTL rejected at construction
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// The task running a producer ended without a result
    #[error("Computation for key {key} was aborted")]
    ComputationAborted { key: String },

    /// No named cache answers to this name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            CacheError::ComputationAborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::UnknownCache(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Service Error Enum ==
/// Errors surfaced by the cached services.
///
/// `Clone` so one failed computation can be handed to every caller that was
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The persistence collaborator failed
    #[error("Repository error: {0}")]
    Repository(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == Result Type Alias ==
/// Convenience Result type for the caching core.
pub type Result<T> = std::result::Result<T, CacheError>;
