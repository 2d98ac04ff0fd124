//! API Module
//!
//! HTTP handlers and routing for the cache operations API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Statistics of every named cache
//! - `DELETE /caches/:name` - Clear one named cache
//! - `DELETE /caches/:name/keys/:key` - Invalidate one key

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
