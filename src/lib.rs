//! Resume Cache - bounded, expiring, request-coalescing caches for a
//! résumé-management backend.
//!
//! Each named cache evicts its least recently used entry at capacity,
//! expires entries after a fixed TTL and runs at most one computation per
//! key at a time, sharing the outcome with every concurrent caller.

pub mod keys;

pub mod api;
pub mod cache;
pub mod caches;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod tasks;

pub use api::AppState;
pub use cache::BoundedExpiringCache;
pub use caches::AppCaches;
pub use config::Config;
pub use keys::build_key;
pub use tasks::spawn_sweep_task;
