//! Configuration Module
//!
//! Handles loading and managing server and per-cache configuration from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Construction-time parameters of one named cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Lifetime of every inserted entry
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity, ttl }
    }

    /// Rejects a zero capacity or a zero TTL.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if self.ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Seconds between expiry sweeps, 0 disables the sweep
    pub sweep_interval: u64,
    /// User lookup cache
    pub users: CacheConfig,
    /// Per-résumé metadata cache
    pub resume_metadata: CacheConfig,
    /// Per-user application statistics cache
    pub application_stats: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 0, disabled)
    /// - `USER_CACHE_CAPACITY` / `USER_CACHE_TTL` (default: 1000 / 300s)
    /// - `METADATA_CACHE_CAPACITY` / `METADATA_CACHE_TTL` (default: 500 / 120s)
    /// - `STATS_CACHE_CAPACITY` / `STATS_CACHE_TTL` (default: 200 / 30s)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            sweep_interval: env_or("SWEEP_INTERVAL", defaults.sweep_interval),
            users: cache_from_env("USER_CACHE", defaults.users),
            resume_metadata: cache_from_env("METADATA_CACHE", defaults.resume_metadata),
            application_stats: cache_from_env("STATS_CACHE", defaults.application_stats),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            sweep_interval: 0,
            users: CacheConfig::new(1000, Duration::from_secs(300)),
            resume_metadata: CacheConfig::new(500, Duration::from_secs(120)),
            application_stats: CacheConfig::new(200, Duration::from_secs(30)),
        }
    }
}

fn cache_from_env(prefix: &str, default: CacheConfig) -> CacheConfig {
    CacheConfig {
        capacity: env_or(&format!("{prefix}_CAPACITY"), default.capacity),
        ttl: Duration::from_secs(env_or(&format!("{prefix}_TTL"), default.ttl.as_secs())),
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
