//! Named cache instances
//!
//! One independently configured [`BoundedExpiringCache`] per functional area,
//! built once at startup and handed to services as cheap handle clones.

use std::sync::Arc;

use tracing::info;

use crate::cache::{BoundedExpiringCache, Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result, ServiceError};
use crate::keys::{application_stats_key, resume_metadata_key, user_key};
use crate::models::{ApplicationStats, NamedCacheStats, ResumeId, ResumeMetadata, User, UserId};

pub const USERS: &str = "users";
pub const RESUME_METADATA: &str = "resume_metadata";
pub const APPLICATION_STATS: &str = "application_stats";

pub type UserCache = BoundedExpiringCache<User, ServiceError>;
pub type MetadataCache = BoundedExpiringCache<ResumeMetadata, ServiceError>;
pub type StatsCache = BoundedExpiringCache<ApplicationStats, ServiceError>;

// == App Caches ==
/// The process-wide set of named caches.
#[derive(Clone)]
pub struct AppCaches {
    pub users: UserCache,
    pub resume_metadata: MetadataCache,
    pub application_stats: StatsCache,
}

impl AppCaches {
    /// Builds every named cache from `config`, rejecting invalid settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Builds every named cache on a shared `clock`.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let caches = Self {
            users: BoundedExpiringCache::with_clock(USERS, config.users, Arc::clone(&clock))?,
            resume_metadata: BoundedExpiringCache::with_clock(
                RESUME_METADATA,
                config.resume_metadata,
                Arc::clone(&clock),
            )?,
            application_stats: BoundedExpiringCache::with_clock(
                APPLICATION_STATS,
                config.application_stats,
                clock,
            )?,
        };

        for stats in caches.stats() {
            info!(
                cache = %stats.name,
                capacity = stats.capacity,
                ttl_secs = stats.ttl_secs,
                "named cache ready"
            );
        }
        Ok(caches)
    }

    /// Per-cache statistics, in a fixed order.
    pub fn stats(&self) -> Vec<NamedCacheStats> {
        vec![
            named_stats(&self.users),
            named_stats(&self.resume_metadata),
            named_stats(&self.application_stats),
        ]
    }

    /// Clears the cache called `name`.
    pub fn clear(&self, name: &str) -> Result<()> {
        match name {
            USERS => self.users.clear(),
            RESUME_METADATA => self.resume_metadata.clear(),
            APPLICATION_STATS => self.application_stats.clear(),
            other => return Err(CacheError::UnknownCache(other.to_string())),
        }
        Ok(())
    }

    /// Deletes `key` from the cache called `name`.
    pub fn delete(&self, name: &str, key: &str) -> Result<()> {
        match name {
            USERS => self.users.delete(key),
            RESUME_METADATA => self.resume_metadata.delete(key),
            APPLICATION_STATS => self.application_stats.delete(key),
            other => return Err(CacheError::UnknownCache(other.to_string())),
        }
        Ok(())
    }

    /// Drops expired entries from every cache, returning the total removed.
    pub fn purge_expired(&self) -> usize {
        self.users.purge_expired()
            + self.resume_metadata.purge_expired()
            + self.application_stats.purge_expired()
    }

    /// Invalidates everything cached about `user_id` across areas,
    /// including the metadata of the résumés removed with the account.
    pub fn forget_user(&self, user_id: UserId, resume_ids: &[ResumeId]) {
        self.users.delete(&user_key(user_id));
        self.application_stats
            .delete(&application_stats_key(user_id));
        for &resume_id in resume_ids {
            self.resume_metadata.delete(&resume_metadata_key(resume_id));
        }
    }
}

fn named_stats<V, E>(cache: &BoundedExpiringCache<V, E>) -> NamedCacheStats
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<CacheError> + 'static,
{
    NamedCacheStats::new(
        cache.name(),
        cache.capacity(),
        cache.ttl().as_secs(),
        cache.stats(),
    )
}
