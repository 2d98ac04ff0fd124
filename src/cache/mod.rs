//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! coalesced read-through computation.

mod bounded;
mod clock;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use bounded::BoundedExpiringCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
