//! Cache key construction.
//!
//! Every read path and every invalidating write path derives its key through
//! this module, so the same logical entity always maps to the same string.
//!
//! ## Format
//!
//! `{namespace}:{part1}:{part2}:...`
//!
//! Each component is rendered with [`Display`] and escaped so that the
//! delimiter never appears inside it (`%` becomes `%25`, `:` becomes `%3A`).
//! The encoding is injective: different `(namespace, parts)` inputs never
//! produce the same key.
//!
//! ```
//! use resume_cache::{build_key, cache_key};
//!
//! assert_eq!(build_key("stats", ["applications", "u1"]), "stats:applications:u1");
//! assert_eq!(cache_key!("user", "profile", 42), "user:profile:42");
//! assert_eq!(build_key("metadata", ["a:b"]), "metadata:a%3Ab");
//! ```

use std::fmt::Display;

/// Separator between key components.
pub const DELIMITER: char = ':';

pub const USER_NAMESPACE: &str = "user";
pub const METADATA_NAMESPACE: &str = "metadata";
pub const STATS_NAMESPACE: &str = "stats";

/// Builds a key from a namespace and an ordered list of parts.
pub fn build_key<I, P>(namespace: &str, parts: I) -> String
where
    I: IntoIterator<Item = P>,
    P: Display,
{
    let mut key = String::with_capacity(namespace.len() + 16);
    push_escaped(&mut key, namespace);
    for part in parts {
        key.push(DELIMITER);
        push_escaped(&mut key, &part.to_string());
    }
    key
}

/// Builds a key from a namespace and parts of mixed types.
///
/// ```
/// use resume_cache::cache_key;
///
/// let user_id = 7u64;
/// assert_eq!(cache_key!("stats", "applications", user_id), "stats:applications:7");
/// assert_eq!(cache_key!("health"), "health");
/// ```
#[macro_export]
macro_rules! cache_key {
    ($namespace:expr $(,)?) => {
        $crate::keys::build_key::<_, &str>($namespace, [])
    };
    ($namespace:expr, $($part:expr),+ $(,)?) => {
        $crate::keys::build_key(
            $namespace,
            [$(&$part as &dyn ::std::fmt::Display),+],
        )
    };
}

fn push_escaped(out: &mut String, component: &str) {
    for ch in component.chars() {
        match ch {
            '%' => out.push_str("%25"),
            DELIMITER => out.push_str("%3A"),
            _ => out.push(ch),
        }
    }
}

// == Per-area keys ==
// Read paths and write paths both call these, never `build_key` directly.

/// Key of a user profile lookup.
pub fn user_key(user_id: u64) -> String {
    cache_key!(USER_NAMESPACE, "profile", user_id)
}

/// Key of one résumé's metadata (notes and tags).
pub fn resume_metadata_key(resume_id: u64) -> String {
    cache_key!(METADATA_NAMESPACE, "resume", resume_id)
}

/// Key of a user's aggregate application statistics.
pub fn application_stats_key(user_id: u64) -> String {
    cache_key!(STATS_NAMESPACE, "applications", user_id)
}
