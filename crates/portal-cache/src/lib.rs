//! In-process caching for the incubator portal.
//!
//! - [`TtlCache`]: DashMap-backed store with per-entry TTL, lazy expiry and a
//!   background sweeper.
//! - [`cached_query`]: read-through helper for async producers.
//! - [`keys`]: key builders, TTL presets and prefix invalidation.

pub mod keys;
pub mod query;
pub mod store;

pub use keys::{
    CacheKeys, CacheTtl, invalidate_admin_stats, invalidate_collaborators, invalidate_innovators,
    invalidate_news, invalidate_user_permissions,
};
pub use query::cached_query;
pub use store::{CacheStats, CachedEntry, DEFAULT_SWEEP_INTERVAL, TtlCache};
