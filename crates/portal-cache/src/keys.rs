//! Cache key construction and invalidation policy.
//!
//! Keys are `<namespace>:<scope>:<page>:<limit>` strings. Invalidation is
//! prefix based: a write to an entity drops every cached page for it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::TtlCache;

pub const COLLABORATORS_PREFIX: &str = "collaborators:";
pub const INNOVATORS_PREFIX: &str = "innovators:";
pub const NEWS_PREFIX: &str = "news:";

/// Builders for every cache key used by the portal.
pub struct CacheKeys;

impl CacheKeys {
    pub fn public_collaborators(page: u32, limit: u32) -> String {
        format!("collaborators:public:{page}:{limit}")
    }

    pub fn public_innovators(page: u32, limit: u32) -> String {
        format!("innovators:public:{page}:{limit}")
    }

    pub fn news_articles(page: u32, limit: u32) -> String {
        format!("news:articles:{page}:{limit}")
    }

    pub fn admin_stats() -> String {
        "admin:stats".to_string()
    }

    pub fn user_permissions(user_id: &str) -> String {
        format!("user:permissions:{user_id}")
    }
}

/// TTL presets per kind of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtl {
    /// Public listings.
    #[serde(with = "humantime_serde")]
    pub public: Duration,

    /// Admin dashboards and statistics.
    #[serde(with = "humantime_serde")]
    pub admin: Duration,

    /// Per-user data such as permissions.
    #[serde(with = "humantime_serde")]
    pub user: Duration,

    /// Rarely changing content.
    #[serde(rename = "static", with = "humantime_serde")]
    pub static_content: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            public: Duration::from_secs(300),
            admin: Duration::from_secs(60),
            user: Duration::from_secs(120),
            static_content: Duration::from_secs(3600),
        }
    }
}

pub fn invalidate_collaborators<V>(cache: &TtlCache<V>) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    cache.delete_prefix(COLLABORATORS_PREFIX)
}

pub fn invalidate_innovators<V>(cache: &TtlCache<V>) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    cache.delete_prefix(INNOVATORS_PREFIX)
}

pub fn invalidate_news<V>(cache: &TtlCache<V>) -> usize
where
    V: Clone + Send + Sync + 'static,
{
    cache.delete_prefix(NEWS_PREFIX)
}

pub fn invalidate_admin_stats<V>(cache: &TtlCache<V>) -> bool
where
    V: Clone + Send + Sync + 'static,
{
    cache.delete(&CacheKeys::admin_stats())
}

pub fn invalidate_user_permissions<V>(cache: &TtlCache<V>, user_id: &str) -> bool
where
    V: Clone + Send + Sync + 'static,
{
    cache.delete(&CacheKeys::user_permissions(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> TtlCache<u32> {
        let cache = TtlCache::new();
        let ttl = CacheTtl::default().public;
        cache.set(CacheKeys::public_collaborators(1, 10), 1, ttl);
        cache.set(CacheKeys::public_collaborators(2, 50), 2, ttl);
        cache.set(CacheKeys::public_innovators(1, 10), 3, ttl);
        cache.set(CacheKeys::news_articles(1, 10), 4, ttl);
        cache.set(CacheKeys::admin_stats(), 5, ttl);
        cache.set(CacheKeys::user_permissions("u1"), 6, ttl);
        cache
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(
            CacheKeys::public_collaborators(3, 25),
            "collaborators:public:3:25"
        );
        assert_eq!(CacheKeys::public_innovators(1, 10), "innovators:public:1:10");
        assert_eq!(CacheKeys::news_articles(2, 5), "news:articles:2:5");
        assert_eq!(CacheKeys::user_permissions("abc"), "user:permissions:abc");
    }

    #[test]
    fn test_invalidate_collaborators_leaves_other_prefixes() {
        let cache = seeded();

        assert_eq!(invalidate_collaborators(&cache), 2);
        assert!(!cache.has(&CacheKeys::public_collaborators(1, 10)));
        assert!(!cache.has(&CacheKeys::public_collaborators(2, 50)));
        assert!(cache.has(&CacheKeys::public_innovators(1, 10)));
        assert!(cache.has(&CacheKeys::news_articles(1, 10)));
        assert!(cache.has(&CacheKeys::admin_stats()));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_individual_invalidation() {
        let cache = seeded();

        assert!(invalidate_admin_stats(&cache));
        assert!(invalidate_user_permissions(&cache, "u1"));
        assert!(!invalidate_user_permissions(&cache, "u2"));
        assert_eq!(invalidate_innovators(&cache), 1);
        assert_eq!(invalidate_news(&cache), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_default_ttls() {
        let ttl = CacheTtl::default();
        assert_eq!(ttl.public, Duration::from_secs(300));
        assert_eq!(ttl.admin, Duration::from_secs(60));
        assert_eq!(ttl.user, Duration::from_secs(120));
        assert_eq!(ttl.static_content, Duration::from_secs(3600));
    }
}
