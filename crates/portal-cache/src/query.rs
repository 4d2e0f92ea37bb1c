use std::future::Future;
use std::time::Duration;

use crate::store::TtlCache;

/// Returns the cached value for `key`, or awaits `producer` and caches its
/// successful result for `ttl`.
///
/// Producer errors are returned unchanged and nothing is cached. Concurrent
/// misses on the same key each run their own producer; the last write wins.
pub async fn cached_query<V, E, F, Fut>(
    cache: &TtlCache<V>,
    key: &str,
    ttl: Duration,
    producer: F,
) -> Result<V, E>
where
    V: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(value) = cache.get(key) {
        tracing::trace!(key = %key, "cache hit");
        return Ok(value);
    }

    tracing::trace!(key = %key, "cache miss");
    let value = producer().await?;
    cache.set(key, value.clone(), ttl);
    Ok(value)
}
