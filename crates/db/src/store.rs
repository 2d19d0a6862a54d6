//! Cache Store: point lookup and upsert of encoded player documents with
//! time-based staleness.
//!
//! Entries are never evicted. Expiry only decides whether a read reports the
//! entry as stale; the bytes stay servable until the next successful `put`.

use std::sync::Arc;
use std::time::Duration;

use playercache_core::clock::{Clock, SystemClock};
use playercache_core::types::{PlayerId, UnixSeconds};

use crate::models::CacheEntry;
use crate::repositories::PlayerCacheRepo;
use crate::DbPool;

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Stored bytes, `None` when the player has never been cached.
    pub payload: Option<Vec<u8>>,
    /// `true` when missing or when `now >= expires_at`.
    pub stale: bool,
}

impl Lookup {
    fn missing() -> Self {
        Self {
            payload: None,
            stale: true,
        }
    }
}

/// Shared handle to the persistent cache. Cheap to clone.
///
/// Every operation is a single SQL statement, so concurrent `get`/`put` on
/// one player never observe a half-written row and the last `put` wins.
#[derive(Clone)]
pub struct CacheStore {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Store backed by the system clock.
    pub fn new(pool: DbPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn now(&self) -> UnixSeconds {
        self.clock.now()
    }

    /// Read the payload for `id` and whether it needs a refresh.
    pub async fn get(&self, id: &PlayerId) -> Result<Lookup, sqlx::Error> {
        let now = self.clock.now();
        let lookup = match PlayerCacheRepo::find(&self.pool, &id.key()).await? {
            Some(entry) => Lookup {
                stale: entry.is_stale_at(now),
                payload: Some(entry.payload),
            },
            None => Lookup::missing(),
        };
        tracing::trace!(player_id = %id, hit = lookup.payload.is_some(), stale = lookup.stale, "Cache lookup");
        Ok(lookup)
    }

    /// Upsert `payload` for `id`, expiring `ttl` from now.
    pub async fn put(&self, id: &PlayerId, payload: &[u8], ttl: Duration) -> Result<(), sqlx::Error> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = self.clock.now().saturating_add(ttl_secs);
        PlayerCacheRepo::upsert(&self.pool, &id.key(), payload, expires_at).await?;
        tracing::debug!(player_id = %id, expires_at, bytes = payload.len(), "Cache entry written");
        Ok(())
    }

    /// The raw stored row, if any.
    pub async fn entry(&self, id: &PlayerId) -> Result<Option<CacheEntry>, sqlx::Error> {
        PlayerCacheRepo::find(&self.pool, &id.key()).await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}
