//! Repository for the `player_cache` table.

use futures::stream::BoxStream;
use playercache_core::types::UnixSeconds;
use sqlx::SqliteExecutor;

use crate::models::CacheEntry;
use crate::DbPool;

const COLUMNS: &str = "id, payload, expires_at";

/// Raw SQL access to cached player documents. Time is always passed in;
/// staleness policy lives in [`CacheStore`](crate::CacheStore).
pub struct PlayerCacheRepo;

impl PlayerCacheRepo {
    /// Find the entry for a canonical player key.
    pub async fn find<'e, E>(executor: E, id: &str) -> Result<Option<CacheEntry>, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM player_cache WHERE id = ?1");
        sqlx::query_as::<_, CacheEntry>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Insert or replace the entry for `id` in a single statement.
    pub async fn upsert<'e, E>(
        executor: E,
        id: &str,
        payload: &[u8],
        expires_at: UnixSeconds,
    ) -> Result<(), sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        sqlx::query(
            "INSERT INTO player_cache (id, payload, expires_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(id) DO UPDATE SET \
                payload = excluded.payload, \
                expires_at = excluded.expires_at",
        )
        .bind(id)
        .bind(payload)
        .bind(expires_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Number of cached players.
    pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM player_cache")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Stream every entry in key order without loading the table into memory.
    pub fn stream_all(pool: &DbPool) -> BoxStream<'_, Result<CacheEntry, sqlx::Error>> {
        sqlx::query_as::<_, CacheEntry>(
            "SELECT id, payload, expires_at FROM player_cache ORDER BY id",
        )
        .fetch(pool)
    }
}
