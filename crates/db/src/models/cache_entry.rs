//! Row model for the `player_cache` table.

use playercache_core::types::UnixSeconds;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `player_cache` table.
///
/// `payload` is opaque here; decoding belongs to the refresh worker's
/// document layer.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CacheEntry {
    pub id: String,
    #[serde(skip_serializing)]
    pub payload: Vec<u8>,
    pub expires_at: UnixSeconds,
}

impl CacheEntry {
    /// An entry is stale once `now` reaches its expiry.
    pub fn is_stale_at(&self, now: UnixSeconds) -> bool {
        now >= self.expires_at
    }
}
