use std::sync::Arc;

use playercache_db::CacheStore;
use playercache_worker::{DocumentCodec, RefreshQueue};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the store wraps a pool, the queue wraps a channel
/// sender.
#[derive(Clone)]
pub struct AppState {
    /// Persistent player cache.
    pub store: CacheStore,
    /// Producer half of the refresh worker's queue.
    pub refresh_queue: RefreshQueue,
    /// Decoder for stored payloads (table codec + document schema).
    pub documents: DocumentCodec,
    pub config: Arc<ServerConfig>,
}
