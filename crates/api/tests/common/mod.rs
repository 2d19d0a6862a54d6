#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use playercache_api::config::ServerConfig;
use playercache_api::router::build_app_router;
use playercache_api::state::AppState;
use playercache_core::clock::ManualClock;
use playercache_core::codec::PayloadCodec;
use playercache_core::types::PlayerId;
use playercache_db::CacheStore;
use playercache_worker::queue::QueueReceiver;
use playercache_worker::{DocumentCodec, PlayerDocument, RefreshQueue, RefreshRequest};
use serde_json::{Map, Value};
use tower::ServiceExt;

pub const START: i64 = 1_700_000_000;

/// Build a test `ServerConfig` with safe defaults and the given credential.
pub fn test_config(api_key: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        api_key: api_key.map(str::to_string),
        upstream_base_url: "http://127.0.0.1:9".to_string(),
        profile_base_url: "http://127.0.0.1:9".to_string(),
        payload_codec: PayloadCodec::Plain,
        cache_ttl_secs: 1800,
        min_refresh_protocol: 0,
        request_timeout_secs: 30,
        upstream_timeout_secs: 1,
        shutdown_timeout_secs: 1,
    }
}

/// Router plus direct handles on everything behind it.
///
/// No worker runs: the receiver is kept here so tests can inspect exactly
/// what the handler enqueued.
pub struct TestApp {
    pub router: Router,
    pub store: CacheStore,
    pub clock: ManualClock,
    pub queue: RefreshQueue,
    pub receiver: QueueReceiver,
    pub documents: DocumentCodec,
}

pub async fn build_test_app(config: ServerConfig) -> TestApp {
    let pool = playercache_db::create_memory_pool().await.unwrap();
    playercache_db::run_migrations(&pool).await.unwrap();
    let clock = ManualClock::new(START);
    let store = CacheStore::with_clock(pool, Arc::new(clock.clone()));
    let (queue, receiver) = RefreshQueue::channel();
    let documents = DocumentCodec::new(config.payload_codec);

    let state = AppState {
        store: store.clone(),
        refresh_queue: queue.clone(),
        documents,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        clock,
        queue,
        receiver,
        documents,
    }
}

impl TestApp {
    /// Store a decodable document named `name` that expires after `ttl_secs`.
    pub async fn seed(&self, id: &PlayerId, name: &str, ttl_secs: u64) -> Vec<u8> {
        let doc = PlayerDocument::new(Map::new(), Some(name.to_string()), self.clock_now());
        let payload = self.documents.encode(&doc).unwrap();
        self.store
            .put(id, &payload, Duration::from_secs(ttl_secs))
            .await
            .unwrap();
        payload
    }

    pub fn clock_now(&self) -> i64 {
        self.store.now()
    }

    /// Requests enqueued so far, in order.
    pub async fn drain_queue(&mut self) -> Vec<RefreshRequest> {
        let mut out = Vec::new();
        while self.queue.depth() > 0 {
            match self.receiver.recv().await {
                Some(request) => out.push(request),
                None => break,
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    get_with_headers(app, uri, &[]).await
}

pub async fn get_with_headers(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
