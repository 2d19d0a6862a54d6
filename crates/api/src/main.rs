use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use playercache_api::config::ServerConfig;
use playercache_api::router::build_app_router;
use playercache_api::state::AppState;
use playercache_db::CacheStore;
use playercache_upstream::{HypixelSource, UpstreamClient};
use playercache_worker::{DocumentCodec, RefreshWorker};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "playercache_api=debug,playercache_worker=debug,tower_http=debug".into()
    });
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        codec = %config.payload_codec,
        api_key_configured = config.has_api_key(),
        "Loaded server configuration"
    );
    if !config.has_api_key() {
        tracing::warn!("No upstream API key configured; cache misses will be answered with 403");
    }

    // --- Database ---
    let pool = playercache_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open cache database");
    tracing::info!(database_url = %config.database_url, "Database connection pool created");

    playercache_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    playercache_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store = CacheStore::new(pool.clone());

    // --- Refresh worker ---
    let client = UpstreamClient::new(config.upstream()).expect("Failed to build upstream client");
    let source = Arc::new(HypixelSource::new(client));
    let worker = RefreshWorker::spawn(store.clone(), source, config.payload_codec, config.worker());

    // --- App state ---
    let state = AppState {
        store,
        refresh_queue: worker.queue(),
        documents: DocumentCodec::new(config.payload_codec),
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    worker
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
