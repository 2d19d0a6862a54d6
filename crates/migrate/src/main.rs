use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use playercache_core::codec::PayloadCodec;
use playercache_migrate::{migrate, MigrateOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "playercache-migrate")]
#[command(about = "Re-encode a player cache database into a new file", long_about = None)]
struct Cli {
    /// Existing cache database to read
    #[arg(long, env = "MIGRATE_SOURCE")]
    source: PathBuf,

    /// New cache database to create (must not exist)
    #[arg(long, env = "MIGRATE_DESTINATION")]
    destination: PathBuf,

    /// Payload encoding of the source (plain, zstd, zstd:<level>)
    #[arg(long, default_value = "plain", env = "MIGRATE_FROM")]
    from: PayloadCodec,

    /// Payload encoding of the destination (plain, zstd, zstd:<level>)
    #[arg(long, default_value = "zstd", env = "MIGRATE_TO")]
    to: PayloadCodec,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.json_logs);

    let options = MigrateOptions {
        source: cli.source,
        destination: cli.destination,
        from: cli.from,
        to: cli.to,
    };

    if let Err(e) = migrate(&options).await {
        tracing::error!(error = %format!("{e:#}"), "Migration failed");
        return Err(e);
    }
    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "playercache_migrate=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
