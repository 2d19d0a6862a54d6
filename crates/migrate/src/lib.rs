//! Offline re-encoding of a player cache database.
//!
//! Copies every row of `player_cache` from one SQLite file into a new one,
//! decoding each payload with the source codec and encoding it with the
//! destination codec. Identifiers and expiry times are preserved, so no
//! entry becomes fresher or staler by being migrated.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use futures::TryStreamExt;
use playercache_core::codec::PayloadCodec;
use playercache_db::repositories::PlayerCacheRepo;

/// Rows between progress log lines.
pub const PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub from: PayloadCodec,
    pub to: PayloadCodec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub rows: u64,
    pub elapsed: Duration,
}

/// Run one migration.
///
/// Refuses to start when the source is missing or the destination already
/// exists. Rows are copied in a single transaction; on any failure the
/// partially written destination is removed.
pub async fn migrate(options: &MigrateOptions) -> Result<MigrationReport> {
    if !options.source.is_file() {
        bail!("source database {} does not exist", options.source.display());
    }
    if options.destination.exists() {
        bail!(
            "destination database {} already exists",
            options.destination.display()
        );
    }

    let result = copy_rows(options).await;
    if result.is_err() {
        remove_database_files(&options.destination);
    }
    result
}

async fn copy_rows(options: &MigrateOptions) -> Result<MigrationReport> {
    let source = playercache_db::create_file_pool(&options.source, false)
        .await
        .with_context(|| format!("opening {}", options.source.display()))?;
    let destination = playercache_db::create_file_pool(&options.destination, true)
        .await
        .with_context(|| format!("creating {}", options.destination.display()))?;
    playercache_db::run_migrations(&destination)
        .await
        .context("creating destination schema")?;

    tracing::info!(
        source = %options.source.display(),
        destination = %options.destination.display(),
        from = %options.from,
        to = %options.to,
        "Migration started"
    );

    let started = Instant::now();
    let mut rows: u64 = 0;
    let mut tx = destination.begin().await?;
    let mut entries = PlayerCacheRepo::stream_all(&source);

    while let Some(entry) = entries.try_next().await.context("reading source row")? {
        let json = options
            .from
            .decode(&entry.payload)
            .with_context(|| format!("decoding payload of {}", entry.id))?;
        let payload = options
            .to
            .encode(&json)
            .with_context(|| format!("encoding payload of {}", entry.id))?;
        PlayerCacheRepo::upsert(&mut *tx, &entry.id, &payload, entry.expires_at).await?;

        rows += 1;
        if rows % PROGRESS_EVERY == 0 {
            tracing::info!(
                rows,
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Migration progress"
            );
        }
    }
    drop(entries);

    tx.commit().await.context("committing destination")?;
    let elapsed = started.elapsed();
    tracing::info!(rows, elapsed_secs = elapsed.as_secs_f64(), "Migration complete");

    source.close().await;
    destination.close().await;

    Ok(MigrationReport { rows, elapsed })
}

fn remove_database_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = ?file, error = %e, "Failed to remove partial destination"),
        }
    }
}
