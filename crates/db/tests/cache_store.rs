//! File-backed tests for the cache store: durability across reopen and
//! concurrent writers.

use std::time::Duration;

use playercache_core::types::PlayerId;
use playercache_db::repositories::PlayerCacheRepo;
use playercache_db::CacheStore;
use tempfile::TempDir;

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("cache.db").display())
}

async fn open(url: &str) -> CacheStore {
    let pool = playercache_db::create_pool(url).await.unwrap();
    playercache_db::run_migrations(&pool).await.unwrap();
    CacheStore::new(pool)
}

#[tokio::test]
async fn database_file_is_created_on_first_run() {
    let dir = TempDir::new().unwrap();
    let store = open(&database_url(&dir)).await;
    store.health_check().await.unwrap();
    assert!(dir.path().join("cache.db").exists());
}

#[tokio::test]
async fn entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);
    let id = PlayerId::parse("853c80ef-3c37-49fd-aa49-938b674adae6").unwrap();

    {
        let store = open(&url).await;
        store
            .put(&id, br#"{"name":"jeb_"}"#, Duration::from_secs(1800))
            .await
            .unwrap();
        store.pool().close().await;
    }

    let store = open(&url).await;
    let lookup = store.get(&id).await.unwrap();
    assert_eq!(lookup.payload.as_deref(), Some(&br#"{"name":"jeb_"}"#[..]));
    assert!(!lookup.stale);
}

#[tokio::test]
async fn concurrent_puts_leave_one_row() {
    let dir = TempDir::new().unwrap();
    let store = open(&database_url(&dir)).await;
    let id = PlayerId::parse("853c80ef-3c37-49fd-aa49-938b674adae6").unwrap();

    let mut handles = Vec::new();
    for i in 0..10u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.put(&id, &[i; 16], Duration::from_secs(60)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(PlayerCacheRepo::count(store.pool()).await.unwrap(), 1);
    let entry = store.entry(&id).await.unwrap().unwrap();
    // Whichever write landed last, the row is one of them in full.
    assert_eq!(entry.payload.len(), 16);
    assert!(entry.payload.iter().all(|b| *b == entry.payload[0]));
}
