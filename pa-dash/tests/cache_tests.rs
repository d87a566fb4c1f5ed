//! Local cache persistence tests (on-disk SQLite)

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{load, ScriptedGateway};
use pa_common::api::GalleryPage;
use pa_common::config::SyncConfig;
use pa_common::events::EventBus;
use pa_common::models::{Photo, PhotoStatus};
use pa_dash::cache::LocalCache;
use pa_dash::Dashboard;
use tempfile::TempDir;

const TTL: Duration = Duration::from_secs(300);

#[tokio::test]
async fn test_gallery_survives_reopen_in_new_directory() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("cache").join("dash.db");

    let page = GalleryPage {
        pending: vec![Photo::new("p.jpg", PhotoStatus::Pending)],
        reviewed: vec![Photo::new("r.jpg", PhotoStatus::Reviewed)],
        ..Default::default()
    };

    {
        let cache = LocalCache::open(&db_path).await.unwrap();
        cache.save_gallery(&page).await.unwrap();
    }
    assert!(db_path.exists());

    let reopened = LocalCache::open(&db_path).await.unwrap();
    let restored = reopened.load_gallery(TTL).await.unwrap().unwrap();
    assert_eq!(restored, page);
}

#[tokio::test]
async fn test_dashboard_writes_cache_for_next_start() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dash.db");

    let first = Dashboard::new(
        Arc::new(ScriptedGateway::new()),
        EventBus::default(),
        SyncConfig::default(),
    )
    .with_cache(LocalCache::open(&db_path).await.unwrap(), TTL);
    load(&first, &["p1.jpg", "p2.jpg"], &["r1.jpg"]).await;

    let second = Dashboard::new(
        Arc::new(ScriptedGateway::new()),
        EventBus::default(),
        SyncConfig::default(),
    )
    .with_cache(LocalCache::open(&db_path).await.unwrap(), TTL);

    assert!(second.restore_from_cache().await);
    let pending: Vec<_> = second
        .rows(PhotoStatus::Pending)
        .await
        .into_iter()
        .map(|r| r.filename().to_string())
        .collect();
    assert_eq!(pending, vec!["p1.jpg", "p2.jpg"]);
    assert_eq!(second.rows(PhotoStatus::Reviewed).await.len(), 1);
}

#[tokio::test]
async fn test_single_partition_not_cached() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dash.db");

    let dash = Dashboard::new(
        Arc::new(ScriptedGateway::new()),
        EventBus::default(),
        SyncConfig::default(),
    )
    .with_cache(LocalCache::open(&db_path).await.unwrap(), TTL);

    dash.on_snapshot(pa_dash::feed::FeedUpdate {
        status: PhotoStatus::Pending,
        records: helpers::photos(&["p.jpg"], PhotoStatus::Pending),
    })
    .await;

    let cache = LocalCache::open(&db_path).await.unwrap();
    assert!(cache.load_gallery(TTL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_cache_restores_nothing() {
    let dir = TempDir::new().unwrap();
    let dash = Dashboard::new(
        Arc::new(ScriptedGateway::new()),
        EventBus::default(),
        SyncConfig::default(),
    )
    .with_cache(LocalCache::open(&dir.path().join("empty.db")).await.unwrap(), TTL);

    assert!(!dash.restore_from_cache().await);
    assert!(dash.rows(PhotoStatus::Pending).await.is_empty());
}
