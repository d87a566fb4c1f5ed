//! Local key-value cache
//!
//! Keeps the last gallery snapshot and the last coaching report so the next
//! start can paint immediately. Backed by a single SQLite table; values are
//! JSON documents with the time they were stored.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pa_common::api::GalleryPage;
use pa_common::models::CoachingReport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{debug, info};

use crate::error::DashResult;

/// Cache key of the gallery snapshot
pub const GALLERY_KEY: &str = "gallery_snapshot";
/// Cache key of the coaching report
pub const COACHING_KEY: &str = "coaching_report";

/// SQLite-backed cache
#[derive(Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    /// Open (creating if needed) the cache database at `path`
    pub async fn open(path: &Path) -> DashResult<Self> {
        let newly_created = !path.exists();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new cache: {}", path.display());
        } else {
            debug!("Opened existing cache: {}", path.display());
        }

        let cache = Self { pool };
        cache.create_table().await?;
        Ok(cache)
    }

    /// Private in-memory cache (tests, `--no-cache`)
    pub async fn in_memory() -> DashResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let cache = Self { pool };
        cache.create_table().await?;
        Ok(cache)
    }

    async fn create_table(&self) -> DashResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                stored_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ========================================
    // Generic entries
    // ========================================

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> DashResult<()> {
        self.put_json_at(key, value, Utc::now()).await
    }

    async fn put_json_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        stored_at: DateTime<Utc>,
    ) -> DashResult<()> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            r#"
            INSERT INTO cache_entries (key, value, stored_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(json)
        .bind(stored_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(key, "Cache entry stored");
        Ok(())
    }

    /// Read an entry, treating it as absent once older than `max_age`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Option<Duration>,
    ) -> DashResult<Option<T>> {
        self.get_json_at(key, max_age, Utc::now()).await
    }

    async fn get_json_at<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> DashResult<Option<T>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT value, stored_at FROM cache_entries WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let Some((json, stored_at)) = row else {
            return Ok(None);
        };

        if let Some(max_age) = max_age {
            let age_ms = now.timestamp_millis().saturating_sub(stored_at);
            if age_ms < 0 || age_ms as u128 >= max_age.as_millis() {
                debug!(key, age_ms, "Cache entry expired");
                return Ok(None);
            }
        }

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // Layout changed between versions; behave as a miss
                tracing::warn!(key, error = %e, "Discarding unreadable cache entry");
                self.remove(key).await?;
                Ok(None)
            }
        }
    }

    pub async fn remove(&self, key: &str) -> DashResult<()> {
        sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================
    // Typed entries
    // ========================================

    pub async fn save_gallery(&self, page: &GalleryPage) -> DashResult<()> {
        self.put_json(GALLERY_KEY, page).await
    }

    /// Last gallery snapshot if younger than `ttl`
    pub async fn load_gallery(&self, ttl: Duration) -> DashResult<Option<GalleryPage>> {
        self.get_json(GALLERY_KEY, Some(ttl)).await
    }

    pub async fn save_coaching(&self, report: &CoachingReport) -> DashResult<()> {
        self.put_json(COACHING_KEY, report).await
    }

    /// Last coaching report; kept until replaced
    pub async fn load_coaching(&self) -> DashResult<Option<CoachingReport>> {
        self.get_json(COACHING_KEY, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pa_common::models::{Photo, PhotoStatus};

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let cache = LocalCache::in_memory().await.unwrap();
        cache.put_json("k", &vec![1, 2, 3]).await.unwrap();
        cache.put_json("k", &vec![4]).await.unwrap();

        let value: Option<Vec<i32>> = cache.get_json("k", None).await.unwrap();
        assert_eq!(value, Some(vec![4]));

        let missing: Option<Vec<i32>> = cache.get_json("nope", None).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_gallery_expires_after_ttl() {
        let cache = LocalCache::in_memory().await.unwrap();
        let page = GalleryPage {
            pending: vec![Photo::new("a.jpg", PhotoStatus::Pending)],
            ..GalleryPage::default()
        };
        let stored_at = Utc::now() - chrono::Duration::minutes(6);
        cache.put_json_at(GALLERY_KEY, &page, stored_at).await.unwrap();

        let ttl = Duration::from_secs(300);
        assert!(cache.load_gallery(ttl).await.unwrap().is_none());

        let fresh: Option<GalleryPage> = cache
            .get_json_at(GALLERY_KEY, Some(ttl), stored_at + chrono::Duration::minutes(4))
            .await
            .unwrap();
        assert_eq!(fresh, Some(page));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_a_miss() {
        let cache = LocalCache::in_memory().await.unwrap();
        cache.put_json(COACHING_KEY, &"not a report").await.unwrap();

        assert!(cache.load_coaching().await.unwrap().is_none());
        let raw: Option<String> = cache.get_json(COACHING_KEY, None).await.unwrap();
        assert!(raw.is_none());
    }
}
