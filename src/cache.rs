//! Time-limited answer cache
//!
//! One JSON file per query, named by the SHA-256 of the query text.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::storage::{read_json, write_json, StorageError};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: DateTime<Utc>,
    query: String,
    result: serde_json::Value,
}

/// Summary of what is on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
}

/// File-backed cache of agent results
#[derive(Debug, Clone)]
pub struct CacheManager {
    dir: PathBuf,
    ttl: Duration,
}

impl CacheManager {
    /// Create the cache directory if needed
    pub async fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self { dir, ttl })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key(query: &str) -> String {
        hex::encode(Sha256::digest(query.as_bytes()))
    }

    fn entry_path(&self, query: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(query)))
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let age = Utc::now().signed_duration_since(entry.timestamp);
        age.to_std().map(|age| age > self.ttl).unwrap_or(false)
    }

    /// Cached result for `query`, if present and fresh
    ///
    /// Expired entries are deleted. Unreadable or mismatched entries count as misses.
    pub async fn get<T: DeserializeOwned>(&self, query: &str) -> Option<T> {
        let path = self.entry_path(query);
        let entry: CacheEntry = match read_json(&path).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        if self.is_expired(&entry) {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }

        serde_json::from_value(entry.result).ok()
    }

    /// Store a result; failures are logged and swallowed
    pub async fn set<T: Serialize>(&self, query: &str, result: &T) {
        let result = match serde_json::to_value(result) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Could not encode cache entry");
                return;
            }
        };
        let entry = CacheEntry {
            timestamp: Utc::now(),
            query: query.to_string(),
            result,
        };
        if let Err(e) = write_json(&self.entry_path(query), &entry).await {
            tracing::warn!(error = %e, "Could not write cache entry");
        }
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut files = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?
        {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Remove entries older than the TTL; returns how many were removed
    pub async fn clear_expired(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            let Ok(Some(entry)) = read_json::<CacheEntry>(&path).await else {
                continue;
            };
            if self.is_expired(&entry) && tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
        tracing::debug!(removed, "Cleared expired cache entries");
        Ok(removed)
    }

    /// Remove every entry; returns how many were removed
    pub async fn clear_all(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for path in self.entry_files().await? {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| StorageError::io(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Count entries and how many of them are stale
    pub async fn stats(&self) -> Result<CacheStats, StorageError> {
        let mut stats = CacheStats::default();
        for path in self.entry_files().await? {
            stats.entries += 1;
            if let Ok(Some(entry)) = read_json::<CacheEntry>(&path).await {
                if self.is_expired(&entry) {
                    stats.expired += 1;
                }
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Answer {
        output: String,
    }

    fn answer(text: &str) -> Answer {
        Answer {
            output: text.to_string(),
        }
    }

    async fn backdate(cache: &CacheManager, query: &str, secs: i64) {
        let path = cache.entry_path(query);
        let mut entry: CacheEntry = read_json(&path).await.unwrap().unwrap();
        entry.timestamp = Utc::now() - chrono::Duration::seconds(secs);
        write_json(&path, &entry).await.unwrap();
    }

    #[test]
    fn test_key_is_sha256_hex() {
        let key = CacheManager::key("disk usage");
        assert_eq!(key.len(), 64);
        assert_eq!(key, CacheManager::key("disk usage"));
        assert_ne!(key, CacheManager::key("Disk usage"));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path(), Duration::from_secs(300)).await.unwrap();

        assert!(cache.get::<Answer>("uptime?").await.is_none());
        cache.set("uptime?", &answer("3 days")).await;
        assert_eq!(cache.get::<Answer>("uptime?").await, Some(answer("3 days")));
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path(), Duration::from_secs(60)).await.unwrap();
        cache.set("load", &answer("low")).await;
        backdate(&cache, "load", 120).await;

        assert!(cache.get::<Answer>("load").await.is_none());
        assert!(!cache.entry_path("load").exists());
    }

    #[tokio::test]
    async fn test_clear_expired_and_all() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path(), Duration::from_secs(60)).await.unwrap();
        cache.set("old", &answer("a")).await;
        cache.set("new", &answer("b")).await;
        backdate(&cache, "old", 3600).await;

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats, CacheStats { entries: 2, expired: 1 });

        assert_eq!(cache.clear_expired().await.unwrap(), 1);
        assert!(cache.get::<Answer>("new").await.is_some());

        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert_eq!(cache.stats().await.unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path(), Duration::from_secs(60)).await.unwrap();
        std::fs::write(cache.entry_path("q"), b"garbage").unwrap();
        assert!(cache.get::<Answer>("q").await.is_none());
    }
}
