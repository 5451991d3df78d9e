// src/ingest/cache.rs
//! TTL-keyed blob cache backed by one JSON document per cached adapter.
//!
//! Layout on disk: `{"timestamp": <epoch-ms>, "articles": [...]}`. Entries are
//! replaced wholesale; a missing or corrupt file reads as a miss.

use std::path::{Path, PathBuf};
use std::time::Duration;

use metrics::counter;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<T> {
    /// Epoch milliseconds of the fetch that produced `articles`.
    pub timestamp: i64,
    pub articles: Vec<T>,
}

impl<T> CacheEntry<T> {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        // A timestamp from the future means a clock jump or a hand-edited file.
        let age = self.age_ms(now_ms);
        age >= 0 && age < ttl_ms
    }
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the entry regardless of age. Any failure is `None`.
    pub async fn load<T: DeserializeOwned>(&self) -> Option<CacheEntry<T>> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Payload of an entry younger than `ttl`, else `None`.
    pub async fn load_fresh<T: DeserializeOwned>(
        &self,
        now_ms: i64,
        ttl: Duration,
    ) -> Option<Vec<T>> {
        match self.load::<T>().await {
            Some(entry) if entry.is_fresh(now_ms, ttl) => {
                counter!("curator_cache_hits_total").increment(1);
                tracing::info!(
                    target: "ingest",
                    path = %self.path.display(),
                    age_mins = entry.age_ms(now_ms) / 60_000,
                    "serving from cache"
                );
                Some(entry.articles)
            }
            _ => {
                counter!("curator_cache_misses_total").increment(1);
                tracing::debug!(target: "ingest", path = %self.path.display(), "no valid cache");
                None
            }
        }
    }

    /// Replace the entry. Writes a sibling temp file, then renames it over the target.
    pub async fn store<T: Serialize>(&self, entry: &CacheEntry<T>) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(tmp, &self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);
    const MIN_MS: i64 = 60_000;

    fn entry(ts: i64) -> CacheEntry<String> {
        CacheEntry {
            timestamp: ts,
            articles: vec!["a".into(), "b".into()],
        }
    }

    #[tokio::test]
    async fn fresh_within_window_stale_after() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache/news-api.json"));
        let t = 1_750_000_000_000i64;
        store.store(&entry(t)).await.unwrap();

        let hit: Option<Vec<String>> = store.load_fresh(t + 30 * MIN_MS, HOUR).await;
        assert_eq!(hit, Some(vec!["a".to_string(), "b".to_string()]));

        let miss: Option<Vec<String>> = store.load_fresh(t + 90 * MIN_MS, HOUR).await;
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn exact_window_boundary_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("c.json"));
        store.store(&entry(0)).await.unwrap();
        let v: Option<Vec<String>> = store.load_fresh(60 * MIN_MS, HOUR).await;
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn future_timestamp_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("c.json"));
        store.store(&entry(10 * MIN_MS)).await.unwrap();
        let v: Option<Vec<String>> = store.load_fresh(0, HOUR).await;
        assert!(v.is_none());
        assert!(!entry(MIN_MS).is_fresh(0, HOUR));
    }

    #[tokio::test]
    async fn missing_and_corrupt_files_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("nope.json"));
        let v: Option<Vec<String>> = store.load_fresh(0, HOUR).await;
        assert!(v.is_none());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        let store = CacheStore::new(corrupt);
        let v: Option<Vec<String>> = store.load_fresh(0, HOUR).await;
        assert!(v.is_none());
    }

    #[tokio::test]
    async fn store_replaces_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("c.json"));
        store.store(&entry(1)).await.unwrap();
        store
            .store(&CacheEntry {
                timestamp: 2,
                articles: vec!["z".to_string()],
            })
            .await
            .unwrap();
        let got: CacheEntry<String> = store.load().await.unwrap();
        assert_eq!(got.timestamp, 2);
        assert_eq!(got.articles, vec!["z".to_string()]);
    }
}
