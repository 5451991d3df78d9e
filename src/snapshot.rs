//! Snapshot Store: the curated document and the raw debug document.
//!
//! Both are pretty-printed JSON arrays replaced wholesale on every write. A write
//! lands in `<file>.tmp` first and is renamed over the target, so a failed write
//! leaves the previous snapshot intact. Reads never fail: anything unreadable is
//! an empty list.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::analyze::curator::CuratedArticle;
use crate::analyze::rank::CURATED_CAP;
use crate::config::CuratorConfig;
use crate::error::CurateError;
use crate::ingest::types::{HypeLabel, RawCandidate};

pub const RAW_CAP: usize = 200;

/// Fill ids, dates and zero scores where absent.
pub fn backfill_raw(items: Vec<RawCandidate>, today: NaiveDate) -> Vec<RawCandidate> {
    items
        .into_iter()
        .map(|mut c| {
            if c.id.as_deref().map_or(true, str::is_empty) {
                c.id = Some(uuid::Uuid::new_v4().to_string());
            }
            c.date.get_or_insert(today);
            c.relevance_score.get_or_insert(0);
            c.hype_score.get_or_insert(0);
            c.hype_label.get_or_insert(HypeLabel::Routine);
            c
        })
        .collect()
}

pub struct SnapshotStore {
    curated_path: PathBuf,
    raw_path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(curated_path: impl Into<PathBuf>, raw_path: impl Into<PathBuf>) -> Self {
        Self {
            curated_path: curated_path.into(),
            raw_path: raw_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(cfg: &CuratorConfig) -> Self {
        Self::new(cfg.curated_path(), cfg.raw_path())
    }

    pub fn curated_path(&self) -> &Path {
        &self.curated_path
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub async fn read_curated(&self) -> Vec<CuratedArticle> {
        read_list(&self.curated_path).await
    }

    pub async fn read_raw(&self) -> Vec<RawCandidate> {
        read_list(&self.raw_path).await
    }

    /// Overwrite the curated snapshot with at most the first 50 items. Returns what was written.
    pub async fn write_curated(
        &self,
        items: &[CuratedArticle],
    ) -> Result<Vec<CuratedArticle>, CurateError> {
        let capped = items[..items.len().min(CURATED_CAP)].to_vec();
        let _guard = self.write_lock.lock().await;
        write_list(&self.curated_path, &capped).await?;
        tracing::info!(
            target: "snapshot",
            count = capped.len(),
            path = %self.curated_path.display(),
            "curated snapshot written"
        );
        Ok(capped)
    }

    /// Backfill, cap at 200 and overwrite the raw snapshot. Returns what was written.
    pub async fn write_raw(
        &self,
        items: Vec<RawCandidate>,
        today: NaiveDate,
    ) -> Result<Vec<RawCandidate>, CurateError> {
        let mut items = items;
        items.truncate(RAW_CAP);
        let filled = backfill_raw(items, today);
        let _guard = self.write_lock.lock().await;
        write_list(&self.raw_path, &filled).await?;
        tracing::debug!(target: "snapshot", count = filled.len(), "raw snapshot written");
        Ok(filled)
    }
}

async fn read_list<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(target: "snapshot", path = %path.display(), error = %e, "unreadable snapshot");
        Vec::new()
    })
}

async fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<(), CurateError> {
    let json = serde_json::to_vec_pretty(items)?;
    let persist = |source| CurateError::Persist {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(persist)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await.map_err(persist)?;
    tokio::fs::rename(&tmp, path).await.map_err(persist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(t: &str) -> CuratedArticle {
        CuratedArticle {
            title: t.into(),
            relevance_score: 7,
            ..Default::default()
        }
    }

    fn store(dir: &Path) -> SnapshotStore {
        SnapshotStore::new(dir.join("news.json"), dir.join("news-raw.json"))
    }

    #[tokio::test]
    async fn curated_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_curated(&[art("a"), art("b"), art("c")]).await.unwrap();
        s.write_curated(&[art("z")]).await.unwrap();
        let back = s.read_curated().await;
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].title, "z");
        assert!(!dir.path().join("news.json.tmp").exists());
    }

    #[tokio::test]
    async fn curated_write_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let many: Vec<_> = (0..70).map(|i| art(&format!("t{i}"))).collect();
        let written = s.write_curated(&many).await.unwrap();
        assert_eq!(written.len(), CURATED_CAP);
        assert_eq!(s.read_curated().await.len(), CURATED_CAP);
    }

    #[tokio::test]
    async fn missing_or_corrupt_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        assert!(s.read_curated().await.is_empty());
        std::fs::write(dir.path().join("news-raw.json"), "{not json").unwrap();
        assert!(s.read_raw().await.is_empty());
    }

    #[tokio::test]
    async fn raw_write_backfills_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let today = NaiveDate::from_ymd_opt(2026, 6, 11).unwrap();
        let pool: Vec<_> = (0..250).map(|i| RawCandidate::titled(format!("r{i}"))).collect();
        let written = s.write_raw(pool, today).await.unwrap();
        assert_eq!(written.len(), RAW_CAP);
        assert_eq!(written[0].title, "r0");
        assert_eq!(written[0].date, Some(today));
        assert_eq!(written[0].relevance_score, Some(0));
        assert_eq!(written[0].hype_label, Some(HypeLabel::Routine));
        assert!(written[0].id.is_some());
        assert_eq!(s.read_raw().await, written);
    }

    #[tokio::test]
    async fn unwritable_target_is_a_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        std::fs::create_dir_all(dir.path().join("news.json")).unwrap();
        let s = store(dir.path());
        let err = s.write_curated(&[art("a")]).await.unwrap_err();
        assert!(matches!(err, CurateError::Persist { .. }));
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        s.write_curated(&[art("old")]).await.unwrap();
        // The temp file path is taken, so the next write fails before the rename.
        std::fs::create_dir_all(dir.path().join("news.json.tmp")).unwrap();
        let err = s.write_curated(&[art("new")]).await.unwrap_err();
        assert!(matches!(err, CurateError::Persist { .. }));
        let titles: Vec<_> = s.read_curated().await.into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["old".to_string()]);
    }
}
