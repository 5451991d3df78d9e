// src/config/mod.rs
pub mod ai;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ingest::providers::newsapi::DEFAULT_BASE_URL;

const ENV_DATA_DIR: &str = "CURATOR_DATA_DIR";
pub const DEFAULT_CONFIG_PATH: &str = "config/curator.toml";

/// Paths, caps and timeouts of the pipeline. Every field has a default.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CuratorConfig {
    pub data_dir: PathBuf,
    pub curated_file: String,
    pub raw_file: String,
    /// Relative to `data_dir`.
    pub cache_file: String,
    pub cache_ttl_secs: u64,
    pub synthetic_count: usize,
    /// Per external call (feed, news API query, AI request).
    pub call_timeout_secs: u64,
    /// `Some(t)` also drops titles with normalized Levenshtein similarity >= t.
    pub fuzzy_dedup_threshold: Option<f64>,
    pub newsapi_base_url: String,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            curated_file: "news.json".to_string(),
            raw_file: "news-raw.json".to_string(),
            cache_file: "cache/news-api.json".to_string(),
            cache_ttl_secs: 3600,
            synthetic_count: 4,
            call_timeout_secs: 15,
            fuzzy_dedup_threshold: None,
            newsapi_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl CuratorConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading curator config from {}", path.display()))?;
        let mut cfg: CuratorConfig =
            toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// `config/curator.toml` if present, else defaults; then `$CURATOR_DATA_DIR`.
    pub fn load_default() -> Result<Self> {
        let p = Path::new(DEFAULT_CONFIG_PATH);
        let mut cfg = if p.exists() {
            Self::load_from(p)?
        } else {
            Self::default()
        };
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                cfg.data_dir = PathBuf::from(dir);
            }
        }
        Ok(cfg)
    }

    fn sanitize(&mut self) {
        if self.call_timeout_secs == 0 {
            self.call_timeout_secs = 15;
        }
        if let Some(t) = self.fuzzy_dedup_threshold {
            if !(0.0..=1.0).contains(&t) {
                tracing::warn!(threshold = t, "fuzzy_dedup_threshold out of range, ignored");
                self.fuzzy_dedup_threshold = None;
            }
        }
    }

    pub fn curated_path(&self) -> PathBuf {
        self.data_dir.join(&self.curated_file)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join(&self.raw_file)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache_file)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
