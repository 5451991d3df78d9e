//! # Curation Engine
//! Orchestrates one run: adapters → dedup → two-stage curator → ranker →
//! snapshots. Also serves the read side of the last persisted snapshots.
//!
//! Pool order is fixed: manual seeds, adapter outputs in registration order,
//! then the previous curated snapshot. Dedup keeps the first occurrence, so
//! this order decides which copy of a story survives.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::analyze::ai_adapter::{build_classifier, DynClassifier};
use crate::analyze::curator::{CuratedArticle, Curator};
use crate::analyze::rank::rank;
use crate::config::ai::AiConfig;
use crate::config::CuratorConfig;
use crate::error::CurateError;
use crate::ingest::cache::CacheStore;
use crate::ingest::config::load_registry_default;
use crate::ingest::providers::newsapi::NewsApiAdapter;
use crate::ingest::providers::synthetic::SyntheticAdapter;
use crate::ingest::providers::syndication::SyndicationAdapter;
use crate::ingest::types::{RawCandidate, SourceAdapter};
use crate::ingest::{collect_candidates, dedup_by_title, ensure_metrics_described};
use crate::snapshot::SnapshotStore;

/// Result of one run, as persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CurationRun {
    pub curated: Vec<CuratedArticle>,
    pub raw: Vec<RawCandidate>,
}

pub struct CurationEngine {
    adapters: Vec<Box<dyn SourceAdapter>>,
    curator: Curator,
    store: SnapshotStore,
    adapter_timeout: Duration,
    fuzzy_threshold: Option<f64>,
    run_lock: Mutex<()>,
}

impl CurationEngine {
    pub fn new(
        adapters: Vec<Box<dyn SourceAdapter>>,
        classifier: DynClassifier,
        store: SnapshotStore,
        call_timeout: Duration,
    ) -> Self {
        ensure_metrics_described();
        Self {
            adapters,
            curator: Curator::new(classifier, call_timeout),
            store,
            // Adapters fan out internally with per-call timeouts of their own.
            adapter_timeout: call_timeout * 2,
            fuzzy_threshold: None,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_fuzzy_dedup(mut self, threshold: Option<f64>) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Production wiring: syndication registry, NewsAPI (key from env), synthetic feed.
    pub fn from_config(cfg: &CuratorConfig, ai: &AiConfig) -> anyhow::Result<Self> {
        let registry = load_registry_default()?;
        let timeout = cfg.call_timeout();
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(SyndicationAdapter::new(registry, timeout)),
            Box::new(NewsApiAdapter::new(
                cfg.newsapi_base_url.clone(),
                NewsApiAdapter::api_key_from_env(),
                CacheStore::new(cfg.cache_path()),
                cfg.cache_ttl(),
                timeout,
            )),
            Box::new(SyntheticAdapter::new(cfg.synthetic_count)),
        ];
        let classifier: DynClassifier = build_classifier(ai);
        Ok(Self::new(adapters, classifier, SnapshotStore::from_config(cfg), timeout)
            .with_fuzzy_dedup(cfg.fuzzy_dedup_threshold))
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Trigger a run. Only a persistence failure is an error.
    pub async fn run_curation(
        &self,
        manual: Vec<RawCandidate>,
    ) -> Result<CurationRun, CurateError> {
        let _running = self.run_lock.lock().await;
        let started = Instant::now();
        let manual_count = manual.len();

        let fetched = collect_candidates(&self.adapters, self.adapter_timeout).await;
        let previous = self.store.read_curated().await;
        let previous_count = previous.len();

        let mut pool = manual;
        pool.extend(fetched);
        pool.extend(previous.into_iter().map(RawCandidate::from));
        counter!("curator_candidates_total").increment(pool.len() as u64);

        let (queue, dropped) = dedup_by_title(pool.clone(), self.fuzzy_threshold);
        counter!("curator_dedup_dropped_total").increment(dropped as u64);
        tracing::info!(
            target: "curator",
            manual = manual_count,
            previous = previous_count,
            pool = pool.len(),
            queue = queue.len(),
            dropped,
            provider = self.curator.provider_name(),
            "curation run started"
        );

        let enriched = self.curator.curate(&queue).await;
        let ranked = rank(enriched);

        let curated = self.store.write_curated(&ranked).await?;
        let raw = self.store.write_raw(pool, Utc::now().date_naive()).await?;

        counter!("curator_curated_total").increment(curated.len() as u64);
        histogram!("curator_run_ms").record(started.elapsed().as_millis() as f64);
        gauge!("curator_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "curator",
            curated = curated.len(),
            raw = raw.len(),
            ms = started.elapsed().as_millis() as u64,
            "curation run finished"
        );

        Ok(CurationRun { curated, raw })
    }

    pub async fn get_curated(&self) -> Vec<CuratedArticle> {
        self.store.read_curated().await
    }

    pub async fn get_raw(&self) -> Vec<RawCandidate> {
        self.store.read_raw().await
    }
}

pub type SharedEngine = Arc<CurationEngine>;
