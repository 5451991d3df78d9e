// src/analyze/curator.rs
//! Two-stage curation: batch shortlist, then per-item analysis and enrichment.
//!
//! Neither stage can fail the run. Stage 1 degrades to the first three
//! candidates; stage 2 degrades to [`AnalysisResult::fallback`].

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::analyze::ai_adapter::{AnalysisResult, DynClassifier};
use crate::error::AiError;
use crate::ingest::fingerprint;
use crate::ingest::types::{Category, HypeLabel, NormalizedHeadline, RawCandidate, SourceKind};

/// Headlines sent to stage 1.
pub const STAGE_ONE_CAP: usize = 50;
/// Shortlist used when stage 1 yields nothing.
pub const FALLBACK_SHORTLIST: usize = 3;

/// Persisted, externally visible article.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CuratedArticle {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub source_type: SourceKind,
    pub category: Category,
    pub image_url: String,
    #[serde(deserialize_with = "crate::ingest::types::lenient_date::required")]
    pub date: NaiveDate,
    pub url: String,
    pub relevance_score: u8,
    pub hype_score: u8,
    pub hype_label: HypeLabel,
    pub ai_summary: Vec<String>,
    pub deduplication_id: String,
}

/// Curated items are fed back into the next run as raw input.
impl From<CuratedArticle> for RawCandidate {
    fn from(a: CuratedArticle) -> Self {
        RawCandidate {
            id: Some(a.id),
            title: a.title,
            summary: a.summary,
            source: a.source,
            source_type: Some(a.source_type),
            category: Some(a.category),
            date: Some(a.date),
            url: Some(a.url),
            image_url: Some(a.image_url),
            relevance_score: Some(a.relevance_score),
            hype_score: Some(a.hype_score),
            hype_label: Some(a.hype_label),
            ai_summary: a.ai_summary,
            deduplication_id: Some(a.deduplication_id),
        }
    }
}

fn non_empty(s: String, default: &str) -> String {
    if s.trim().is_empty() {
        default.to_string()
    } else {
        s
    }
}

/// Merge a candidate with its analysis. Absent fields get stable defaults; the
/// dedup id is always fresh.
pub fn enrich(c: RawCandidate, analysis: AnalysisResult, today: NaiveDate) -> CuratedArticle {
    CuratedArticle {
        id: c
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        title: non_empty(c.title, "Untitled"),
        summary: non_empty(c.summary, "No summary available."),
        source: non_empty(c.source, "Unknown Source"),
        source_type: c.source_type.unwrap_or_default(),
        category: c.category.unwrap_or_default(),
        image_url: c.image_url.unwrap_or_default(),
        date: c.date.unwrap_or(today),
        url: non_empty(c.url.unwrap_or_default(), "#"),
        relevance_score: analysis.relevance_score,
        hype_score: analysis.hype_score,
        hype_label: analysis.hype_label,
        ai_summary: analysis.summary,
        deduplication_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// Indices to analyze: the classifier's pick, or the first three when it picked none.
pub fn select(picked: Vec<usize>, len: usize) -> Vec<usize> {
    if picked.is_empty() && len > 0 {
        counter!("curator_shortlist_fallback_total").increment(1);
        tracing::info!(target: "curator", len, "empty shortlist, using first candidates");
        return (0..len.min(FALLBACK_SHORTLIST)).collect();
    }
    picked
}

pub struct Curator {
    classifier: DynClassifier,
    call_timeout: Duration,
}

impl Curator {
    pub fn new(classifier: DynClassifier, call_timeout: Duration) -> Self {
        Self {
            classifier,
            call_timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.classifier.provider_name()
    }

    /// Stage 1 over the first 50 candidates. Never fails; errors yield `[]`.
    pub async fn stage_one(&self, queue: &[RawCandidate]) -> Vec<usize> {
        let capped = &queue[..queue.len().min(STAGE_ONE_CAP)];
        if capped.is_empty() {
            return Vec::new();
        }
        let headlines = NormalizedHeadline::project(capped);
        let call = self.classifier.shortlist(&headlines);
        let res = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(r) => r,
            Err(_) => Err(AiError::Timeout(self.call_timeout)),
        };
        match res {
            Ok(mut idx) => {
                // A classifier may not address past the capped slice, nor twice.
                let mut seen = std::collections::HashSet::new();
                idx.retain(|&i| i < capped.len() && seen.insert(i));
                idx.truncate(crate::analyze::ai_adapter::MAX_SHORTLIST);
                tracing::info!(target: "curator", picked = idx.len(), of = capped.len(), "shortlist ready");
                idx
            }
            Err(e) => {
                tracing::warn!(target: "curator", error = %e, "shortlist failed");
                Vec::new()
            }
        }
    }

    /// Stage 2 for each shortlisted index, concurrently. Output order follows `shortlist`;
    /// indices outside `queue` are skipped.
    pub async fn stage_two(
        &self,
        queue: &[RawCandidate],
        shortlist: &[usize],
    ) -> Vec<(usize, AnalysisResult)> {
        let picked = shortlist.iter().filter_map(|&i| queue.get(i).map(|c| (i, c)));
        let calls = picked.map(|(i, c)| {
            async move {
                let call = self.classifier.analyze(&c.title, &c.summary, &c.source);
                let res = match tokio::time::timeout(self.call_timeout, call).await {
                    Ok(r) => r,
                    Err(_) => Err(AiError::Timeout(self.call_timeout)),
                };
                let analysis = res.unwrap_or_else(|e| {
                    counter!("curator_analysis_fallback_total").increment(1);
                    tracing::warn!(
                        target: "curator",
                        item = %fingerprint(&c.title),
                        error = %e,
                        "analysis failed, using fallback"
                    );
                    AnalysisResult::fallback(e.class())
                });
                (i, analysis)
            }
        });
        join_all(calls).await
    }

    /// Both stages plus enrichment. The result is unranked.
    pub async fn curate(&self, queue: &[RawCandidate]) -> Vec<CuratedArticle> {
        let picked = self.stage_one(queue).await;
        let shortlist = select(picked, queue.len().min(STAGE_ONE_CAP));
        let analyses = self.stage_two(queue, &shortlist).await;
        let today = Utc::now().date_naive();

        analyses
            .into_iter()
            .filter_map(|(i, a)| queue.get(i).map(|c| enrich(c.clone(), a, today)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ai_adapter::{Classifier, DisabledClassifier};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Slow;

    #[async_trait]
    impl Classifier for Slow {
        async fn shortlist(&self, _: &[NormalizedHeadline]) -> Result<Vec<usize>, AiError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![1])
        }
        async fn analyze(&self, _: &str, _: &str, _: &str) -> Result<AnalysisResult, AiError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(AiError::Disabled)
        }
        fn provider_name(&self) -> &'static str {
            "slow"
        }
    }

    #[test]
    fn enrich_fills_defaults_and_fresh_dedup_id() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 11).unwrap();
        let a = AnalysisResult::fallback(crate::error::FailureClass::Generic);
        let out = enrich(RawCandidate::default(), a.clone(), today);
        assert_eq!(out.title, "Untitled");
        assert_eq!(out.summary, "No summary available.");
        assert_eq!(out.source, "Unknown Source");
        assert_eq!(out.url, "#");
        assert_eq!(out.image_url, "");
        assert_eq!(out.date, today);
        assert_eq!(out.category, Category::General);
        assert_eq!(out.source_type, SourceKind::Syndicated);
        assert!(!out.id.is_empty());
        assert_ne!(out.id, out.deduplication_id);

        let seeded = RawCandidate {
            id: Some("keep-me".into()),
            deduplication_id: Some("old".into()),
            ..RawCandidate::titled("T")
        };
        let out = enrich(seeded, a, today);
        assert_eq!(out.id, "keep-me");
        assert_ne!(out.deduplication_id, "old");
    }

    #[test]
    fn select_falls_back_to_first_three() {
        assert_eq!(select(vec![], 10), vec![0, 1, 2]);
        assert_eq!(select(vec![], 2), vec![0, 1]);
        assert!(select(vec![], 0).is_empty());
        assert_eq!(select(vec![4], 10), vec![4]);
    }

    #[tokio::test]
    async fn timeouts_take_the_failure_path() {
        let curator = Curator::new(Arc::new(Slow), Duration::from_millis(20));
        let queue: Vec<_> = (0..4).map(|i| RawCandidate::titled(format!("t{i}"))).collect();
        assert!(curator.stage_one(&queue).await.is_empty());
        let out = curator.curate(&queue).await;
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|a| a.relevance_score == 5 && a.hype_score == 3));
    }

    #[test]
    fn curated_date_accepts_full_timestamp() {
        let list: Vec<CuratedArticle> = serde_json::from_str(
            r#"[{"title":"a","date":"2026-06-01T10:00:00Z"},{"title":"b","date":"2026-06-03"}]"#,
        )
        .unwrap();
        assert_eq!(list[0].date, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(list[1].date, NaiveDate::from_ymd_opt(2026, 6, 3).unwrap());
    }

    #[tokio::test]
    async fn out_of_range_shortlist_entries_are_skipped() {
        let curator = Curator::new(Arc::new(DisabledClassifier), Duration::from_secs(1));
        let queue = vec![RawCandidate::titled("only")];
        let out = curator.stage_two(&queue, &[7, 0, 1]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 0);
        assert!(curator.stage_two(&[], &[0, 1, 2]).await.is_empty());
    }

    #[tokio::test]
    async fn empty_queue_yields_nothing() {
        let curator = Curator::new(Arc::new(DisabledClassifier), Duration::from_secs(1));
        assert!(curator.curate(&[]).await.is_empty());
    }
}
