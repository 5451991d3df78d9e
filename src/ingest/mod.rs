// src/ingest/mod.rs
pub mod cache;
pub mod config;
pub mod providers;
pub mod types;

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use strsim::normalized_levenshtein;

use crate::error::SourceError;
use crate::ingest::types::{RawCandidate, SourceAdapter};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curator_candidates_total",
            "Raw candidates collected before deduplication."
        );
        describe_counter!(
            "curator_dedup_dropped_total",
            "Candidates dropped as empty-title or duplicate."
        );
        describe_counter!(
            "curator_source_errors_total",
            "Adapter or feed entry failures absorbed as zero items."
        );
        describe_counter!(
            "curator_shortlist_fallback_total",
            "Runs where stage 1 returned nothing and the first-3 fallback applied."
        );
        describe_counter!(
            "curator_analysis_fallback_total",
            "Stage-2 analyses replaced by the fixed fallback result."
        );
        describe_counter!("curator_curated_total", "Articles persisted to the curated snapshot.");
        describe_counter!("curator_cache_hits_total", "Fresh cache reads served without network.");
        describe_counter!("curator_cache_misses_total", "Missing, stale or corrupt cache reads.");
        describe_histogram!("curator_run_ms", "Wall time of one curation run in milliseconds.");
        describe_gauge!("curator_last_run_ts", "Unix ts when a curation run last completed.");
    });
}

/// Normalize snippet text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }
    out
}

/// Dedup key: lower-cased, trimmed title. Nothing else is folded.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Short, log-safe fingerprint of a title.
pub(crate) fn fingerprint(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Collapse candidates sharing a normalized title; first occurrence wins.
///
/// Empty titles are dropped. With `fuzzy_threshold = Some(t)` a title whose
/// normalized Levenshtein similarity to an already-kept key is `>= t` is dropped
/// too; `None` keeps the exact-match rule.
///
/// Returns (kept, dropped_count).
pub fn dedup_by_title(
    items: Vec<RawCandidate>,
    fuzzy_threshold: Option<f64>,
) -> (Vec<RawCandidate>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept_keys: Vec<String> = Vec::new();
    let mut keep = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for item in items {
        let key = title_key(&item.title);
        if key.is_empty() || seen.contains(&key) {
            dropped += 1;
            continue;
        }
        if let Some(t) = fuzzy_threshold {
            if kept_keys
                .iter()
                .any(|k| normalized_levenshtein(k, &key) >= t)
            {
                dropped += 1;
                continue;
            }
        }
        seen.insert(key.clone());
        kept_keys.push(key);
        keep.push(item);
    }

    (keep, dropped)
}

/// Run every adapter concurrently and concatenate results in adapter order.
///
/// A failing or timed-out adapter contributes zero items.
pub async fn collect_candidates(
    adapters: &[Box<dyn SourceAdapter>],
    per_call_timeout: Duration,
) -> Vec<RawCandidate> {
    ensure_metrics_described();

    let calls = adapters.iter().map(|a| async move {
        let res = match tokio::time::timeout(per_call_timeout, a.fetch()).await {
            Ok(r) => r,
            Err(_) => Err(SourceError::Timeout(per_call_timeout)),
        };
        match res {
            Ok(v) => {
                tracing::info!(target: "ingest", provider = a.name(), count = v.len(), "adapter fetched");
                v
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, provider = a.name(), "adapter error");
                counter!("curator_source_errors_total", "provider" => a.name()).increment(1);
                Vec::new()
            }
        }
    });

    join_all(calls).await.into_iter().flatten().collect()
}
