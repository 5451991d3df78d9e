// src/ingest/providers/newsapi.rs
//! Commercial news API adapter (NewsAPI v2), wrapped by the TTL cache.
//!
//! Two small queries run per refresh: a relevance-sorted search over the last
//! 48 hours and a sports headline query. Results are merged by URL with the
//! headlines first. The credential comes only from configuration.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::SourceError;
use crate::ingest::cache::{CacheEntry, CacheStore};
use crate::ingest::providers::STOCK_IMAGE_URL;
use crate::ingest::types::{Category, RawCandidate, SourceAdapter, SourceKind};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
pub const ENV_API_KEY: &str = "NEWSAPI_KEY";

const SEARCH_QUERY: &str = r#"("World Cup" OR "WC2026") AND ("FIFA" OR "qualifier" OR "qualifying" OR "USA" OR "Mexico" OR "Canada")"#;
const SEARCH_PAGE_SIZE: &str = "30";
const HEADLINES_PAGE_SIZE: &str = "10";
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    #[serde(default)]
    source: Option<ApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

fn published_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn map_article(a: ApiArticle) -> Option<RawCandidate> {
    let title = a.title.filter(|t| !t.trim().is_empty() && t != REMOVED_MARKER)?;
    let summary = a
        .description
        .filter(|d| !d.is_empty())
        .or_else(|| a.content.map(|c| c.chars().take(150).collect()))
        .unwrap_or_default();
    let source = a
        .source
        .and_then(|s| s.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "NewsAPI".to_string());

    Some(RawCandidate {
        title,
        summary,
        source,
        source_type: Some(SourceKind::Official),
        category: Some(Category::General),
        date: published_date(a.published_at.as_deref()),
        url: a.url,
        image_url: Some(
            a.url_to_image
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| STOCK_IMAGE_URL.to_string()),
        ),
        ..Default::default()
    })
}

/// Map a raw API payload, dropping removed or untitled items.
pub fn map_response(body: &str) -> Result<Vec<RawCandidate>, SourceError> {
    let resp: ApiResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;
    Ok(resp.articles.into_iter().filter_map(map_article).collect())
}

/// Concatenate headline results then search results, keeping the first item per URL.
pub fn merge_by_url(headlines: Vec<RawCandidate>, search: Vec<RawCandidate>) -> Vec<RawCandidate> {
    let mut seen = HashSet::new();
    headlines
        .into_iter()
        .chain(search)
        .filter(|c| match c.url.as_deref() {
            Some(u) if !u.is_empty() => seen.insert(u.to_string()),
            _ => false,
        })
        .collect()
}

pub struct NewsApiAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: CacheStore,
    ttl: Duration,
}

impl NewsApiAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        cache: CacheStore,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("news-curator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            cache,
            ttl,
        }
    }

    /// Key from `$NEWSAPI_KEY`; `None` when unset.
    pub fn api_key_from_env() -> Option<String> {
        std::env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty())
    }

    /// Cache-aware fetch evaluated at `now`.
    pub async fn fetch_at(&self, now: DateTime<Utc>) -> Result<Vec<RawCandidate>, SourceError> {
        let now_ms = now.timestamp_millis();
        if let Some(cached) = self.cache.load_fresh::<RawCandidate>(now_ms, self.ttl).await {
            return Ok(cached);
        }

        let key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredential(ENV_API_KEY))?;

        let from = (now - chrono::Duration::days(2)).format("%Y-%m-%d").to_string();
        let search_params = [
            ("q", SEARCH_QUERY),
            ("language", "en"),
            ("sortBy", "relevancy"),
            ("from", from.as_str()),
            ("pageSize", SEARCH_PAGE_SIZE),
        ];
        let headline_params = [
            ("category", "sports"),
            ("country", "us"),
            ("q", "World Cup"),
            ("pageSize", HEADLINES_PAGE_SIZE),
        ];

        let (search, headlines) = tokio::join!(
            self.query("everything", &search_params, key),
            self.query("top-headlines", &headline_params, key),
        );
        let search = search.unwrap_or_else(|e| {
            tracing::warn!(target: "ingest", error = %e, endpoint = "everything", "newsapi query failed");
            Vec::new()
        });
        let headlines = headlines.unwrap_or_else(|e| {
            tracing::warn!(target: "ingest", error = %e, endpoint = "top-headlines", "newsapi query failed");
            Vec::new()
        });

        let articles = merge_by_url(headlines, search);
        tracing::info!(target: "ingest", count = articles.len(), "newsapi unique items fetched");

        if !articles.is_empty() {
            let entry = CacheEntry {
                timestamp: now_ms,
                articles: articles.clone(),
            };
            if let Err(e) = self.cache.store(&entry).await {
                tracing::warn!(target: "ingest", error = %e, "failed to write newsapi cache");
            }
        }

        Ok(articles)
    }

    async fn query(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        key: &str,
    ) -> Result<Vec<RawCandidate>, SourceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .header("X-Api-Key", key)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        map_response(&body)
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    async fn fetch(&self) -> Result<Vec<RawCandidate>, SourceError> {
        self.fetch_at(Utc::now()).await
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
