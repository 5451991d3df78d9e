//! AI adapter: the narrow classifier capability used by the curator, plus the
//! Gemini provider behind it.
//!
//! Two layers, as with any remote model here:
//! - [`Provider`] does one raw text-in/text-out call.
//! - [`Classifier`] owns the prompts and turns replies into typed values.
//!
//! The curator only ever sees `Arc<dyn Classifier>`, so tests swap in a fake.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ai::AiConfig;
use crate::error::{AiError, FailureClass};
use crate::ingest::types::{HypeLabel, NormalizedHeadline};

/// Most indices stage 1 may return.
pub const MAX_SHORTLIST: usize = 6;
/// Snippet length sent to stage 2.
pub const SNIPPET_CHARS: usize = 500;

const SUMMARY_BULLETS: usize = 3;
const PADDING_BULLET: &str = "No further details.";

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Structured stage-2 verdict for one article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub relevance_score: u8,
    pub hype_score: u8,
    pub hype_label: HypeLabel,
    pub summary: Vec<String>,
}

impl AnalysisResult {
    /// Fixed result used whenever analysis fails. The first bullet names the failure class.
    pub fn fallback(class: FailureClass) -> Self {
        let reason = match class {
            FailureClass::RateLimited => "API Rate Limit Exceeded.",
            FailureClass::NotFound => "Model Not Found/Access Denied.",
            FailureClass::Generic => "Analysis failed.",
        };
        Self {
            relevance_score: 5,
            hype_score: 3,
            hype_label: HypeLabel::Routine,
            summary: vec![
                reason.to_string(),
                "Using fallback data.".to_string(),
                "Check API Quota.".to_string(),
            ],
        }
    }
}

/// Capability the curator depends on.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Stage 1: pick the most relevant headlines, returning indices into `headlines`.
    async fn shortlist(&self, headlines: &[NormalizedHeadline]) -> Result<Vec<usize>, AiError>;
    /// Stage 2: score and summarize one article.
    async fn analyze(
        &self,
        title: &str,
        snippet: &str,
        source: &str,
    ) -> Result<AnalysisResult, AiError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn Classifier>;

/// Factory: a disabled classifier unless the config is enabled and carries a key.
pub fn build_classifier(config: &AiConfig) -> DynClassifier {
    if !config.enabled || config.api_key.trim().is_empty() {
        tracing::info!(target: "curator", "AI disabled; every call takes the fallback path");
        return Arc::new(DisabledClassifier);
    }
    match config.provider.as_str() {
        "gemini" => {
            let provider = GeminiProvider::new(
                &config.base_url,
                &config.api_key,
                &config.model,
                Duration::from_secs(config.timeout_secs),
            );
            Arc::new(PromptClassifier::new(provider))
        }
        _ => Arc::new(DisabledClassifier),
    }
}

// ------------------------------------------------------------
// Provider abstraction + Gemini
// ------------------------------------------------------------

/// Low-level provider: one prompt in, raw model text out.
pub trait Provider: Send + Sync + 'static {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// Google Generative Language API (`models/{model}:generateContent`).
pub struct GeminiProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-curator/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        Self {
            http,
            endpoint,
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenRequest<'a> {
    contents: Vec<GenContent<'a>>,
}
#[derive(Serialize)]
struct GenContent<'a> {
    parts: Vec<GenPart<'a>>,
}
#[derive(Serialize)]
struct GenPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenResponse {
    #[serde(default)]
    candidates: Vec<GenCandidate>,
}
#[derive(Deserialize)]
struct GenCandidate {
    content: Option<GenReply>,
}
#[derive(Deserialize)]
struct GenReply {
    #[serde(default)]
    parts: Vec<GenReplyPart>,
}
#[derive(Deserialize)]
struct GenReplyPart {
    text: Option<String>,
}

/// Text of the first candidate's first part.
pub fn extract_text(body: &str) -> Result<String, AiError> {
    let resp: GenResponse =
        serde_json::from_str(body).map_err(|e| AiError::Malformed(e.to_string()))?;
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AiError::Malformed("no candidate text".to_string()))
}

impl Provider for GeminiProvider {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>> {
        Box::pin(async move {
            let req = GenRequest {
                contents: vec![GenContent {
                    parts: vec![GenPart { text: prompt }],
                }],
            };
            let resp = self
                .http
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&req)
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(AiError::from_status(status.as_u16()));
            }
            let body = resp.text().await?;
            extract_text(&body)
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Classifiers
// ------------------------------------------------------------

/// Always fails with [`AiError::Disabled`]; used when no credential is configured.
pub struct DisabledClassifier;

#[async_trait]
impl Classifier for DisabledClassifier {
    async fn shortlist(&self, _headlines: &[NormalizedHeadline]) -> Result<Vec<usize>, AiError> {
        Err(AiError::Disabled)
    }
    async fn analyze(&self, _: &str, _: &str, _: &str) -> Result<AnalysisResult, AiError> {
        Err(AiError::Disabled)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Prompt-driven classifier over any [`Provider`].
pub struct PromptClassifier<P: Provider> {
    inner: P,
}

impl<P: Provider> PromptClassifier<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: Provider> Classifier for PromptClassifier<P> {
    async fn shortlist(&self, headlines: &[NormalizedHeadline]) -> Result<Vec<usize>, AiError> {
        if headlines.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = build_shortlist_prompt(headlines);
        let text = self.inner.generate(&prompt).await?;
        parse_indices(&text, headlines.len())
    }

    async fn analyze(
        &self,
        title: &str,
        snippet: &str,
        source: &str,
    ) -> Result<AnalysisResult, AiError> {
        let prompt = build_analysis_prompt(title, snippet, source);
        let text = self.inner.generate(&prompt).await?;
        parse_analysis(&text)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// Prompts
// ------------------------------------------------------------

pub fn build_shortlist_prompt(headlines: &[NormalizedHeadline]) -> String {
    let list = headlines
        .iter()
        .map(|h| format!("{}. [{}] {}", h.index, h.source, h.title))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a strict news editor for the Men's FIFA World Cup 2026.\n\
         Select the headlines that are about the tournament itself: qualifiers, host cities, \
         FIFA decisions and key national-team players all count.\n\
         Ignore general club football (EPL, La Liga and similar) unless it is a massive global story. \
         Ignore women's club football unless it is World Cup related.\n\
         Only select items whose inferred relevance is above 7 out of 10. Select at most {MAX_SHORTLIST}.\n\n\
         Headlines:\n{list}\n\n\
         Output ONLY a JSON array of the selected indices, for example [0, 4, 7]."
    )
}

pub fn build_analysis_prompt(title: &str, snippet: &str, source: &str) -> String {
    let snippet: String = snippet.chars().take(SNIPPET_CHARS).collect();
    format!(
        "Analyze this news item for Men's FIFA World Cup 2026 coverage.\n\
         Title: {title}\n\
         Snippet: {snippet}\n\
         Source: {source}\n\n\
         Tasks:\n\
         1. relevanceScore: integer 0-10, how closely it concerns the tournament.\n\
         2. Judge sentiment polarity, intensity and subjectivity.\n\
         3. hypeScore: integer 1-10 from intensity and relevance. Boost viral topics \
         (e.g. Messi, Schedule Reveal).\n\
         4. hypeLabel: one of Viral, Breaking, Hot, Routine.\n\
         5. summary: exactly 3 short bullet strings.\n\n\
         Output ONLY JSON: {{\"relevanceScore\": n, \"hypeScore\": n, \"hypeLabel\": \"...\", \"summary\": [\"...\", \"...\", \"...\"]}}"
    )
}

// ------------------------------------------------------------
// Response parsing
// ------------------------------------------------------------

/// Remove Markdown code fences (```json ... ```) around a model reply.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse `text` as JSON, else retry on the span between the first `open` and last `close`.
fn parse_json_span(text: &str, open: char, close: char) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Stage-1 reply → at most 6 distinct indices, each `< len`.
pub fn parse_indices(text: &str, len: usize) -> Result<Vec<usize>, AiError> {
    let cleaned = strip_code_fences(text);
    let value = parse_json_span(&cleaned, '[', ']')
        .ok_or_else(|| AiError::Malformed("shortlist is not JSON".to_string()))?;
    let arr = value
        .as_array()
        .ok_or_else(|| AiError::Malformed("shortlist is not an array".to_string()))?;

    let mut seen = HashSet::new();
    Ok(arr
        .iter()
        .filter_map(|v| v.as_u64())
        .filter_map(|i| usize::try_from(i).ok())
        .filter(|&i| i < len && seen.insert(i))
        .take(MAX_SHORTLIST)
        .collect())
}

fn score(v: &Value, key: &str) -> Option<u8> {
    let raw = v.get(key)?;
    let n = raw
        .as_f64()
        .or_else(|| raw.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;
    Some(n.round().clamp(0.0, 10.0) as u8)
}

fn label(v: &Value) -> HypeLabel {
    match v
        .get("hypeLabel")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("viral") => HypeLabel::Viral,
        Some("breaking") => HypeLabel::Breaking,
        Some("hot") => HypeLabel::Hot,
        _ => HypeLabel::Routine,
    }
}

fn bullets(v: &Value) -> Vec<String> {
    let mut out: Vec<String> = match v.get("summary") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };
    out.truncate(SUMMARY_BULLETS);
    while out.len() < SUMMARY_BULLETS {
        out.push(PADDING_BULLET.to_string());
    }
    out
}

/// Stage-2 reply → [`AnalysisResult`]. Both scores must be present; everything else is lenient.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AiError> {
    let cleaned = strip_code_fences(text);
    let value = parse_json_span(&cleaned, '{', '}')
        .filter(Value::is_object)
        .ok_or_else(|| AiError::Malformed("analysis is not a JSON object".to_string()))?;

    let relevance_score = score(&value, "relevanceScore")
        .ok_or_else(|| AiError::Malformed("missing relevanceScore".to_string()))?;
    let hype_score = score(&value, "hypeScore")
        .ok_or_else(|| AiError::Malformed("missing hypeScore".to_string()))?;

    Ok(AnalysisResult {
        relevance_score,
        hype_score,
        hype_label: label(&value),
        summary: bullets(&value),
    })
}
