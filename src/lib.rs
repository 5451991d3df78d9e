//! World Cup 2026 news curation pipeline.
//!
//! Adapters pull candidates from syndicated feeds, NewsAPI and a synthetic social
//! feed; the pool is deduplicated, shortlisted and analyzed by an AI classifier,
//! ranked by hype and persisted as bounded snapshots.

pub mod analyze;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod snapshot;

pub use crate::analyze::{AnalysisResult, Classifier, CuratedArticle};
pub use crate::engine::{CurationEngine, CurationRun};
pub use crate::error::{AiError, CurateError, FailureClass, SourceError};
pub use crate::ingest::types::{RawCandidate, SourceAdapter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise info for the pipeline targets and warn elsewhere.
/// `CURATOR_LOG_JSON=1` switches to JSON lines. A second call is a no-op.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("news_curator=info,ingest=info,curator=info,snapshot=info,warn")
    });
    let json = std::env::var("CURATOR_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
