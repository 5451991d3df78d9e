//! News Curator Service: binary entrypoint.
//! Boots the Axum HTTP server over the curation engine and the Prometheus route.

use std::sync::Arc;

use anyhow::Context;
use news_curator::config::ai::{AiConfig, DEFAULT_CONFIG_PATH as AI_CONFIG_PATH};
use news_curator::config::CuratorConfig;
use news_curator::engine::CurationEngine;
use news_curator::metrics::Metrics;
use news_curator::{api, init_tracing};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = CuratorConfig::load_default().context("loading curator config")?;
    let ai = AiConfig::load_or_disabled(AI_CONFIG_PATH);

    // Recorder first, so metric descriptions reach it.
    let metrics = Metrics::init(cfg.cache_ttl_secs)?;

    let engine = CurationEngine::from_config(&cfg, &ai).context("building curation engine")?;
    tracing::info!(
        data_dir = %cfg.data_dir.display(),
        ai_enabled = ai.enabled,
        "news curator starting"
    );

    let router = api::create_router(Arc::new(engine)).merge(metrics.router());

    Ok(router.into())
}
