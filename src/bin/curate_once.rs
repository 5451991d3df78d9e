//! One-shot curation run from the command line.
//!
//! Usage: `curate_once [seeds.json]`, where the optional file holds a JSON array
//! of partial candidates used as manual seeds.

use anyhow::Context;
use news_curator::config::ai::{AiConfig, DEFAULT_CONFIG_PATH as AI_CONFIG_PATH};
use news_curator::config::CuratorConfig;
use news_curator::{init_tracing, CurationEngine, RawCandidate};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let seeds: Vec<RawCandidate> = match std::env::args().nth(1) {
        Some(path) => {
            let s = std::fs::read_to_string(&path)
                .with_context(|| format!("reading seeds from {path}"))?;
            serde_json::from_str(&s).with_context(|| format!("parsing seeds in {path}"))?
        }
        None => Vec::new(),
    };

    let cfg = CuratorConfig::load_default()?;
    let ai = AiConfig::load_or_disabled(AI_CONFIG_PATH);
    let engine = CurationEngine::from_config(&cfg, &ai)?;

    let run = engine.run_curation(seeds).await?;
    for a in &run.curated {
        println!(
            "{:>2} hype / {:>2} rel  [{:?}] {} ({})",
            a.hype_score, a.relevance_score, a.hype_label, a.title, a.source
        );
    }
    println!(
        "curated {} of {} raw -> {}",
        run.curated.len(),
        run.raw.len(),
        engine.store().curated_path().display()
    );
    Ok(())
}
