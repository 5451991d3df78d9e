// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::{Category, SourceKind};

const ENV_PATH: &str = "CURATOR_FEEDS_PATH";

/// Shape of a registry entry's feed: regular newsroom or discussion forum.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    News,
    Forum,
}

/// One syndication endpoint polled by the syndication adapter.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub source_kind: SourceKind,
    #[serde(default)]
    pub kind: FeedKind,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, source_kind: SourceKind, kind: FeedKind) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            source_kind,
            kind,
        }
    }

    pub fn category(&self) -> Category {
        match self.kind {
            FeedKind::Forum => Category::Social,
            FeedKind::News => Category::General,
        }
    }
}

/// Built-in registry used when no feeds file is configured.
pub fn default_registry() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "BBC Sport",
            "http://feeds.bbci.co.uk/sport/football/rss.xml",
            SourceKind::Official,
            FeedKind::News,
        ),
        FeedSource::new(
            "Sky Sports",
            "https://www.skysports.com/rss/12040",
            SourceKind::Official,
            FeedKind::News,
        ),
        FeedSource::new(
            "ESPN",
            "https://www.espn.com/espn/rss/soccer/news",
            SourceKind::Official,
            FeedKind::News,
        ),
        FeedSource::new(
            "r/worldcup",
            "https://www.reddit.com/r/worldcup.rss",
            SourceKind::Syndicated,
            FeedKind::Forum,
        ),
        FeedSource::new(
            "r/soccer",
            "https://www.reddit.com/r/soccer.rss",
            SourceKind::Syndicated,
            FeedKind::Forum,
        ),
    ]
}

/// Load the registry from an explicit path. Supports TOML or JSON formats.
pub fn load_registry_from(path: &Path) -> Result<Vec<FeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed registry from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_registry(&content, ext.as_str())
}

/// Load the registry using env var + fallbacks:
/// 1) $CURATOR_FEEDS_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in default registry
pub fn load_registry_default() -> Result<Vec<FeedSource>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_registry_from(&pb);
        } else {
            return Err(anyhow!("CURATOR_FEEDS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_registry_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_registry_from(&json_p);
    }
    Ok(default_registry())
}

fn parse_registry(s: &str, hint_ext: &str) -> Result<Vec<FeedSource>> {
    let try_toml = hint_ext == "toml" || s.contains("[[feeds]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed registry format"))
}

fn parse_toml(s: &str) -> Result<Vec<FeedSource>> {
    #[derive(Deserialize)]
    struct TomlRegistry {
        feeds: Vec<FeedSource>,
    }
    let v: TomlRegistry = toml::from_str(s)?;
    Ok(clean_list(v.feeds))
}

fn parse_json(s: &str) -> Result<Vec<FeedSource>> {
    let v: Vec<FeedSource> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim names/urls, drop blank entries and repeated urls (first wins).
fn clean_list(items: Vec<FeedSource>) -> Vec<FeedSource> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter_map(|mut f| {
            f.name = f.name.trim().to_string();
            f.url = f.url.trim().to_string();
            if f.name.is_empty() || f.url.is_empty() || !seen.insert(f.url.clone()) {
                return None;
            }
            Some(f)
        })
        .collect()
}
