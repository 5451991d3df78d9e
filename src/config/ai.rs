// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const ENV_GEMINI_KEY: &str = "GEMINI_API_KEY";
pub const DEFAULT_CONFIG_PATH: &str = "config/ai.json";

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "gemini" (case-insensitive); anything else disables the classifier
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Upper bound for one classifier call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;
        cfg.resolve()?;
        Ok(cfg)
    }

    /// Config with the AI switched on from the environment alone.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = AiConfig {
            enabled: true,
            ..Default::default()
        };
        cfg.resolve()?;
        Ok(cfg)
    }

    /// Never fails: a missing file, bad JSON or missing key yields a disabled config.
    ///
    /// Without a file, the AI is enabled whenever `GEMINI_API_KEY` is present.
    pub fn load_or_disabled<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = if path.exists() {
            Self::load_from_file(path)
        } else {
            Self::from_env()
        };
        match loaded {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(target: "curator", error = %e, "AI classifier disabled");
                AiConfig::default()
            }
        }
    }

    fn resolve(&mut self) -> anyhow::Result<()> {
        self.provider = self.provider.to_lowercase();
        if self.provider != "gemini" {
            anyhow::bail!("Unsupported provider in config: {}", self.provider);
        }
        if self.enabled && self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_GEMINI_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("Missing {ENV_GEMINI_KEY} env var"))?;
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        Ok(())
    }
}
