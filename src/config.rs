// src/config.rs

use std::time::Duration;

use dotenv::dotenv;

const DEFAULT_AI_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_AI_MODEL: &str = "qwen/qwen3-32b";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard limit for fetching a remote track before decode starts.
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Reads `MIXER_FETCH_TIMEOUT_SECS`, keeping the default when it is
    /// missing or unparsable.
    pub fn from_env() -> Self {
        dotenv().ok();
        let mut cfg = Self::default();
        if let Some(secs) = env_parse::<u64>("MIXER_FETCH_TIMEOUT_SECS") {
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        cfg
    }
}

/// Settings for the remote chat-completions endpoint used by the advisor.
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
            // 8-second hard limit
            timeout: Duration::from_secs(8),
        }
    }
}

impl AdvisoryConfig {
    /// Loads `.env` (if present) and reads `MIXER_AI_*`.
    /// `GROQ_API_KEY` is accepted as a fallback for the key.
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();

        let api_key = std::env::var("MIXER_AI_API_KEY")
            .or_else(|_| std::env::var("GROQ_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            api_key,
            base_url: std::env::var("MIXER_AI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("MIXER_AI_MODEL").unwrap_or(defaults.model),
            timeout: env_parse::<u64>("MIXER_AI_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
