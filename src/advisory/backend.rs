// src/advisory/backend.rs

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::config::AdvisoryConfig;

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("no API key configured")]
    MissingKey,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("empty reply")]
    Empty,
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// One prompt sent to the completion service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Ask the service for a JSON object reply.
    pub json: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn json(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), json: true, temperature: 0.2, max_tokens: 400 }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), json: false, temperature: 0.8, max_tokens: 120 }
    }
}

/// Anything that turns a prompt into raw reply text.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, request: CompletionRequest) -> impl Future<Output = Result<String, AdvisoryError>> + Send;
}

const SYSTEM_PROMPT: &str = "You are Mixora AI, a professional DJ mentor. \
    When asked for JSON, reply with one raw JSON object and nothing else.";

// --- OPENAI-COMPATIBLE WIRE TYPES ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client (Groq by default).
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    config: AdvisoryConfig,
}

impl HttpCompletionBackend {
    pub fn new(config: AdvisoryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("HTTP client setup failed ({e}), using defaults");
                reqwest::Client::new()
            });
        Self { client, config }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    fn payload(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });
        if request.json {
            payload["response_format"] = serde_json::json!({ "type": "json_object" });
        }
        payload
    }
}

impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AdvisoryError> {
        let api_key = self.config.api_key.as_deref().ok_or(AdvisoryError::MissingKey)?;

        let res = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&self.payload(&request))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdvisoryError::Status { status: status.as_u16(), body });
        }

        let chat: ChatResponse = res
            .json()
            .await
            .map_err(|e| AdvisoryError::Malformed(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AdvisoryError::Empty)
    }
}
