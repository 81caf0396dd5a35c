// src/loader.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decoder::{self, DecodedAudio};
use crate::error::LoadError;

/// Where a track URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackLocation {
    Remote(String),
    Local(PathBuf),
}

impl TrackLocation {
    pub fn parse(url: &str) -> Result<Self, LoadError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(LoadError::UnsupportedUrl(url.to_string()));
        }
        if let Some(path) = trimmed.strip_prefix("file://") {
            return Ok(TrackLocation::Local(PathBuf::from(path)));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(TrackLocation::Remote(trimmed.to_string()));
        }
        // blob:, data:, ftp://, ... have no meaning outside a browser here
        if trimmed.contains("://") || trimmed.starts_with("blob:") || trimmed.starts_with("data:") {
            return Err(LoadError::UnsupportedUrl(url.to_string()));
        }
        Ok(TrackLocation::Local(PathBuf::from(trimmed)))
    }

    /// Container hint for the probe, taken from the path's extension.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            TrackLocation::Remote(url) => {
                let no_query = url.split(['?', '#']).next().unwrap_or(url);
                PathBuf::from(no_query)
            }
            TrackLocation::Local(p) => p.clone(),
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// Fetches and decodes track URLs into engine-ready audio.
#[derive(Clone)]
pub struct SourceLoader {
    client: reqwest::Client,
    output_sample_rate: u32,
}

impl SourceLoader {
    pub fn new(output_sample_rate: u32, fetch_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("HTTP client setup failed ({e}), using defaults");
                reqwest::Client::new()
            });
        Self { client, output_sample_rate }
    }

    pub fn output_sample_rate(&self) -> u32 {
        self.output_sample_rate
    }

    pub async fn load(&self, url: &str) -> Result<DecodedAudio, LoadError> {
        let location = TrackLocation::parse(url)?;
        let bytes = match &location {
            TrackLocation::Remote(remote) => self.fetch_remote(remote).await?,
            TrackLocation::Local(path) => read_local(path).await?,
        };

        let extension = location.extension();
        let rate = self.output_sample_rate;
        let decoded = tokio::task::spawn_blocking(move || {
            decoder::decode_bytes(bytes, extension.as_deref(), rate)
        })
        .await?;

        decoded.map_err(|e| LoadError::Decode {
            url: url.to_string(),
            reason: format!("{e:#}"),
        })
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let fetch_err = |reason: String| LoadError::Fetch { url: url.to_string(), reason };

        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        if !res.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", res.status())));
        }

        let body = res.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
        log::debug!("⬇️ Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}
