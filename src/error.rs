// src/error.rs

use thiserror::Error;

use crate::engine::ChannelId;

/// Reasons a `load_track` call can fail. Except for `Superseded`, the
/// channel is left empty.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported track url: {0:?}")]
    UnsupportedUrl(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("output stage could not be resumed: {0}")]
    Stage(String),

    #[error("load on deck {channel} was superseded by a newer load")]
    Superseded { channel: ChannelId },

    #[error("decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result of a transport request. Never an error: a blocked or empty deck
/// degrades to a no-op and the caller decides what to show.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Applied,
    NoSource,
    /// The output stage refused to start (device lost, permission, ...).
    Blocked(String),
}

impl PlayOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PlayOutcome::Applied)
    }
}
