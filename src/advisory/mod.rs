// src/advisory/mod.rs
//
// Mixora AI: track analysis, transition advice and host chatter from a
// chat-completions service. Nothing here ever fails outward; every error is
// logged and replaced by a fixed fallback.

pub mod backend;
pub mod tracker;
pub mod types;

pub use backend::{AdvisoryError, CompletionBackend, CompletionRequest, HttpCompletionBackend};
pub use tracker::{pair_key, AdvisorySlot, RequestTag, RequestTracker};
pub use types::{AdviceOutcome, EnergyChange, KeyCompatibility, PersonaStyle, TrackAnalysis, TransitionAdvice};

use crate::config::AdvisoryConfig;
use crate::library::Track;

pub const PERSONA_IDLE: &str = "Keep the vibe going!";
pub const PERSONA_UNAVAILABLE: &str = "Mixora AI ready.";
pub const PERSONA_LISTENING: &str = "Mixora AI is listening...";

pub struct Advisor<B = HttpCompletionBackend> {
    backend: B,
}

impl Advisor<HttpCompletionBackend> {
    pub fn from_config(config: AdvisoryConfig) -> Self {
        if config.api_key.is_none() {
            log::warn!("🤖 No AI key configured, advisory answers will use fallbacks");
        }
        Self::new(HttpCompletionBackend::new(config))
    }

    pub fn from_env() -> Self {
        Self::from_config(AdvisoryConfig::from_env())
    }
}

impl<B: CompletionBackend> Advisor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // --- TRACK ANALYSIS ---

    pub async fn analyze_track_outcome(&self, name: &str, artist: &str) -> AdviceOutcome<TrackAnalysis> {
        let prompt = format!(
            "Analyze the song \"{name}\" by \"{artist}\". Return a JSON object with estimated bpm (number), \
             key (string), genre (string), and energy (number 1-10). Only return JSON."
        );
        let result = self
            .backend
            .complete(CompletionRequest::json(prompt))
            .await
            .and_then(|reply| {
                serde_json::from_str::<TrackAnalysis>(extract_json(&reply))
                    .map_err(|e| AdvisoryError::Malformed(e.to_string()))
            });

        match result {
            Ok(analysis) => AdviceOutcome::Fresh(analysis),
            Err(e) => {
                log::warn!("🤖 Track analysis failed: {e}");
                AdviceOutcome::Fallback(TrackAnalysis::default())
            }
        }
    }

    pub async fn analyze_track(&self, name: &str, artist: &str) -> TrackAnalysis {
        self.analyze_track_outcome(name, artist).await.into_inner()
    }

    // --- TRANSITIONS ---

    pub async fn transition_advice_outcome(&self, current: &Track, next: &Track) -> AdviceOutcome<TransitionAdvice> {
        let prompt = format!(
            "Act as Mixora AI, a professional DJ mentor. I am mixing from \"{}\" ({} BPM, {}, {}) \
             into \"{}\" ({} BPM, {}, {}).\n\
             Analyze compatibility.\n\
             Return JSON with:\n\
             - transitionSuitability (0-100 number)\n\
             - suggestedTransition (short string advice, max 10 words)\n\
             - keyCompatibility ('Harmonic' | 'Compatible' | 'Clash')\n\
             - energyChange ('Build Up' | 'Drop' | 'Consistent' | 'Chill')",
            current.title, current.bpm, current.key, current.genre, next.title, next.bpm, next.key, next.genre,
        );
        let result = self
            .backend
            .complete(CompletionRequest::json(prompt))
            .await
            .and_then(|reply| TransitionAdvice::from_json(extract_json(&reply)));

        match result {
            Ok(advice) => AdviceOutcome::Fresh(advice),
            Err(e) => {
                log::warn!("🤖 Transition advice failed ({} -> {}): {e}", current.title, next.title);
                AdviceOutcome::Fallback(TransitionAdvice::fallback())
            }
        }
    }

    pub async fn transition_advice(&self, current: &Track, next: &Track) -> TransitionAdvice {
        self.transition_advice_outcome(current, next).await.into_inner()
    }

    // --- HOST PERSONA ---

    pub async fn persona_message_outcome(&self, track: Option<&Track>, style: PersonaStyle) -> AdviceOutcome<String> {
        let Some(track) = track else {
            return AdviceOutcome::Fallback(PERSONA_IDLE.to_string());
        };

        match self.backend.complete(CompletionRequest::text(style.prompt(&track.title))).await {
            Ok(reply) => match strip_reasoning(&reply).trim() {
                "" => AdviceOutcome::Fallback(PERSONA_LISTENING.to_string()),
                text => AdviceOutcome::Fresh(text.to_string()),
            },
            Err(AdvisoryError::Empty) => AdviceOutcome::Fallback(PERSONA_LISTENING.to_string()),
            Err(e) => {
                log::warn!("🤖 Persona message failed: {e}");
                AdviceOutcome::Fallback(PERSONA_UNAVAILABLE.to_string())
            }
        }
    }

    pub async fn persona_message(&self, track: Option<&Track>, style: PersonaStyle) -> String {
        self.persona_message_outcome(track, style).await.into_inner()
    }
}

/// Drop a leading `<think>...</think>` block some reasoning models emit.
fn strip_reasoning(reply: &str) -> &str {
    let trimmed = reply.trim_start();
    if trimmed.starts_with("<think>") {
        if let Some(end) = trimmed.find("</think>") {
            return &trimmed[end + "</think>".len()..];
        }
    }
    trimmed
}

/// The JSON object inside a reply: reasoning and markdown fences removed.
fn extract_json(reply: &str) -> &str {
    let text = strip_reasoning(reply).trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string (```json) up to the first newline.
    let body = rest.find('\n').map_or(rest, |nl| &rest[nl + 1..]);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
