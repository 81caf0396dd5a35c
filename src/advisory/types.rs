// src/advisory/types.rs

use serde::{Deserialize, Serialize};

use super::AdvisoryError;

/// Estimated metadata for a track. Every field is optional; the library
/// fills gaps with its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// 1-10 as returned; not clamped here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCompatibility {
    Harmonic,
    Compatible,
    Clash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyChange {
    #[serde(rename = "Build Up")]
    BuildUp,
    Drop,
    Consistent,
    Chill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionAdvice {
    /// 0..=100
    pub transition_suitability: u8,
    pub suggested_transition: String,
    pub key_compatibility: KeyCompatibility,
    pub energy_change: EnergyChange,
}

impl TransitionAdvice {
    /// Returned whenever the service cannot give a usable answer.
    pub fn fallback() -> Self {
        Self {
            transition_suitability: 50,
            suggested_transition: "Hard cut recommended due to tempo mismatch.".to_string(),
            key_compatibility: KeyCompatibility::Clash,
            energy_change: EnergyChange::Consistent,
        }
    }

    pub(crate) fn from_json(text: &str) -> Result<Self, AdvisoryError> {
        let raw: RawTransitionAdvice =
            serde_json::from_str(text).map_err(|e| AdvisoryError::Malformed(e.to_string()))?;

        let score = raw.transition_suitability;
        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            return Err(AdvisoryError::Malformed(format!("transitionSuitability out of range: {score}")));
        }

        Ok(Self {
            transition_suitability: score.round() as u8,
            suggested_transition: raw.suggested_transition,
            key_compatibility: raw.key_compatibility,
            energy_change: raw.energy_change,
        })
    }
}

// Models sometimes answer 72.5 where 72 was asked for.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransitionAdvice {
    transition_suitability: f64,
    suggested_transition: String,
    key_compatibility: KeyCompatibility,
    energy_change: EnergyChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonaStyle {
    Hype,
    Chill,
    Technical,
}

impl PersonaStyle {
    pub const ALL: [PersonaStyle; 3] = [PersonaStyle::Hype, PersonaStyle::Chill, PersonaStyle::Technical];

    pub(crate) fn prompt(self, title: &str) -> String {
        match self {
            PersonaStyle::Hype => format!(
                "Act as Mixora AI (Host). Generate a short, 1-sentence hype intro for a DJ playing \"{title}\". Be energetic!"
            ),
            PersonaStyle::Chill => format!(
                "Act as Mixora AI (Host). Generate a relaxed, 1-sentence thought about the vibe of \"{title}\"."
            ),
            PersonaStyle::Technical => format!(
                "Act as Mixora AI (Host). Give a 1-sentence technical observation about mixing \"{title}\" (e.g., bassline, percussion)."
            ),
        }
    }
}

/// An advisory result that says whether it came from the service or from
/// the built-in fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum AdviceOutcome<T> {
    Fresh(T),
    Fallback(T),
}

impl<T> AdviceOutcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, AdviceOutcome::Fallback(_))
    }

    pub fn value(&self) -> &T {
        match self {
            AdviceOutcome::Fresh(v) | AdviceOutcome::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            AdviceOutcome::Fresh(v) | AdviceOutcome::Fallback(v) => v,
        }
    }
}
