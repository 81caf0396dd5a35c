// tests/advisory.rs

use std::sync::atomic::{AtomicUsize, Ordering};

use deck_mixer::advisory::{
    AdvisoryError, CompletionBackend, CompletionRequest, EnergyChange, KeyCompatibility,
};
use deck_mixer::{Advisor, TrackLibrary, TransitionAdvice};

/// Fails a different way on every call.
#[derive(Default)]
struct Flaky {
    calls: AtomicUsize,
}

impl CompletionBackend for Flaky {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, AdvisoryError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) % 5 {
            0 => Err(AdvisoryError::MissingKey),
            1 => Err(AdvisoryError::Status { status: 429, body: "rate limited".into() }),
            2 => Ok("Sure! Here is my advice: mix it slowly.".into()),
            3 => Ok(r#"{"transitionSuitability": -5, "suggestedTransition": "x",
                        "keyCompatibility": "Clash", "energyChange": "Drop"}"#
                .into()),
            _ => Err(AdvisoryError::Empty),
        }
    }
}

#[tokio::test]
async fn every_failure_yields_the_same_fallback() {
    let library = TrackLibrary::with_demo_tracks();
    let current = library.get("2").unwrap();
    let next = library.get("3").unwrap();
    let advisor = Advisor::new(Flaky::default());

    let expected = TransitionAdvice {
        transition_suitability: 50,
        suggested_transition: "Hard cut recommended due to tempo mismatch.".into(),
        key_compatibility: KeyCompatibility::Clash,
        energy_change: EnergyChange::Consistent,
    };
    assert_eq!(TransitionAdvice::fallback(), expected);

    for _ in 0..5 {
        let outcome = advisor.transition_advice_outcome(current, next).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.into_inner(), expected);
    }
}

#[tokio::test]
async fn analysis_failures_yield_an_empty_analysis() {
    let advisor = Advisor::new(Flaky::default());
    for _ in 0..5 {
        let analysis = advisor.analyze_track("Neon Nights", "Cyberwave").await;
        assert!(analysis.bpm.is_none() && analysis.key.is_none());
        assert!(analysis.genre.is_none() && analysis.energy.is_none());
    }
}
