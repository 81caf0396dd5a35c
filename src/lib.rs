// src/lib.rs

pub mod advisory;
pub mod audio;
pub mod config;
pub mod console;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod library;
pub mod loader;
pub mod runtime;

pub use advisory::{AdviceOutcome, Advisor, PersonaStyle, TrackAnalysis, TransitionAdvice};
pub use config::{AdvisoryConfig, EngineConfig};
pub use engine::{AnalysisTap, ChannelId, Engine};
pub use error::{LoadError, PlayOutcome};
pub use library::{Track, TrackLibrary};
pub use runtime::{AudioRuntime, ChannelSnapshot, SourceHandle};
