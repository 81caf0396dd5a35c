// src/runtime.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::audio::{setup_output_device, CpalStage, ManualStage, OutputStage};
use crate::config::EngineConfig;
use crate::engine::{AnalysisTap, ChannelId, Engine, MeterReading, Source, SourceId};
use crate::error::{LoadError, PlayOutcome};
use crate::loader::SourceLoader;

/// What a successful `load_track` hands back to the deck.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceHandle {
    pub id: SourceId,
    pub channel: ChannelId,
    pub url: String,
    pub duration: Duration,
}

/// Read-only view of one deck for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub channel: ChannelId,
    pub source_id: Option<SourceId>,
    pub url: Option<String>,
    pub playing: bool,
    pub playback_rate: Option<f32>,
    pub looping: bool,
    pub position: Duration,
    pub duration: Duration,
    pub trim: f32,
    pub fader_gain: f32,
}

/// Owns the engine, its output stage and the loader. Constructed once and
/// passed by reference; `shutdown` releases both decks and the stage.
pub struct AudioRuntime {
    engine: Arc<Mutex<Engine>>,
    stage: Mutex<Box<dyn OutputStage>>,
    loader: SourceLoader,
    load_generations: [AtomicU64; 2],
}

impl AudioRuntime {
    /// Open the default output device. The stream stays suspended until the
    /// first load or play.
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let output = setup_output_device()?;
        let engine = Arc::new(Mutex::new(Engine::new(output.output_sample_rate)));
        let stage = CpalStage::build(output, engine.clone())?;
        Ok(Self::with_stage(engine, Box::new(stage), config))
    }

    /// Engine with no device; blocks are pulled through `engine()`.
    pub fn headless(sample_rate: u32, config: EngineConfig) -> Self {
        let engine = Arc::new(Mutex::new(Engine::new(sample_rate)));
        Self::with_stage(engine, Box::new(ManualStage::new()), config)
    }

    pub fn with_stage(engine: Arc<Mutex<Engine>>, stage: Box<dyn OutputStage>, config: EngineConfig) -> Self {
        let sample_rate = lock(&engine).sample_rate;
        Self {
            engine,
            stage: Mutex::new(stage),
            loader: SourceLoader::new(sample_rate, config.fetch_timeout),
            load_generations: [AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        self.engine.clone()
    }

    fn lock_engine(&self) -> MutexGuard<'_, Engine> {
        lock(&self.engine)
    }

    pub fn stage_suspended(&self) -> bool {
        lock(&self.stage).is_suspended()
    }

    fn ensure_stage_running(&self) -> anyhow::Result<()> {
        let mut stage = lock(&self.stage);
        if stage.is_suspended() {
            stage.resume()?;
            log::info!("🔈 Output stage resumed");
        }
        Ok(())
    }

    // --- LOADING ---

    /// Replace the deck's source with `url`.
    ///
    /// The previous source is detached before fetching starts, so a failed
    /// load leaves the deck empty. A newer load on the same deck supersedes
    /// this one; the older call then fails with `LoadError::Superseded`.
    pub async fn load_track(&self, channel: ChannelId, url: &str) -> Result<SourceHandle, LoadError> {
        let generation = self.load_generations[channel.index()].fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(prev) = self.lock_engine().detach_source(channel) {
            log::debug!("⏏️ Deck {channel}: detached {:?} ({})", prev.id(), prev.url());
        }

        self.ensure_stage_running()
            .map_err(|e| LoadError::Stage(e.to_string()))?;

        let audio = match self.loader.load(url).await {
            Ok(audio) => Arc::new(audio),
            Err(e) => {
                log::warn!("❌ Deck {channel}: track failed to load: {e}");
                return Err(e);
            }
        };

        let source = Source::new(url, audio);
        let handle = SourceHandle {
            id: source.id(),
            channel,
            url: url.to_string(),
            duration: source.duration(),
        };

        let mut engine = self.lock_engine();
        // Checked under the engine lock so a newer load cannot slip in between.
        if self.load_generations[channel.index()].load(Ordering::SeqCst) != generation {
            log::debug!("Deck {channel}: dropping superseded load of {url}");
            return Err(LoadError::Superseded { channel });
        }
        if let Some(stray) = engine.attach_source(channel, source) {
            log::debug!("⏏️ Deck {channel}: detached {:?}", stray.id());
        }
        drop(engine);

        log::info!(
            "💿 Deck {channel}: loaded {} ({:.1}s)",
            handle.url,
            handle.duration.as_secs_f64()
        );
        Ok(handle)
    }

    // --- TRANSPORT ---

    pub fn play(&self, channel: ChannelId) -> PlayOutcome {
        if !self.lock_engine().has_source(channel) {
            return PlayOutcome::NoSource;
        }
        if let Err(e) = self.ensure_stage_running() {
            log::warn!("▶️ Deck {channel}: playback blocked: {e}");
            return PlayOutcome::Blocked(e.to_string());
        }
        if self.lock_engine().play(channel) {
            PlayOutcome::Applied
        } else {
            PlayOutcome::NoSource
        }
    }

    pub fn pause(&self, channel: ChannelId) -> PlayOutcome {
        if self.lock_engine().pause(channel) {
            PlayOutcome::Applied
        } else {
            PlayOutcome::NoSource
        }
    }

    /// Not clamped; the UI control owns the ±8% range.
    pub fn set_speed(&self, channel: ChannelId, rate: f32) {
        self.lock_engine().set_speed(channel, rate);
    }

    pub fn set_loop(&self, channel: ChannelId, enabled: bool) {
        self.lock_engine().set_loop(channel, enabled);
    }

    pub fn set_volume(&self, channel: ChannelId, level: f32) {
        self.lock_engine().set_volume(channel, level);
    }

    pub fn set_crossfader(&self, position: f32) {
        self.lock_engine().set_crossfader(position);
    }

    pub fn set_master_gain(&self, gain: f32) {
        self.lock_engine().master_gain = gain.max(0.0);
    }

    // --- READ-BACK ---

    pub fn crossfader(&self) -> f32 {
        self.lock_engine().crossfader()
    }

    pub fn analysis_tap(&self, channel: ChannelId) -> AnalysisTap {
        self.lock_engine().analysis_tap(channel)
    }

    pub fn meters(&self, channel: ChannelId) -> MeterReading {
        self.lock_engine().meters(channel).reading()
    }

    pub fn channel_state(&self, channel: ChannelId) -> ChannelSnapshot {
        let engine = self.lock_engine();
        let ch = engine.channel(channel);
        let src = ch.source();
        ChannelSnapshot {
            channel,
            source_id: src.map(Source::id),
            url: src.map(|s| s.url().to_string()),
            playing: src.is_some_and(Source::is_playing),
            playback_rate: src.map(Source::playback_rate),
            looping: src.is_some_and(Source::is_looping),
            position: src.map(Source::position).unwrap_or_default(),
            duration: src.map(Source::duration).unwrap_or_default(),
            trim: ch.trim(),
            fader_gain: ch.fader_gain(),
        }
    }

    // --- LIFECYCLE ---

    /// Detach both decks and suspend the output stage.
    pub fn shutdown(&self) {
        for r#gen in &self.load_generations {
            r#gen.fetch_add(1, Ordering::SeqCst);
        }
        self.lock_engine().release_all();
        if let Err(e) = lock(&self.stage).suspend() {
            log::warn!("Output stage did not suspend cleanly: {e}");
        }
        log::info!("🛑 Audio runtime shut down");
    }
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
