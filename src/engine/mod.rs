// src/engine/mod.rs

pub mod channel;
pub mod metering;
pub mod mixer;
pub mod tap;

pub use channel::{Channel, ChannelId, Source, SourceId};
pub use metering::{ChannelMeters, MeterReading};
pub use mixer::{equal_power_gains, Mixer};
pub use tap::AnalysisTap;

use std::sync::Arc;

use crate::decoder::dsp::STEREO;

/// The two-deck mixing core. Pure state plus `render`; the device stream
/// and async loading live in `AudioRuntime`.
pub struct Engine {
    pub sample_rate: u32,
    pub master_gain: f32,
    channels: [Channel; 2],
    crossfader: f32,
    mixer: Mixer,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        let mut engine = Self {
            sample_rate,
            master_gain: 1.0,
            channels: [
                Channel::new(ChannelId::A, sample_rate),
                Channel::new(ChannelId::B, sample_rate),
            ],
            crossfader: 0.0,
            mixer: Mixer::new(),
        };
        // Fader gains always come from the law, including at start-up.
        engine.set_crossfader(0.0);
        engine
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    fn channel_mut(&mut self, id: ChannelId) -> &mut Channel {
        &mut self.channels[id.index()]
    }

    pub fn has_source(&self, id: ChannelId) -> bool {
        self.channel(id).source().is_some()
    }

    /// Bind `source` to the deck. Whatever was there is stopped and
    /// disconnected before the new source is wired in, and handed back.
    pub fn attach_source(&mut self, id: ChannelId, source: Source) -> Option<Source> {
        self.channel_mut(id).replace_source(Some(source))
    }

    pub fn detach_source(&mut self, id: ChannelId) -> Option<Source> {
        self.channel_mut(id).replace_source(None)
    }

    /// Returns false when the deck is empty.
    pub fn play(&mut self, id: ChannelId) -> bool {
        self.with_source(id, Source::play)
    }

    pub fn pause(&mut self, id: ChannelId) -> bool {
        self.with_source(id, Source::pause)
    }

    pub fn set_speed(&mut self, id: ChannelId, rate: f32) -> bool {
        self.with_source(id, |s| s.set_rate(rate))
    }

    pub fn set_loop(&mut self, id: ChannelId, looping: bool) -> bool {
        self.with_source(id, |s| s.set_looping(looping))
    }

    fn with_source(&mut self, id: ChannelId, f: impl FnOnce(&mut Source)) -> bool {
        match self.channel_mut(id).source_mut() {
            Some(source) => {
                f(source);
                true
            }
            None => false,
        }
    }

    /// Pre-fader trim, clamped to [0, 1]. Kept across loads.
    pub fn set_volume(&mut self, id: ChannelId, level: f32) {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        self.channel_mut(id).set_trim(level);
    }

    /// Both fader gains are recomputed and written together.
    pub fn set_crossfader(&mut self, position: f32) {
        let (gain_a, gain_b) = equal_power_gains(position);
        self.crossfader = position;
        self.channels[0].set_fader_gain(gain_a);
        self.channels[1].set_fader_gain(gain_b);
    }

    pub fn crossfader(&self) -> f32 {
        self.crossfader
    }

    pub fn analysis_tap(&mut self, id: ChannelId) -> AnalysisTap {
        self.channel_mut(id).analysis_tap()
    }

    pub fn meters(&self, id: ChannelId) -> Arc<ChannelMeters> {
        self.channel(id).meters()
    }

    /// Detach both decks. Used on shutdown.
    pub fn release_all(&mut self) {
        for id in ChannelId::ALL {
            self.detach_source(id);
        }
    }

    /// Render one block of interleaved stereo into `out`.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let frames = out.len() / STEREO;
        if frames == 0 {
            return;
        }

        self.mixer.begin_block(frames);
        for channel in &mut self.channels {
            self.mixer.render_channel(channel);
        }
        self.mixer.mix_into(out, self.master_gain);
    }
}
