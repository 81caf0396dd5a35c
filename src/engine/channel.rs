// src/engine/channel.rs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::decoder::dsp::{self, STEREO};
use crate::decoder::DecodedAudio;
use crate::engine::metering::{ChannelMeters, MeterState};
use crate::engine::tap::{AnalysisTap, TapFeed, TAP_FFT_SIZE};

/// One of the two decks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ChannelId {
    A,
    B,
}

impl ChannelId {
    pub const ALL: [ChannelId; 2] = [ChannelId::A, ChannelId::B];

    pub fn index(self) -> usize {
        match self {
            ChannelId::A => 0,
            ChannelId::B => 1,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChannelId::A => "A",
            ChannelId::B => "B",
        })
    }
}

/// Identifier for a loaded source, unique for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// A playable audio handle bound to one channel.
pub struct Source {
    id: SourceId,
    url: String,
    audio: Arc<DecodedAudio>,
    /// Fractional frame index into `audio`.
    position: f64,
    playing: bool,
    rate: f32,
    looping: bool,
    taps: Vec<TapFeed>,
    tap_scratch: Vec<f32>,
}

impl Source {
    /// New sources start paused at the top, rate 1.0, looping.
    pub fn new(url: impl Into<String>, audio: Arc<DecodedAudio>) -> Self {
        Self {
            id: SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed)),
            url: url.into(),
            audio,
            position: 0.0,
            playing: false,
            rate: 1.0,
            looping: true,
            taps: Vec::new(),
            tap_scratch: Vec::with_capacity(TAP_FFT_SIZE * 4),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn playback_rate(&self) -> f32 {
        self.rate
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Taps whose reader is still alive.
    pub fn tap_count(&self) -> usize {
        self.taps.iter().filter(|t| t.is_live()).count()
    }

    pub fn duration(&self) -> Duration {
        self.audio.duration()
    }

    pub fn position(&self) -> Duration {
        let sr = self.audio.sample_rate();
        if sr == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.position.max(0.0) / sr as f64)
    }

    pub(crate) fn play(&mut self) {
        // A finished, non-looping source restarts from the top.
        if self.position >= self.audio.frames() as f64 {
            self.position = 0.0;
        }
        self.playing = true;
    }

    pub(crate) fn pause(&mut self) {
        self.playing = false;
    }

    /// Speed multiplier, passed straight through. Pitch follows speed.
    pub(crate) fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    pub(crate) fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub(crate) fn attach_tap(&mut self, feed: TapFeed) {
        self.taps.retain(TapFeed::is_live);
        self.taps.push(feed);
    }

    /// Stop and drop every tap. Called before the source leaves its channel.
    pub(crate) fn disconnect(&mut self) {
        self.playing = false;
        self.taps.clear();
    }

    /// Read interleaved stereo frames into `dst` with linear interpolation
    /// at the current rate. Returns frames written; the rest stays untouched.
    fn read_into(&mut self, dst: &mut [f32]) -> usize {
        let total = self.audio.frames();
        // Non-positive or NaN rates hold the deck silent rather than run backwards.
        if !self.playing || total == 0 || !(self.rate > 0.0) {
            return 0;
        }

        let samples = self.audio.samples();
        let step = self.rate as f64;
        let mut written = 0usize;

        for frame in dst.chunks_exact_mut(STEREO) {
            if self.position >= total as f64 {
                if self.looping {
                    self.position %= total as f64;
                } else {
                    self.position = total as f64;
                    self.playing = false;
                    break;
                }
            }

            let idx = self.position as usize;
            let frac = (self.position - idx as f64) as f32;
            let next = if idx + 1 < total {
                idx + 1
            } else if self.looping {
                0
            } else {
                idx
            };

            for c in 0..STEREO {
                let a = samples[idx * STEREO + c];
                let b = samples[next * STEREO + c];
                frame[c] = a + (b - a) * frac;
            }

            self.position += step;
            written += 1;
        }

        self.taps.retain(TapFeed::is_live);
        if written > 0 && !self.taps.is_empty() {
            self.tap_scratch.clear();
            self.tap_scratch.extend(
                dst[..written * STEREO]
                    .chunks_exact(STEREO)
                    .map(|f| dsp::mono(f[0], f[1])),
            );
            for tap in &mut self.taps {
                tap.push(&self.tap_scratch);
            }
        }

        written
    }
}

/// One deck's path into the master mix: source -> trim -> crossfader gain.
pub struct Channel {
    id: ChannelId,
    source: Option<Source>,
    trim: f32,
    fader_gain: f32,
    meters: Arc<ChannelMeters>,
    meter_state: MeterState,
}

impl Channel {
    pub fn new(id: ChannelId, sample_rate: u32) -> Self {
        Self {
            id,
            source: None,
            trim: 1.0,
            fader_gain: 1.0,
            meters: ChannelMeters::new(),
            meter_state: MeterState::new(sample_rate),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    pub(crate) fn source_mut(&mut self) -> Option<&mut Source> {
        self.source.as_mut()
    }

    pub fn trim(&self) -> f32 {
        self.trim
    }

    pub fn fader_gain(&self) -> f32 {
        self.fader_gain
    }

    /// Effective output level: pre-fader trim times crossfader gain.
    pub fn gain(&self) -> f32 {
        self.trim * self.fader_gain
    }

    pub fn meters(&self) -> Arc<ChannelMeters> {
        self.meters.clone()
    }

    pub(crate) fn set_trim(&mut self, trim: f32) {
        self.trim = trim;
    }

    pub(crate) fn set_fader_gain(&mut self, gain: f32) {
        self.fader_gain = gain;
    }

    /// Swap in `source`, returning the previous one already disconnected.
    pub(crate) fn replace_source(&mut self, source: Option<Source>) -> Option<Source> {
        let mut previous = std::mem::replace(&mut self.source, source);
        if let Some(prev) = previous.as_mut() {
            prev.disconnect();
        }
        previous
    }

    pub(crate) fn analysis_tap(&mut self) -> AnalysisTap {
        match self.source.as_mut() {
            Some(source) => {
                let (tap, feed) = AnalysisTap::connected();
                source.attach_tap(feed);
                tap
            }
            None => AnalysisTap::inert(),
        }
    }

    /// Fill `dst` (interleaved stereo) with this deck's post-fader signal.
    /// Returns frames of real audio; `dst` is zeroed either way.
    pub(crate) fn render_into(&mut self, dst: &mut [f32]) -> usize {
        dst.fill(0.0);

        let written = match self.source.as_mut() {
            Some(source) => source.read_into(dst),
            None => 0,
        };

        if written > 0 {
            let gain = self.gain();
            for s in &mut dst[..written * STEREO] {
                *s *= gain;
            }
        }

        self.meter_state.process_block(dst, &self.meters);
        written
    }
}
