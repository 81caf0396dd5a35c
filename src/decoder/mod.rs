// src/decoder/mod.rs

pub mod dsp;
pub mod resample;

use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use dsp::STEREO;

/// A fully decoded track: interleaved stereo at the engine's output rate.
/// Shared read-only between the control side and the render thread.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn from_stereo(samples: Vec<f32>, sample_rate: u32) -> Self {
        debug_assert!(samples.len() % STEREO == 0);
        Self { samples, sample_rate }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / STEREO
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

fn open_format(source: Box<dyn MediaSource>, extension: Option<&str>) -> anyhow::Result<Box<dyn FormatReader>> {
    let mss = MediaSourceStream::new(source, Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }
    let probed = get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("unrecognised audio container")?;
    Ok(probed.format)
}

/// Decode an in-memory file to stereo at `output_rate`.
/// Blocking and CPU heavy: call it from a blocking task.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>, output_rate: u32) -> anyhow::Result<DecodedAudio> {
    let mut format = open_format(Box::new(Cursor::new(bytes)), extension)?;

    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("no default audio track"))?;
    let track_id = track.id;
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("unsupported codec")?;

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut stereo = Vec::<f32>::new();
    let mut source_rate: Option<u32> = track.codec_params.sample_rate;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            // End of stream surfaces as an unexpected EOF.
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::IoError(_)) => continue,
            Err(e) => return Err(e.into()),
        };
        if decoded.frames() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        source_rate.get_or_insert(spec.rate);

        let needs_new = sample_buf
            .as_ref()
            .is_none_or(|b| b.capacity() < decoded.capacity());
        if needs_new {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            dsp::append_as_stereo(buf.samples(), spec.channels.count(), &mut stereo);
        }
    }

    let source_rate = source_rate.ok_or_else(|| anyhow!("missing sample rate"))?;
    if stereo.is_empty() {
        return Err(anyhow!("stream contained no audio frames"));
    }

    log::debug!(
        "📊 Decoded {} frames @ {} Hz, resampling to {} Hz",
        stereo.len() / STEREO,
        source_rate,
        output_rate
    );

    let samples = resample::resample_stereo(stereo, source_rate, output_rate)?;
    Ok(DecodedAudio::from_stereo(samples, output_rate))
}

/// Cheap duration probe from container metadata, without decoding.
pub fn probe_duration(path: &Path) -> anyhow::Result<Duration> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str());
    let format = open_format(Box::new(file), ext)?;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("no default audio track"))?;
    let rate = track.codec_params.sample_rate.context("missing sample rate")?;
    let n_frames = track.codec_params.n_frames.context("unknown length")?;
    Ok(Duration::from_secs_f64(n_frames as f64 / rate as f64))
}
