// src/audio.rs

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use crate::decoder::dsp::STEREO;
use crate::engine::Engine;

/// Helper struct to hold output device info
pub struct OutputConfig {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Finds the default audio output device and its config.
pub fn setup_output_device() -> anyhow::Result<OutputConfig> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device available"))?;
    let supported_config = device.default_output_config()?;
    let sample_format = supported_config.sample_format();
    let config = supported_config.config();
    let output_channels = config.channels as usize;
    let output_sample_rate = config.sample_rate.0;

    log::info!(
        "🔊 Output device: channels: {}, sample_rate: {}",
        output_channels, output_sample_rate
    );

    Ok(OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    })
}

/// The sink the engine renders into. Starts suspended, like a browser audio
/// context waiting for a user gesture, and must be resumed before anything
/// is audible.
pub trait OutputStage {
    fn is_suspended(&self) -> bool;
    fn resume(&mut self) -> anyhow::Result<()>;
    fn suspend(&mut self) -> anyhow::Result<()>;
}

/// cpal-backed stage: one output stream pulling blocks from `Engine::render`.
pub struct CpalStage {
    stream: Stream,
    suspended: bool,
}

impl CpalStage {
    pub fn build(output: OutputConfig, engine: Arc<Mutex<Engine>>) -> anyhow::Result<Self> {
        let OutputConfig { device, config, sample_format, output_channels, .. } = output;

        let stream = match sample_format {
            SampleFormat::F32 => build_engine_stream::<f32>(&device, &config, output_channels, engine)?,
            SampleFormat::I16 => build_engine_stream::<i16>(&device, &config, output_channels, engine)?,
            SampleFormat::U16 => build_engine_stream::<u16>(&device, &config, output_channels, engine)?,
            other => anyhow::bail!("Unsupported sample format: {:?}", other),
        };

        // Some hosts start streams on creation; hold it until the first resume.
        let suspended = stream.pause().is_ok();
        Ok(Self { stream, suspended })
    }
}

impl OutputStage for CpalStage {
    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        self.stream.play()?;
        self.suspended = false;
        Ok(())
    }

    fn suspend(&mut self) -> anyhow::Result<()> {
        self.stream.pause()?;
        self.suspended = true;
        Ok(())
    }
}

fn build_engine_stream<T>(
    device: &Device,
    config: &StreamConfig,
    device_channels: usize,
    engine: Arc<Mutex<Engine>>,
) -> anyhow::Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::with_capacity(2048 * STEREO);
    let err_fn = |err| log::error!("Output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / device_channels.max(1);
            scratch.resize(frames * STEREO, 0.0);

            match engine.lock() {
                Ok(mut eng) => eng.render(&mut scratch),
                Err(_) => scratch.fill(0.0),
            }

            // Map the stereo mix onto the device layout; extra channels stay silent.
            for (frame, lr) in data.chunks_mut(device_channels.max(1)).zip(scratch.chunks_exact(STEREO)) {
                match frame.len() {
                    1 => frame[0] = T::from_sample(0.5 * (lr[0] + lr[1])),
                    _ => {
                        frame[0] = T::from_sample(lr[0]);
                        frame[1] = T::from_sample(lr[1]);
                        for s in frame.iter_mut().skip(2) {
                            *s = T::from_sample(0.0f32);
                        }
                    }
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}

/// Stage with no device behind it. Blocks are rendered by whoever holds the
/// engine (tests, offline bounce). Optionally refuses to resume.
#[derive(Debug)]
pub struct ManualStage {
    suspended: bool,
    refuse: Option<String>,
}

impl Default for ManualStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualStage {
    pub fn new() -> Self {
        Self { suspended: true, refuse: None }
    }

    /// A stage whose resume always fails with `reason`.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self { suspended: true, refuse: Some(reason.into()) }
    }
}

impl OutputStage for ManualStage {
    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        if let Some(reason) = &self.refuse {
            return Err(anyhow!("{reason}"));
        }
        self.suspended = false;
        Ok(())
    }

    fn suspend(&mut self) -> anyhow::Result<()> {
        self.suspended = true;
        Ok(())
    }
}
