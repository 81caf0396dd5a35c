// tests/common/mod.rs

#![allow(dead_code)]

use std::f32::consts::TAU;
use std::path::{Path, PathBuf};

use deck_mixer::{AudioRuntime, EngineConfig};

pub const RATE: u32 = 44_100;

/// Stereo 16-bit sine at half scale.
pub fn write_sine(dir: &Path, name: &str, freq: f32, secs: f32, rate: u32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (secs * rate as f32) as usize;
    for i in 0..frames {
        let s = 0.5 * (TAU * freq * i as f32 / rate as f32).sin();
        let v = (s * i16::MAX as f32) as i16;
        w.write_sample(v).unwrap();
        w.write_sample(v).unwrap();
    }
    w.finalize().unwrap();
    path
}

pub fn url(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

pub fn headless() -> AudioRuntime {
    AudioRuntime::headless(RATE, EngineConfig::default())
}

/// Pull `frames` stereo frames through the engine, as the device would.
pub fn render(runtime: &AudioRuntime, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; frames * 2];
    runtime.engine().lock().unwrap().render(&mut out);
    out
}
