// src/engine/metering.rs

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Lock-free deck meters. The render thread writes, the UI reads.
#[derive(Default)]
pub struct ChannelMeters {
    peak: [AtomicU32; 2],
    hold: [AtomicU32; 2],
    rms: [AtomicU32; 2],
}

/// Snapshot of one deck's post-fader level, linear amplitude per side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterReading {
    pub peak: [f32; 2],
    pub hold: [f32; 2],
    pub rms: [f32; 2],
}

impl ChannelMeters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reading(&self) -> MeterReading {
        let load = |a: &[AtomicU32; 2]| {
            [
                f32::from_bits(a[0].load(Ordering::Relaxed)),
                f32::from_bits(a[1].load(Ordering::Relaxed)),
            ]
        };
        MeterReading {
            peak: load(&self.peak),
            hold: load(&self.hold),
            rms: load(&self.rms),
        }
    }
}

/// Ballistics state, owned by the render thread.
pub struct MeterState {
    decay_coeff: f32,
    stored_peak: [f32; 2],
    hold_frames: [usize; 2],
    hold_duration_frames: usize,
}

impl MeterState {
    pub fn new(sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f32;
        // 300ms visual falloff, independent of block size
        let release_time_sec = 0.300;
        Self {
            decay_coeff: (-1.0 / (release_time_sec * sr)).exp(),
            stored_peak: [0.0; 2],
            hold_frames: [0; 2],
            // 500ms peak hold
            hold_duration_frames: (0.500 * sr) as usize,
        }
    }

    /// Measure one interleaved stereo block and publish it.
    pub fn process_block(&mut self, buffer: &[f32], meters: &ChannelMeters) {
        let block_size = buffer.len() / 2;
        if block_size == 0 {
            return;
        }

        let mut max = [0.0f32; 2];
        let mut sum_sq = [0.0f32; 2];
        for frame in buffer.chunks_exact(2) {
            for side in 0..2 {
                let s = frame[side];
                max[side] = max[side].max(s.abs());
                sum_sq[side] += s * s;
            }
        }

        let block_decay = self.decay_coeff.powf(block_size as f32);

        for side in 0..2 {
            if max[side] > self.stored_peak[side] {
                self.stored_peak[side] = max[side];
                self.hold_frames[side] = self.hold_duration_frames;
            } else if self.hold_frames[side] > 0 {
                self.hold_frames[side] = self.hold_frames[side].saturating_sub(block_size);
            } else {
                self.stored_peak[side] *= block_decay;
                if self.stored_peak[side] < 1e-20 {
                    self.stored_peak[side] = 0.0; // denormals
                }
            }

            let rms = (sum_sq[side] / block_size as f32).sqrt();
            meters.peak[side].store(max[side].to_bits(), Ordering::Relaxed);
            meters.hold[side].store(self.stored_peak[side].to_bits(), Ordering::Relaxed);
            meters.rms[side].store(rms.to_bits(), Ordering::Relaxed);
        }
    }
}
