// src/engine/mixer.rs

use std::f32::consts::FRAC_PI_2;

use super::channel::Channel;
use crate::decoder::dsp::STEREO;

/// Equal-power crossfader law.
///
/// `position` runs from -1 (deck A only) to +1 (deck B only) and is not
/// clamped. With `x = (position + 1) / 2`, returns
/// `(cos(x * pi/2), cos((1 - x) * pi/2))` so `a^2 + b^2 == 1` across the sweep.
pub fn equal_power_gains(position: f32) -> (f32, f32) {
    let x = (position + 1.0) * 0.5;
    ((x * FRAC_PI_2).cos(), ((1.0 - x) * FRAC_PI_2).cos())
}

/// Sums the decks into the master bus.
pub struct Mixer {
    mix_buffer: Vec<f32>,
    scratch_buffer: Vec<f32>,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer {
    pub fn new() -> Self {
        let initial_capacity = 2048 * STEREO;
        Self {
            mix_buffer: Vec::with_capacity(initial_capacity),
            scratch_buffer: Vec::with_capacity(initial_capacity),
        }
    }

    pub fn begin_block(&mut self, frames: usize) {
        let needed = frames * STEREO;
        self.mix_buffer.resize(needed, 0.0);
        if self.scratch_buffer.len() < needed {
            self.scratch_buffer.resize(needed, 0.0);
        }
        self.mix_buffer.fill(0.0);
    }

    pub fn render_channel(&mut self, channel: &mut Channel) {
        let total = self.mix_buffer.len();
        let scratch = &mut self.scratch_buffer[..total];

        let written = channel.render_into(scratch);
        for (acc, s) in self.mix_buffer[..written * STEREO].iter_mut().zip(scratch.iter()) {
            *acc += *s;
        }
    }

    /// Apply master gain and soft-clip into `out`.
    pub fn mix_into(&self, out: &mut [f32], master_gain: f32) {
        for (o, &sample) in out.iter_mut().zip(&self.mix_buffer) {
            let s = sample * master_gain;
            *o = if s.abs() < 1e-10 { 0.0 } else { s.tanh() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_1_SQRT_2;

    #[test]
    fn law_closed_form_points() {
        let (a, b) = equal_power_gains(-1.0);
        assert_abs_diff_eq!(a, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(b, 0.0, epsilon = 1e-6);

        let (a, b) = equal_power_gains(0.0);
        assert_abs_diff_eq!(a, FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_abs_diff_eq!(b, FRAC_1_SQRT_2, epsilon = 1e-6);

        let (a, b) = equal_power_gains(1.0);
        assert_abs_diff_eq!(a, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(b, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn law_keeps_power_constant() {
        for pos in [-1.0f32, -0.5, 0.0, 0.5, 1.0, -0.73, 0.12] {
            let (a, b) = equal_power_gains(pos);
            assert_abs_diff_eq!(a * a + b * b, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn quarter_positions_mirror() {
        let (a, b) = equal_power_gains(-0.5);
        let (a2, b2) = equal_power_gains(0.5);
        assert_abs_diff_eq!(a, (std::f32::consts::PI / 8.0).cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(a, b2, epsilon = 1e-6);
        assert_abs_diff_eq!(b, a2, epsilon = 1e-6);
    }

    #[test]
    fn soft_clip_bounds_output() {
        let mut mixer = Mixer::new();
        mixer.begin_block(2);
        mixer.mix_buffer.copy_from_slice(&[4.0, -4.0, 0.0, 1e-12]);
        let mut out = [9.0f32; 4];
        mixer.mix_into(&mut out, 1.0);
        assert!(out[0] < 1.0 && out[0] > 0.99);
        assert!(out[1] > -1.0 && out[1] < -0.99);
        assert_eq!(&out[2..], &[0.0, 0.0]);
    }
}
