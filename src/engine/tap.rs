// src/engine/tap.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ringbuf::traits::{Consumer, RingBuffer};
use ringbuf::HeapRb;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Transform window of every analysis tap.
pub const TAP_FFT_SIZE: usize = 256;

/// Floor reported for empty bins, in dBFS.
pub const SILENCE_DB: f32 = -100.0;

type SharedWindow = Arc<Mutex<Vec<f32>>>;

/// Render-thread half of a tap. Lives inside the source it reads from,
/// so replacing the source disconnects the tap.
///
/// The feed keeps the newest `TAP_FFT_SIZE` samples in an overwriting ring
/// and publishes them to the reader after every block. The render thread
/// only ever `try_lock`s the shared window; a block that finds the reader
/// mid-copy is picked up by the next publish.
pub struct TapFeed {
    history: HeapRb<f32>,
    shared: SharedWindow,
    connected: Arc<AtomicBool>,
}

impl TapFeed {
    /// Push mono samples, overwriting the oldest ones.
    pub fn push(&mut self, samples: &[f32]) {
        let tail = &samples[samples.len().saturating_sub(TAP_FFT_SIZE)..];
        self.history.push_slice_overwrite(tail);

        if let Ok(mut window) = self.shared.try_lock() {
            let (head, wrapped) = self.history.as_slices();
            let start = TAP_FFT_SIZE - head.len() - wrapped.len();
            window[start..start + head.len()].copy_from_slice(head);
            window[start + head.len()..].copy_from_slice(wrapped);
        }
    }

    /// False once the `AnalysisTap` on the other end has been dropped.
    pub fn is_live(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }
}

impl Drop for TapFeed {
    fn drop(&mut self) {
        self.connected.store(false, Ordering::Release);
    }
}

/// Read-only view of a deck's signal for visualization.
///
/// A tap never fails: with nothing attached it reports silence.
pub struct AnalysisTap {
    shared: SharedWindow,
    connected: Arc<AtomicBool>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    spectrum: Vec<Complex<f32>>,
}

impl AnalysisTap {
    pub(crate) fn connected() -> (Self, TapFeed) {
        let connected = Arc::new(AtomicBool::new(true));
        let mut tap = Self::inert();
        tap.connected = connected.clone();

        let feed = TapFeed {
            history: HeapRb::new(TAP_FFT_SIZE),
            shared: tap.shared.clone(),
            connected,
        };
        (tap, feed)
    }

    /// A tap wired to nothing.
    pub fn inert() -> Self {
        let fft = FftPlanner::<f32>::new().plan_fft_forward(TAP_FFT_SIZE);
        Self {
            shared: Arc::new(Mutex::new(vec![0.0; TAP_FFT_SIZE])),
            connected: Arc::new(AtomicBool::new(false)),
            window: vec![0.0; TAP_FFT_SIZE],
            fft,
            spectrum: vec![Complex { re: 0.0, im: 0.0 }; TAP_FFT_SIZE],
        }
    }

    pub fn fft_size(&self) -> usize {
        TAP_FFT_SIZE
    }

    pub fn frequency_bin_count(&self) -> usize {
        TAP_FFT_SIZE / 2
    }

    /// True while the source this tap was created for is still attached.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Copy the most recently published window.
    fn pull(&mut self) {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        self.window.copy_from_slice(&shared);
    }

    /// Latest `TAP_FFT_SIZE` mono samples, oldest first.
    pub fn time_domain_data(&mut self) -> &[f32] {
        self.pull();
        &self.window
    }

    /// RMS level of the current window (0.0 when silent).
    pub fn level(&mut self) -> f32 {
        self.pull();
        let sum_sq: f32 = self.window.iter().map(|s| s * s).sum();
        (sum_sq / TAP_FFT_SIZE as f32).sqrt()
    }

    /// Magnitude spectrum in dBFS, `frequency_bin_count()` bins.
    /// A full-scale sine reads roughly 0 dB in its bin.
    pub fn frequency_data(&mut self) -> Vec<f32> {
        self.pull();

        let n = TAP_FFT_SIZE as f32;
        for (i, (bin, s)) in self.spectrum.iter_mut().zip(&self.window).enumerate() {
            // Hann window against leakage
            let w = 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / (n - 1.0)).cos());
            *bin = Complex { re: s * w, im: 0.0 };
        }
        self.fft.process(&mut self.spectrum);

        // Hann coherent gain is 0.5, single-sided spectrum doubles: N/4 is full scale.
        let full_scale = n / 4.0;
        self.spectrum[..TAP_FFT_SIZE / 2]
            .iter()
            .map(|c| {
                let mag = c.norm() / full_scale;
                if mag > 1e-5 { (20.0 * mag.log10()).max(SILENCE_DB) } else { SILENCE_DB }
            })
            .collect()
    }
}
