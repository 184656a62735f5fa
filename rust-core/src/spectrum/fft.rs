//! Down-mixing, decimating, windowed FFT over one moment of audio
//!
//! Owns the transform scratch buffers. Every call overwrites them completely;
//! nothing carries over between calls.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Transform length used by the spectral engine
pub const FFT_LEN: usize = 2048;

/// Complex FFT with reusable buffers
pub struct FftEngine {
    /// Largest transform the buffers can hold
    capacity: usize,

    /// Plan for the last transform length
    fft: Arc<dyn Fft<f64>>,

    /// Transform input, transformed in place
    buffer: Vec<Complex<f64>>,

    /// Scratch space for the transform
    scratch: Vec<Complex<f64>>,

    /// |X[k]| of the last transform
    magnitudes: Vec<f64>,

    /// Length of the last transform
    last_len: usize,
}

impl FftEngine {
    /// Create an engine able to run transforms of up to `capacity` points
    pub fn new(capacity: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(capacity);

        Self {
            capacity,
            buffer: vec![Complex::new(0.0, 0.0); capacity],
            scratch: vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()],
            fft,
            magnitudes: vec![0.0; capacity],
            last_len: capacity,
        }
    }

    /// Transform one moment of real samples
    ///
    /// Each sample is mixed down by a local oscillator whose phase advances by
    /// `phase_step` radians per sample. The window is centered on the moment;
    /// of the samples it covers, every `decimation`-th (by window index) is
    /// weighted and written to `window_index / decimation`.
    ///
    /// # Panics
    /// If `fft_len` exceeds the capacity, or `window.len() / decimation`
    /// exceeds `fft_len`.
    pub fn transform_moment(
        &mut self,
        moment: &[f64],
        window: &[f64],
        phase_step: f64,
        decimation: usize,
        fft_len: usize,
    ) {
        assert!(decimation > 0, "decimation ratio must be at least 1");
        assert!(
            fft_len <= self.capacity,
            "transform length {fft_len} exceeds buffer capacity {}",
            self.capacity
        );
        assert!(
            window.len() / decimation <= fft_len,
            "window of {} taps decimated by {decimation} does not fit a {fft_len}-point transform",
            window.len()
        );

        let buffer = &mut self.buffer[..fft_len];
        buffer.fill(Complex::new(0.0, 0.0));

        let half_moment = moment.len() / 2;
        let half_window = window.len() / 2;

        let mut phase = 0.0;
        for (i, &sample) in moment.iter().enumerate() {
            let window_index = (i + half_window)
                .checked_sub(half_moment)
                .filter(|&w| w < window.len() && w % decimation == 0);

            if let Some(w) = window_index {
                buffer[w / decimation] = Complex::from_polar(sample, phase) * window[w];
            }

            phase += phase_step;
        }

        if fft_len != self.last_len {
            self.fft = FftPlanner::<f64>::new().plan_fft_forward(fft_len);
            let scratch_len = self.fft.get_inplace_scratch_len();
            if self.scratch.len() < scratch_len {
                self.scratch.resize(scratch_len, Complex::new(0.0, 0.0));
            }
        }
        let scratch_len = self.fft.get_inplace_scratch_len();
        self.fft.process_with_scratch(buffer, &mut self.scratch[..scratch_len]);

        for (magnitude, coefficient) in self.magnitudes.iter_mut().zip(buffer.iter()) {
            *magnitude = coefficient.norm();
        }
        self.last_len = fft_len;
    }

    /// Complex spectrum of the last transform
    pub fn spectrum(&self) -> &[Complex<f64>] {
        &self.buffer[..self.last_len]
    }

    /// Magnitude spectrum of the last transform
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes[..self.last_len]
    }

    /// Largest supported transform length
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn peak_bin(magnitudes: &[f64]) -> usize {
        magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_dc_without_mixing() {
        let mut fft = FftEngine::new(256);
        let moment = vec![1.0; 255];
        let window = vec![1.0; 255];

        fft.transform_moment(&moment, &window, 0.0, 1, 256);

        let magnitudes = fft.magnitudes();
        assert_eq!(magnitudes.len(), 256);
        assert_eq!(peak_bin(magnitudes), 0);
        assert!((magnitudes[0] - 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixing_moves_tone_to_baseband() {
        let sample_rate = 8000.0;
        let tone = 1000.0;
        let moment: Vec<f64> = (0..511)
            .map(|n| (2.0 * PI * tone * n as f64 / sample_rate).cos())
            .collect();
        let window = vec![1.0; 511];

        let mut fft = FftEngine::new(512);
        fft.transform_moment(&moment, &window, 0.0, 1, 512);
        assert!(fft.magnitudes()[64] > 200.0);

        // Mixing down by the tone frequency lands it on DC
        fft.transform_moment(&moment, &window, -2.0 * PI * tone / sample_rate, 1, 512);
        assert!(fft.magnitudes()[0] > 200.0);
        assert!(fft.magnitudes()[64] < 10.0);
    }

    #[test]
    fn test_decimation_and_centering() {
        let mut fft = FftEngine::new(64);
        let moment = vec![1.0; 101];
        let window = vec![1.0; 21];

        fft.transform_moment(&moment, &window, 0.0, 4, 64);

        // Window indices 0, 4, .., 20 survive decimation
        assert!((fft.magnitudes()[0] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_buffers_fully_overwritten() {
        let mut fft = FftEngine::new(128);
        let window = vec![1.0; 63];

        fft.transform_moment(&vec![1.0; 127], &window, 0.0, 1, 128);
        fft.transform_moment(&vec![0.0; 127], &window, 0.0, 1, 128);

        assert!(fft.magnitudes().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_shorter_transform() {
        let mut fft = FftEngine::new(256);
        fft.transform_moment(&vec![1.0; 63], &vec![1.0; 63], 0.0, 1, 64);
        assert_eq!(fft.spectrum().len(), 64);
        assert_eq!(fft.magnitudes().len(), 64);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_oversized_window_panics() {
        let mut fft = FftEngine::new(64);
        fft.transform_moment(&vec![0.0; 255], &vec![1.0; 255], 0.0, 2, 64);
    }
}
