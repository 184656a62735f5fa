//! Spectral demodulation engine
//!
//! Turns the current moment of audio into an instantaneous frequency estimate
//! and a handful of quality metrics (band power, video SNR, sync power).
//!
//! The engine owns its transform buffers and recomputes them in place on
//! every query, so it is `&mut self` throughout. Callers on different threads
//! must serialize access themselves (one mutex around the engine), or hand
//! only the derived scalars across threads; see
//! [`DemodProcessor`](crate::audio::DemodProcessor).

use super::fft::{FftEngine, FFT_LEN};
use super::peaks::gaussian_peak;
use super::windowing::WindowBank;
use crate::audio::SampleInput;
use crate::filters::windows::WindowKind;
use crate::modes::SstvMode;
use crate::tones::{FREQ_BLACK, FREQ_LEADER, FREQ_SYNC, FREQ_WHITE};
use num_complex::Complex;
use std::f64::consts::PI;
use thiserror::Error;

/// Reported video SNR when the signal is absent or buried
pub const SNR_FLOOR_DB: f64 = -20.0;

/// Reported sync power when it cannot be compared to the video band
pub const SYNC_POWER_SATURATED: f64 = 2.0;

/// SNR assumed when window selection is not adaptive
pub const ASSUMED_SNR_DB: f64 = 99.0;

/// Minimum SNR for the Dolph-Chebyshev window
const CHEBYSHEV_MIN_SNR_DB: f64 = 23.0;

/// Hann window choice by SNR: inclusive lower bounds, highest first
const HANN_BY_SNR: [(f64, WindowKind); 4] = [
    (12.0, WindowKind::Hann95),
    (8.0, WindowKind::Hann127),
    (5.0, WindowKind::Hann255),
    (4.0, WindowKind::Hann511),
];

/// Window used below every threshold
const FALLBACK_WINDOW: WindowKind = WindowKind::Hann1023;

/// Window used for SNR estimation
const SNR_WINDOW: WindowKind = WindowKind::Hann2047;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("decimation ratio must be at least 1")]
    ZeroDecimation,

    #[error("transform length must be non-zero")]
    ZeroFftLength,

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    #[error("{window:?} ({taps} taps) decimated by {decimation} does not fit a {fft_len}-point transform")]
    WindowTooLong {
        window: WindowKind,
        taps: usize,
        decimation: usize,
        fft_len: usize,
    },

    #[error("SNR refresh interval must be positive, got {0} s")]
    InvalidRefreshInterval(f64),

    #[error("hop interval must be positive, got {0} s")]
    InvalidHopInterval(f64),
}

/// Spectral engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Transform length
    pub fft_len: usize,

    /// Keep every n-th down-mixed sample
    pub decimation: usize,

    /// Frequency mixed down to DC, in Hz
    pub intermediate_freq: f64,

    /// Window used for sync power
    pub sync_window: WindowKind,

    /// Minimum source time between SNR recomputations, in seconds
    pub snr_refresh_interval: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fft_len: FFT_LEN,
            decimation: 4,
            intermediate_freq: FREQ_LEADER,
            sync_window: WindowKind::Hann511,
            snr_refresh_interval: 50e-3,
        }
    }
}

impl EngineConfig {
    /// Check the configuration against a sample rate
    ///
    /// Every window kind must fit the transform after decimation, since any of
    /// them may be selected at run time.
    pub fn validate(&self, sample_rate: f64) -> Result<(), ConfigError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if self.decimation == 0 {
            return Err(ConfigError::ZeroDecimation);
        }
        if self.fft_len == 0 {
            return Err(ConfigError::ZeroFftLength);
        }
        if !(self.snr_refresh_interval > 0.0) {
            return Err(ConfigError::InvalidRefreshInterval(self.snr_refresh_interval));
        }

        for window in WindowKind::ALL {
            if window.len() / self.decimation > self.fft_len {
                return Err(ConfigError::WindowTooLong {
                    window,
                    taps: window.len(),
                    decimation: self.decimation,
                    fft_len: self.fft_len,
                });
            }
        }

        Ok(())
    }
}

/// Closed frequency interval in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Pick the analysis window for a mode at a given SNR
///
/// Higher SNR gets shorter windows (better time resolution, the video tone
/// changes every pixel), ending at the Dolph-Chebyshev window; lower SNR gets
/// longer ones that average out more noise.
pub fn best_window_for(mode: SstvMode, snr: f64) -> WindowKind {
    if snr >= CHEBYSHEV_MIN_SNR_DB && mode.allows_chebyshev_window() {
        return WindowKind::Cheb47;
    }

    HANN_BY_SNR
        .iter()
        .find(|(threshold, _)| snr >= *threshold)
        .map(|&(_, window)| window)
        .unwrap_or(FALLBACK_WINDOW)
}

/// Map a video tone frequency to an 8-bit luminance
pub fn to_luminance(freq: f64) -> u8 {
    let level = ((freq - FREQ_BLACK) / (FREQ_WHITE - FREQ_BLACK)).clamp(0.0, 1.0);
    (level * 255.0).round() as u8
}

/// FFT-based FM demodulator over a [`SampleInput`]
pub struct SpectralEngine<I> {
    config: EngineConfig,

    /// Audio source; read only
    input: I,

    windows: WindowBank,

    fft: FftEngine,

    /// Correction added to every peak frequency, in Hz
    fshift: f64,

    /// Last computed video SNR in dB
    snr: f64,

    /// Source time at which the SNR goes stale
    next_snr_time: f64,
}

impl<I: SampleInput> SpectralEngine<I> {
    /// Create an engine reading from `input`
    pub fn new(input: I, config: EngineConfig) -> Result<Self, ConfigError> {
        let sample_rate = input.sample_rate();
        config.validate(sample_rate)?;

        tracing::debug!(
            sample_rate,
            fft_len = config.fft_len,
            decimation = config.decimation,
            intermediate_freq = config.intermediate_freq,
            "spectral engine ready"
        );

        Ok(Self {
            fft: FftEngine::new(config.fft_len),
            windows: WindowBank::new(),
            config,
            input,
            fshift: 0.0,
            snr: SNR_FLOOR_DB,
            next_snr_time: 0.0,
        })
    }

    /// Create an engine with [`EngineConfig::default`]
    pub fn with_default_config(input: I) -> Result<Self, ConfigError> {
        Self::new(input, EngineConfig::default())
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn into_input(self) -> I {
        self.input
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set the frequency correction applied to peak frequencies and band edges
    pub fn set_fshift(&mut self, fshift: f64) {
        tracing::debug!(fshift, "frequency shift set");
        self.fshift = fshift;
    }

    pub fn fshift(&self) -> f64 {
        self.fshift
    }

    /// Change the decimation ratio
    ///
    /// Rejected (leaving the engine unchanged) if some window would no longer
    /// fit the transform.
    pub fn set_decimation(&mut self, decimation: usize) -> Result<(), ConfigError> {
        let config = EngineConfig {
            decimation,
            ..self.config.clone()
        };
        config.validate(self.input.sample_rate())?;

        tracing::debug!(decimation, "decimation set");
        self.config = config;
        Ok(())
    }

    /// Change the window used for sync power
    pub fn set_sync_window(&mut self, window: WindowKind) {
        tracing::debug!(?window, "sync window set");
        self.config.sync_window = window;
    }

    pub fn sync_window(&self) -> WindowKind {
        self.config.sync_window
    }

    /// Video SNR from the last recomputation, without refreshing it
    pub fn last_snr(&self) -> f64 {
        self.snr
    }

    /// Bin index for `freq`, truncated toward zero; negative below the IF
    pub fn freq_to_bin(&self, freq: f64, fft_len: usize) -> isize {
        ((freq - self.config.intermediate_freq) / self.input.sample_rate()
            * fft_len as f64
            * self.config.decimation as f64) as isize
    }

    /// Frequency in Hz at a (fractional, possibly negative) bin, without fshift
    pub fn bin_to_freq(&self, bin: f64, fft_len: usize) -> f64 {
        bin / (fft_len * self.config.decimation) as f64 * self.input.sample_rate()
            + self.config.intermediate_freq
    }

    /// Width of one bin in Hz
    pub fn bin_width(&self, fft_len: usize) -> f64 {
        self.input.sample_rate() / (fft_len * self.config.decimation) as f64
    }

    /// Window, down-mix, decimate and transform the current moment
    ///
    /// The result is available from [`spectrum`](Self::spectrum) and
    /// [`magnitudes`](Self::magnitudes) until the next call.
    ///
    /// # Panics
    /// If `fft_len` exceeds the configured transform length, or the window
    /// does not fit `fft_len` after decimation.
    pub fn calc_windowed_fft(&mut self, window: WindowKind, fft_len: usize) {
        let phase_step = 2.0 * PI * (-self.config.intermediate_freq) / self.input.sample_rate();

        self.fft.transform_moment(
            self.input.moment(),
            self.windows.get(window),
            phase_step,
            self.config.decimation,
            fft_len,
        );
    }

    /// Complex spectrum of the last transform
    pub fn spectrum(&self) -> &[Complex<f64>] {
        self.fft.spectrum()
    }

    /// Magnitude spectrum of the last transform
    pub fn magnitudes(&self) -> &[f64] {
        self.fft.magnitudes()
    }

    /// Strongest frequency in [min_freq, max_freq], refined between bins
    pub fn calc_peak_freq(&mut self, min_freq: f64, max_freq: f64, window: WindowKind) -> f64 {
        let fft_len = self.config.fft_len;
        self.calc_windowed_fft(window, fft_len);

        let lo = self.freq_to_bin(min_freq, fft_len);
        let hi = self.freq_to_bin(max_freq, fft_len);

        let magnitudes = self.fft.magnitudes();
        let at = |bin: isize| magnitudes[bin.rem_euclid(fft_len as isize) as usize];

        let mut peak_bin = lo;
        for bin in lo..=hi {
            if at(bin) > at(peak_bin) {
                peak_bin = bin;
            }
        }

        let refined = gaussian_peak(magnitudes, peak_bin, true);

        self.bin_to_freq(refined, fft_len) + self.fshift
    }

    /// Mean power per Hz in each band, in input order
    ///
    /// Band edges are shifted by the current fshift. Bands of zero or
    /// negative width report 0.0.
    pub fn calc_band_power_per_hz(&mut self, bands: &[Band], window: WindowKind) -> Vec<f64> {
        let fft_len = self.config.fft_len;
        self.calc_windowed_fft(window, fft_len);

        let bin_width = self.bin_width(fft_len);
        let spectrum = self.fft.spectrum();

        bands
            .iter()
            .map(|band| {
                if !(band.width() > 0.0) {
                    return 0.0;
                }

                let lo = self.freq_to_bin(band.lo + self.fshift, fft_len);
                let hi = self.freq_to_bin(band.hi + self.fshift, fft_len);

                let (power, bins) = (lo..=hi).fold((0.0, 0usize), |(power, bins), bin| {
                    let i = bin.rem_euclid(fft_len as isize) as usize;
                    (power + spectrum[i].norm_sqr(), bins + 1)
                });

                if bins == 0 {
                    0.0
                } else {
                    power / (bin_width * bins as f64)
                }
            })
            .collect()
    }

    /// Video SNR in dB
    ///
    /// Recomputed at most once per refresh interval of source time; in between
    /// the cached value is returned.
    pub fn calc_video_snr(&mut self) -> f64 {
        let t = self.input.time();

        if t >= self.next_snr_time {
            let bands = self.calc_band_power_per_hz(
                &[
                    Band::new(FREQ_SYNC - 1000.0, FREQ_SYNC - 200.0),
                    Band::new(FREQ_BLACK, FREQ_WHITE),
                    Band::new(FREQ_WHITE + 400.0, FREQ_WHITE + 700.0),
                ],
                SNR_WINDOW,
            );

            let video_plus_noise = bands[1];
            let noise = (bands[0] + bands[2]) / 2.0;
            let signal = video_plus_noise - noise;

            self.snr = if noise == 0.0 || signal / noise < 0.01 {
                SNR_FLOOR_DB
            } else {
                10.0 * (signal / noise).log10()
            };
            self.next_snr_time = t + self.config.snr_refresh_interval;

            tracing::trace!(t, video_plus_noise, noise, snr = self.snr, "video SNR");
        }

        self.snr
    }

    /// Sync tone power relative to the video band
    ///
    /// Saturates at [`SYNC_POWER_SATURATED`] when the video band is silent or
    /// the sync tone is more than four times as strong.
    pub fn calc_sync_power(&mut self) -> f64 {
        let bands = self.calc_band_power_per_hz(
            &[
                Band::new(FREQ_SYNC - 50.0, FREQ_SYNC + 50.0),
                Band::new(FREQ_BLACK, FREQ_WHITE),
            ],
            self.config.sync_window,
        );
        let (sync, video) = (bands[0], bands[1]);

        if video == 0.0 || sync > 4.0 * video {
            SYNC_POWER_SATURATED
        } else {
            sync / (2.0 * video)
        }
    }

    /// Luminance of the current moment
    ///
    /// With `is_adaptive`, the window is chosen from the live SNR; otherwise
    /// a clean signal is assumed.
    pub fn calc_video_level(&mut self, mode: SstvMode, is_adaptive: bool) -> u8 {
        let snr = if is_adaptive {
            self.calc_video_snr()
        } else {
            ASSUMED_SNR_DB
        };
        let window = best_window_for(mode, snr);
        tracing::trace!(%mode, snr, ?window, "video window");

        to_luminance(self.calc_peak_freq(FREQ_BLACK, FREQ_WHITE, window))
    }
}
