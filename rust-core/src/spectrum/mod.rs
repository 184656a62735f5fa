//! Spectral FM demodulation

pub mod analysis;
pub mod fft;
pub mod peaks;
pub mod windowing;

pub use analysis::{
    best_window_for, to_luminance, Band, ConfigError, EngineConfig, SpectralEngine,
    ASSUMED_SNR_DB, SNR_FLOOR_DB, SYNC_POWER_SATURATED,
};
pub use fft::{FftEngine, FFT_LEN};
pub use peaks::{deriv, deriv_peaks, gaussian_peak, parabolic_offset, peaks};
pub use windowing::WindowBank;
