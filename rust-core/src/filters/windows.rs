//! Weighting windows for spectral analysis
//!
//! The demodulator picks one of a fixed set of windows per call, trading
//! frequency resolution against noise averaging.

use std::f64::consts::PI;

/// Dolph-Chebyshev window, 47 taps.
///
/// Hard-coded rather than derived: at high SNR it resolves the video tone
/// better than any Hann window short enough to follow pixel transitions.
pub const DOLPH_CHEBYSHEV_47: [f64; 47] = [
    0.0004272315, 0.0013212953, 0.0032312239, 0.0067664313, 0.0127521667, 0.0222058684,
    0.0363037629, 0.0563165400, 0.0835138389, 0.1190416120, 0.1637810511, 0.2182020094,
    0.2822270091, 0.3551233730, 0.4354402894, 0.5210045495, 0.6089834347, 0.6960162864,
    0.7784084484, 0.8523735326, 0.9143033652, 0.9610404797, 0.9901263448, 1.0000000000,
    0.9901263448, 0.9610404797, 0.9143033652, 0.8523735326, 0.7784084484, 0.6960162864,
    0.6089834347, 0.5210045495, 0.4354402894, 0.3551233730, 0.2822270091, 0.2182020094,
    0.1637810511, 0.1190416120, 0.0835138389, 0.0563165400, 0.0363037629, 0.0222058684,
    0.0127521667, 0.0067664313, 0.0032312239, 0.0013212953, 0.0004272315,
];

/// Window function shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/N)
    Hann,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/N) + 0.08*cos(4πn/N)
    Blackman,

    /// Rectangular window (no weighting)
    Rectangular,
}

/// The windows the spectral engine can be asked to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Hann95,
    Hann127,
    Hann255,
    Hann511,
    Hann1023,
    Hann2047,
    Cheb47,
}

impl WindowKind {
    /// Every kind, shortest Hann first
    pub const ALL: [WindowKind; 7] = [
        WindowKind::Hann95,
        WindowKind::Hann127,
        WindowKind::Hann255,
        WindowKind::Hann511,
        WindowKind::Hann1023,
        WindowKind::Hann2047,
        WindowKind::Cheb47,
    ];

    /// Number of taps
    pub fn len(&self) -> usize {
        match self {
            WindowKind::Hann95 => 95,
            WindowKind::Hann127 => 127,
            WindowKind::Hann255 => 255,
            WindowKind::Hann511 => 511,
            WindowKind::Hann1023 => 1023,
            WindowKind::Hann2047 => 2047,
            WindowKind::Cheb47 => DOLPH_CHEBYSHEV_47.len(),
        }
    }

    /// Generate the window coefficients
    pub fn generate(&self) -> Vec<f64> {
        match self {
            WindowKind::Cheb47 => DOLPH_CHEBYSHEV_47.to_vec(),
            hann => generate_window(WindowType::Hann, hann.len()),
        }
    }
}

/// Generate window coefficients
///
/// # Arguments
/// * `window_type` - Shape of the window
/// * `length` - Number of samples (N)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..N-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    let n_total = length as f64;

    match window_type {
        WindowType::Hann => (0..length)
            .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f64 / n_total).cos()))
            .collect(),

        WindowType::Blackman => (0..length)
            .map(|n| {
                let angle = 2.0 * PI * n as f64 / n_total;
                0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos()
            })
            .collect(),

        WindowType::Rectangular => vec![1.0; length],
    }
}
