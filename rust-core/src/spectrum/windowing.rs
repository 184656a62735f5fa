//! Window cache for the spectral engine
//!
//! Every [`WindowKind`] is generated once when the engine is built and reused
//! for the life of the process.

use crate::filters::windows::WindowKind;

/// Pre-generated coefficients for every window kind
#[derive(Debug, Clone)]
pub struct WindowBank {
    windows: Vec<Vec<f64>>,
}

impl WindowBank {
    /// Generate all windows
    pub fn new() -> Self {
        Self {
            windows: WindowKind::ALL.iter().map(WindowKind::generate).collect(),
        }
    }

    /// Coefficients for `kind`
    #[inline]
    pub fn get(&self, kind: WindowKind) -> &[f64] {
        &self.windows[Self::slot(kind)]
    }

    /// Longest window held
    pub fn max_len(&self) -> usize {
        self.windows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn slot(kind: WindowKind) -> usize {
        match kind {
            WindowKind::Hann95 => 0,
            WindowKind::Hann127 => 1,
            WindowKind::Hann255 => 2,
            WindowKind::Hann511 => 3,
            WindowKind::Hann1023 => 4,
            WindowKind::Hann2047 => 5,
            WindowKind::Cheb47 => 6,
        }
    }
}

impl Default for WindowBank {
    fn default() -> Self {
        Self::new()
    }
}
