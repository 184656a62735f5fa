//! Interpolation kernel design
//!
//! Kernels used by [`upsample`](super::fir::upsample) to reconstruct a
//! waveform between its original sample positions.

use std::f64::consts::PI;

/// Interpolation kernel families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    /// Lanczos kernel with a = 2
    Lanczos2,

    /// Lanczos kernel with a = 3
    Lanczos3,

    /// Triangular kernel (linear interpolation)
    Tent,
}

impl KernelKind {
    /// Build the kernel for upsampling by `factor`
    ///
    /// Kernel length grows with `factor` so its zero crossings land on the
    /// original sample grid.
    pub fn design(&self, factor: usize) -> Vec<f64> {
        match self {
            KernelKind::Lanczos2 => lanczos_kernel(factor * 2 * 2 + 1, 2),
            KernelKind::Lanczos3 => lanczos_kernel(factor * 3 * 2 + 1, 3),
            KernelKind::Tent => tent_kernel(factor * 2 + 1),
        }
    }
}

/// Normalized sinc: sin(πx)/(πx)
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Lanczos kernel spanning [-a, a] in `kernel_len` taps
///
/// # Arguments
/// * `kernel_len` - Number of taps (odd, >= 3)
/// * `a` - Number of lobes on each side
pub fn lanczos_kernel(kernel_len: usize, a: usize) -> Vec<f64> {
    let span = (kernel_len - 1) as f64;

    (0..kernel_len)
        .map(|i| {
            let x_kernel = (i as f64 / span - 0.5) * 2.0 * a as f64;
            let x_window = 2.0 * i as f64 / span - 1.0;
            sinc(x_kernel) * sinc(x_window)
        })
        .collect()
}

/// Triangular kernel peaking at 1.0 in the center, 0.0 at both ends
pub fn tent_kernel(kernel_len: usize) -> Vec<f64> {
    let span = (kernel_len - 1) as f64;

    (0..kernel_len)
        .map(|i| 1.0 - 2.0 * (i as f64 / span - 0.5).abs())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sinc() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-12);
        assert!(sinc(-2.0).abs() < 1e-12);
    }

    #[test]
    fn test_lanczos_zero_crossings() {
        let factor = 4;
        let kernel = KernelKind::Lanczos2.design(factor);
        assert_eq!(kernel.len(), 17);

        let center = kernel.len() / 2;
        assert!((kernel[center] - 1.0).abs() < 1e-12);

        // Zero at every original-sample offset away from the center
        for k in 1..=2 {
            assert!(kernel[center + k * factor].abs() < 1e-12);
            assert!(kernel[center - k * factor].abs() < 1e-12);
        }
    }

    #[test]
    fn test_tent() {
        let kernel = KernelKind::Tent.design(2);
        let expected = [0.0, 0.5, 1.0, 0.5, 0.0];

        assert_eq!(kernel.len(), expected.len());
        for (k, e) in kernel.iter().zip(expected.iter()) {
            assert!((k - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lanczos3_length() {
        assert_eq!(KernelKind::Lanczos3.design(3).len(), 19);
    }
}
