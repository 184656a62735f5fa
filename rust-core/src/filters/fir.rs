//! Direct-form convolution and kernel-based upsampling
//!
//! Whole-buffer operations on demodulated waveforms; not meant for the
//! per-sample audio path.

use super::design::KernelKind;

/// Convolve `signal` with a centered, odd-length `kernel`
///
/// The output has the same length as `signal`. Without `wrap_around`, taps
/// that fall outside the output are dropped (implicit zero padding); with it,
/// they are folded back modulo the output length.
///
/// # Panics
/// If `kernel` has even length.
pub fn convolve(signal: &[f64], kernel: &[f64], wrap_around: bool) -> Vec<f64> {
    assert!(kernel.len() % 2 == 1, "convolution kernel must have odd length");

    let len = signal.len();
    let mut result = vec![0.0; len];
    if len == 0 {
        return result;
    }

    let half = (kernel.len() / 2) as isize;

    for (i, &sample) in signal.iter().enumerate() {
        for (k, &coeff) in kernel.iter().enumerate() {
            let target = i as isize - half + k as isize;

            if wrap_around {
                result[target.rem_euclid(len as isize) as usize] += sample * coeff;
            } else if target >= 0 && (target as usize) < len {
                result[target as usize] += sample * coeff;
            }
        }
    }

    result
}

/// Upsample by an integer `factor` using an interpolation kernel
///
/// The input is zero-stuffed at the new rate with its first and last samples
/// replicated past each end, convolved with the kernel, and trimmed by
/// `factor / 2` on both sides.
///
/// # Panics
/// If `factor` is zero.
pub fn upsample(signal: &[f64], factor: usize, kernel_kind: KernelKind) -> Vec<f64> {
    assert!(factor > 0, "upsampling factor must be at least 1");

    let (Some(&first), Some(&last)) = (signal.first(), signal.last()) else {
        return Vec::new();
    };

    let kernel = kernel_kind.design(factor);

    let mut padded = Vec::with_capacity((signal.len() + 1) * factor + 1);
    padded.push(first);
    padded.extend(std::iter::repeat(0.0).take(factor - 1));
    for &sample in signal {
        padded.push(sample);
        padded.extend(std::iter::repeat(0.0).take(factor - 1));
    }
    padded.push(last);

    let filtered = convolve(&padded, &kernel, false);

    let trim = factor / 2;
    filtered[trim..filtered.len() - trim].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kernel() {
        let signal = vec![1.0, -2.0, 3.5, 0.0, 7.25];
        let kernel = [0.0, 0.0, 1.0, 0.0, 0.0];

        assert_eq!(convolve(&signal, &kernel, false), signal);
        assert_eq!(convolve(&signal, &kernel, true), signal);
    }

    #[test]
    fn test_zero_padding_vs_wrap() {
        let signal = vec![1.0, 0.0, 0.0, 0.0];
        let kernel = [1.0, 1.0, 1.0];

        // The tap before index 0 is dropped
        assert_eq!(convolve(&signal, &kernel, false), vec![1.0, 1.0, 0.0, 0.0]);

        // ... or lands on the last index
        assert_eq!(convolve(&signal, &kernel, true), vec![1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    #[should_panic(expected = "odd length")]
    fn test_even_kernel_panics() {
        convolve(&[1.0, 2.0], &[0.5, 0.5], false);
    }

    #[test]
    fn test_upsample_constant() {
        let upsampled = upsample(&[1.0, 1.0, 1.0, 1.0], 2, KernelKind::Tent);

        assert_eq!(upsampled.len(), 9);
        for value in upsampled {
            assert!((value - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_upsample_tent_interpolates_linearly() {
        let upsampled = upsample(&[0.0, 1.0, 2.0, 3.0], 2, KernelKind::Tent);

        // Original samples land on odd indices
        assert!((upsampled[1] - 0.0).abs() < 1e-12);
        assert!((upsampled[3] - 1.0).abs() < 1e-12);
        assert!((upsampled[5] - 2.0).abs() < 1e-12);
        assert!((upsampled[7] - 3.0).abs() < 1e-12);

        // Midpoints are averages
        assert!((upsampled[4] - 1.5).abs() < 1e-12);
        assert!((upsampled[6] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_upsample_lanczos_preserves_samples() {
        let signal = [0.0, 1.0, 0.5, -0.25, 0.75, 0.0];
        let factor = 4;
        let upsampled = upsample(&signal, factor, KernelKind::Lanczos3);

        // Lanczos is interpolating: original samples pass through unchanged
        let offset = factor - factor / 2;
        for (i, &s) in signal.iter().enumerate() {
            assert!((upsampled[offset + i * factor] - s).abs() < 1e-9);
        }
    }

    #[test]
    fn test_upsample_empty() {
        assert!(upsample(&[], 3, KernelKind::Lanczos2).is_empty());
    }
}
