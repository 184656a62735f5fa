//! Peak picking and sub-sample peak refinement

/// Offset of the vertex of the parabola through (-1, y1), (0, y2), (1, y3)
///
/// Returns 0.0 when the three points are collinear.
#[inline]
pub fn parabolic_offset(y1: f64, y2: f64, y3: f64) -> f64 {
    let denominator = 2.0 * y2 - y3 - y1;
    if denominator != 0.0 {
        (y3 - y1) / (2.0 * denominator)
    } else {
        0.0
    }
}

/// Refine the position of a local maximum at `peak_index` to a fractional index
///
/// At the first and last index the missing neighbour is taken from the
/// opposite end when `wrap_around` is set, otherwise the interior neighbour
/// is reflected. With `wrap_around`, `peak_index` may be negative (counted
/// from the end) and the result stays on the same side of zero.
///
/// # Panics
/// If `signal` is empty, or `peak_index` is out of range without `wrap_around`.
pub fn gaussian_peak(signal: &[f64], peak_index: isize, wrap_around: bool) -> f64 {
    let len = signal.len();
    assert!(len > 0, "cannot refine a peak in an empty signal");
    if len == 1 {
        return peak_index as f64;
    }

    let index = if wrap_around {
        peak_index.rem_euclid(len as isize) as usize
    } else {
        assert!(
            peak_index >= 0 && (peak_index as usize) < len,
            "peak index {peak_index} out of range"
        );
        peak_index as usize
    };
    let last = len - 1;

    let (y1, y2, y3) = if index == 0 {
        (signal[if wrap_around { last } else { 1 }], signal[0], signal[1])
    } else if index == last {
        (signal[last - 1], signal[last], signal[if wrap_around { 0 } else { last - 1 }])
    } else {
        (signal[index - 1], signal[index], signal[index + 1])
    };

    peak_index as f64 + parabolic_offset(y1, y2, y3)
}

/// First backward difference; one sample shorter than the input
pub fn deriv(signal: &[f64]) -> Vec<f64> {
    signal.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Positions of the `n` strongest local maxima of |signal|
///
/// Each candidate is refined with [`gaussian_peak`]. Candidates are ranked by
/// absolute value; the survivors are returned in ascending position order.
pub fn peaks(signal: &[f64], n: usize) -> Vec<f64> {
    let len = signal.len();
    let mut candidates: Vec<(f64, f64)> = Vec::new();

    for i in 0..len {
        let y1 = if i == 0 { signal[0] } else { signal[i - 1] };
        let y2 = signal[i];
        let y3 = if i == len - 1 { signal[len - 1] } else { signal[i + 1] };

        if y2.abs() >= y1.abs() && y2.abs() >= y3.abs() {
            candidates.push((gaussian_peak(signal, i as isize, false), y2));
        }
    }

    candidates.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    let mut result: Vec<f64> = candidates
        .into_iter()
        .take(n)
        .map(|(position, _)| position)
        .collect();
    result.sort_by(f64::total_cmp);

    result
}

/// Positions of the `n` strongest edges (transitions) in `signal`
///
/// Peaks of the derivative sit between two samples; the +0.5 shift puts them
/// back on the original sample axis.
pub fn deriv_peaks(signal: &[f64], n: usize) -> Vec<f64> {
    peaks(&deriv(signal), n)
        .into_iter()
        .map(|position| position + 0.5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_peak_is_unrefined() {
        let signal = [0.0, 1.0, 3.0, 1.0, 0.0];
        assert_eq!(gaussian_peak(&signal, 2, false), 2.0);
    }

    #[test]
    fn test_asymmetric_peak() {
        // Parabola sampled at x = -1, 0, 1 with vertex at 0.25
        let f = |x: f64| -(x - 0.25).powi(2);
        let signal = [f(-1.0), f(0.0), f(1.0)];

        assert!((gaussian_peak(&signal, 1, false) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_flat_peak_is_unrefined() {
        let signal = [2.0, 2.0, 2.0];
        assert_eq!(gaussian_peak(&signal, 1, false), 1.0);
    }

    #[test]
    fn test_edges_reflect_without_wrap() {
        let signal = [5.0, 4.0, 0.0, 0.0, 9.0];

        // Reflected neighbour makes the edge look symmetric
        assert_eq!(gaussian_peak(&signal, 0, false), 0.0);
    }

    #[test]
    fn test_wrap_around_goes_negative() {
        // Peak straddles the end/start boundary, closer to the last index
        let signal = [3.0, 0.0, 0.0, 0.0, 4.0];

        let refined = gaussian_peak(&signal, 0, true);
        assert!(refined < 0.0);

        // Negative indices refer to the same bins
        let from_end = gaussian_peak(&signal, -1, true);
        assert!(from_end > -1.0 && from_end < 0.0);
    }

    #[test]
    fn test_deriv_of_constant() {
        let d = deriv(&[4.0; 10]);
        assert_eq!(d.len(), 9);
        assert!(d.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_deriv_empty() {
        assert!(deriv(&[]).is_empty());
        assert!(deriv(&[1.0]).is_empty());
    }

    #[test]
    fn test_peaks_sorted_by_position() {
        let signal = [0.0, 5.0, 0.0, 0.0, -9.0, 0.0, 0.0, 2.0, 0.0];
        let found = peaks(&signal, 2);

        // Strongest two by magnitude, reported left to right
        assert_eq!(found, vec![1.0, 4.0]);
    }

    #[test]
    fn test_deriv_peaks_locate_edges() {
        let mut signal = vec![0.0; 10];
        signal.extend(vec![1.0; 10]);
        signal.extend(vec![0.0; 10]);

        let edges = deriv_peaks(&signal, 2);
        assert_eq!(edges, vec![9.5, 19.5]);
    }
}
