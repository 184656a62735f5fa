//! Tone-sequence matching against a demodulated frequency waveform
//!
//! A melody is matched backward from its last tone (the anchor), which the
//! caller has already found at the tail of the waveform. Matching is relative
//! to the anchor, so a constant frequency offset (mistuned receiver) does not
//! prevent detection; it is measured and reported instead.

use crate::spectrum::peaks::deriv_peaks;
use crate::tones::{FREQ_LEADER, FREQ_SYNC};

/// Largest tolerated error on any tone's frequency relative to the anchor, in Hz
pub const FREQ_MARGIN: f64 = 25.0;

/// One tone of a melody
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Frequency in Hz; 0.0 accepts any frequency
    pub freq: f64,

    /// Duration in seconds
    pub dur: f64,
}

impl Tone {
    pub const fn new(freq: f64, dur: f64) -> Self {
        Self { freq, dur }
    }

    /// A tone of any frequency
    pub const fn any(dur: f64) -> Self {
        Self { freq: 0.0, dur }
    }
}

/// Calibration header preceding the VIS code
pub const VIS_HEADER: [Tone; 4] = [
    Tone::new(FREQ_LEADER, 0.300),
    Tone::new(FREQ_SYNC, 0.010),
    Tone::new(FREQ_LEADER, 0.300),
    Tone::new(FREQ_SYNC, 0.030),
];

/// Where and how a melody was found
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodyMatch {
    /// Received minus nominal frequency, in Hz
    pub freq_shift: f64,

    /// Start of the melody relative to the last waveform sample, in seconds
    /// (negative: in the past)
    pub time_shift: f64,
}

/// Look for `melody` ending at the tail of `wave`
///
/// # Arguments
/// * `wave` - Instantaneous frequency in Hz, one sample every `dt` seconds
/// * `melody` - Reference tones in chronological order
/// * `dt` - Sample period of `wave`
/// * `min_shift`, `max_shift` - Accepted range of frequency shift, in Hz
///
/// # Returns
/// The measured shifts, or `None` if the melody is not present, the waveform
/// is too short to hold it, or the shift falls outside the accepted range
pub fn find_melody(
    wave: &[f64],
    melody: &[Tone],
    dt: f64,
    min_shift: f64,
    max_shift: f64,
) -> Option<MelodyMatch> {
    let (anchor, earlier) = melody.split_last()?;
    let n = wave.len();
    if n == 0 || !(dt > 0.0) {
        return None;
    }

    let total: f64 = melody.iter().map(|tone| tone.dur).sum();
    let start_at = n.checked_sub((total / dt).round() as usize)?;
    let last = wave[n - 1];

    // Coarse check, each tone against the anchor
    let mut lookback = anchor.dur;
    for (i, tone) in earlier.iter().enumerate().rev() {
        if tone.freq != 0.0 {
            let index = (n - 1).checked_sub((lookback / dt).round() as usize)?;

            let expected = tone.freq - anchor.freq;
            let observed = wave[index] - last;
            let error = observed - expected;

            if error.abs() >= FREQ_MARGIN {
                tracing::debug!(tone = i, expected, observed, error, "melody rejected");
                return None;
            }
        }
        lookback += tone.dur;
    }

    let freq_shift = median_shift(&wave[start_at..], melody, dt);
    if freq_shift < min_shift || freq_shift > max_shift {
        tracing::debug!(freq_shift, min_shift, max_shift, "melody shift out of range");
        return None;
    }

    let coarse = start_at as f64 * dt - (n - 1) as f64 * dt;
    let time_shift = coarse + edge_offset(&wave[start_at..], melody, dt).unwrap_or(0.0);

    tracing::debug!(freq_shift, time_shift, "melody found");

    Some(MelodyMatch {
        freq_shift,
        time_shift,
    })
}

/// Median difference between the received and the nominal tone frequencies
fn median_shift(wave: &[f64], melody: &[Tone], dt: f64) -> f64 {
    let mut tone = 0;
    let mut tone_end = melody[0].dur;
    let mut diffs = Vec::with_capacity(wave.len());

    for (i, &freq) in wave.iter().enumerate() {
        let t = i as f64 * dt;
        while t >= tone_end && tone + 1 < melody.len() {
            tone += 1;
            tone_end += melody[tone].dur;
        }

        if melody[tone].freq != 0.0 {
            diffs.push(freq - melody[tone].freq);
        }
    }

    if diffs.is_empty() {
        return 0.0;
    }

    diffs.sort_by(f64::total_cmp);
    diffs[diffs.len() / 2]
}

/// Mean offset, in seconds, of the received tone transitions from the nominal ones
///
/// `None` if the transitions found do not pair up with the melody's.
fn edge_offset(wave: &[f64], melody: &[Tone], dt: f64) -> Option<f64> {
    let edges = melody.len() - 1;
    if edges == 0 {
        return None;
    }

    let received = deriv_peaks(wave, edges);
    if received.len() != edges {
        return None;
    }

    let nominal = melody[..edges].iter().scan(0.0, |t, tone| {
        *t += tone.dur;
        Some(*t)
    });

    let total: f64 = received
        .iter()
        .zip(nominal)
        .map(|(&position, t)| position * dt - t)
        .sum();

    Some(total / edges as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1e-3;

    /// Waveform holding `padding` samples of 1500 Hz, then `melody` shifted by `shift`
    fn synthesize(melody: &[Tone], shift: f64, padding: usize) -> Vec<f64> {
        let mut wave = vec![1500.0; padding];
        for tone in melody {
            let samples = (tone.dur / DT).round() as usize;
            wave.extend(std::iter::repeat(tone.freq + shift).take(samples));
        }
        wave
    }

    fn three_tones() -> [Tone; 3] {
        [
            Tone::new(1900.0, 0.1),
            Tone::new(1200.0, 0.1),
            Tone::new(1900.0, 0.1),
        ]
    }

    #[test]
    fn test_finds_shifted_melody() {
        let melody = three_tones();
        let wave = synthesize(&melody, 30.0, 50);
        assert_eq!(wave.len(), 350);

        let found = find_melody(&wave, &melody, DT, -100.0, 100.0).unwrap();
        assert!((found.freq_shift - 30.0).abs() < 1e-9);

        // Melody starts at sample 50 of 350
        let expected = 50.0 * DT - 349.0 * DT;
        assert!((found.time_shift - expected).abs() <= DT, "got {}", found.time_shift);
    }

    #[test]
    fn test_wrong_melody_rejected() {
        let melody = three_tones();
        let wave = synthesize(
            &[
                Tone::new(1900.0, 0.1),
                Tone::new(1500.0, 0.1),
                Tone::new(1900.0, 0.1),
            ],
            0.0,
            50,
        );

        assert_eq!(find_melody(&wave, &melody, DT, -100.0, 100.0), None);
    }

    #[test]
    fn test_margin_is_exclusive() {
        let melody = three_tones();
        let mut wave = synthesize(&melody, 0.0, 50);

        // 1200 Hz tone received 24 Hz high: accepted
        wave[150..250].iter_mut().for_each(|f| *f = 1224.0);
        assert!(find_melody(&wave, &melody, DT, -100.0, 100.0).is_some());

        // 25 Hz high: rejected
        wave[150..250].iter_mut().for_each(|f| *f = 1225.0);
        assert!(find_melody(&wave, &melody, DT, -100.0, 100.0).is_none());
    }

    #[test]
    fn test_shift_out_of_range() {
        let melody = three_tones();
        let wave = synthesize(&melody, 30.0, 50);

        assert!(find_melody(&wave, &melody, DT, -20.0, 20.0).is_none());
        assert!(find_melody(&wave, &melody, DT, 30.0, 30.0).is_some());
    }

    #[test]
    fn test_short_wave() {
        let melody = three_tones();
        let wave = vec![1900.0; 200];

        assert_eq!(find_melody(&wave, &melody, DT, -100.0, 100.0), None);
        assert_eq!(find_melody(&[], &melody, DT, -100.0, 100.0), None);
    }

    #[test]
    fn test_empty_melody() {
        let wave = vec![1900.0; 200];
        assert_eq!(find_melody(&wave, &[], DT, -100.0, 100.0), None);
    }

    #[test]
    fn test_single_tone_uses_coarse_timing() {
        let wave = vec![1910.0; 200];
        let found = find_melody(&wave, &[Tone::new(1900.0, 0.1)], DT, -100.0, 100.0).unwrap();

        assert!((found.freq_shift - 10.0).abs() < 1e-9);
        assert!((found.time_shift - (100.0 * DT - 199.0 * DT)).abs() < 1e-9);
    }

    #[test]
    fn test_any_frequency_tone() {
        let melody = [
            Tone::new(1900.0, 0.1),
            Tone::any(0.1),
            Tone::new(1900.0, 0.1),
        ];
        let wave = synthesize(
            &[
                Tone::new(1900.0, 0.1),
                Tone::new(1700.0, 0.1),
                Tone::new(1900.0, 0.1),
            ],
            -12.0,
            20,
        );

        let found = find_melody(&wave, &melody, DT, -100.0, 100.0).unwrap();
        assert!((found.freq_shift + 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_vis_header() {
        let wave = synthesize(&VIS_HEADER, 15.0, 100);

        let found = find_melody(&wave, &VIS_HEADER, DT, -50.0, 50.0).unwrap();
        assert!((found.freq_shift - 15.0).abs() < 1e-9);

        let expected = 100.0 * DT - (wave.len() - 1) as f64 * DT;
        assert!((found.time_shift - expected).abs() <= DT, "got {}", found.time_shift);
    }
}
