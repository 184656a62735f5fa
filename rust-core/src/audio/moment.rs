//! Sliding window of the most recent raw audio samples

use super::buffer::AudioConsumer;
use super::SampleInput;

/// Number of samples in one moment
///
/// Bounds the longest usable analysis window.
pub const MOMENT_LEN: usize = 2047;

/// Fixed-length sliding sample window
///
/// Stored twice back-to-back so the current moment is always one contiguous
/// slice, oldest sample first, no matter where the write head is.
#[derive(Debug, Clone)]
pub struct MomentBuffer {
    /// Mirrored storage, `2 * len` samples
    data: Vec<f64>,

    /// Moment length
    len: usize,

    /// Slot the next sample is written to; also the oldest sample
    head: usize,

    /// Sample rate in Hz
    sample_rate: f64,

    /// Total samples pushed since creation
    samples_consumed: u64,
}

impl MomentBuffer {
    /// Create a zero-filled buffer of [`MOMENT_LEN`] samples
    pub fn new(sample_rate: f64) -> Self {
        Self::with_len(sample_rate, MOMENT_LEN)
    }

    /// Create a zero-filled buffer of `len` samples
    pub fn with_len(sample_rate: f64, len: usize) -> Self {
        assert!(len > 0, "moment length must be non-zero");

        Self {
            data: vec![0.0; 2 * len],
            len,
            head: 0,
            sample_rate,
            samples_consumed: 0,
        }
    }

    /// Append one sample, dropping the oldest
    #[inline]
    pub fn push(&mut self, sample: f64) {
        self.data[self.head] = sample;
        self.data[self.head + self.len] = sample;
        self.head = (self.head + 1) % self.len;
        self.samples_consumed += 1;
    }

    /// Append a block of samples
    pub fn push_slice(&mut self, samples: &[f64]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// Drain whatever the consumer has available into the moment
    ///
    /// # Arguments
    /// * `consumer` - Ring buffer the samples come from
    /// * `scratch` - Transfer buffer; bounds how much is read per pass
    ///
    /// # Returns
    /// Number of samples consumed
    pub fn fill_from(&mut self, consumer: &mut AudioConsumer, scratch: &mut [f64]) -> usize {
        let mut total = 0;
        loop {
            let n = consumer.read(scratch);
            if n == 0 {
                break;
            }
            self.push_slice(&scratch[..n]);
            total += n;
        }
        total
    }

    /// Total samples pushed since creation
    pub fn samples_consumed(&self) -> u64 {
        self.samples_consumed
    }

    /// Whether a full moment of real samples has been pushed
    pub fn is_primed(&self) -> bool {
        self.samples_consumed >= self.len as u64
    }

    /// Moment length
    pub fn len(&self) -> usize {
        self.len
    }
}

impl SampleInput for MomentBuffer {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn time(&self) -> f64 {
        self.samples_consumed as f64 / self.sample_rate
    }

    fn moment(&self) -> &[f64] {
        &self.data[self.head..self.head + self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioRingBuffer;

    #[test]
    fn test_moment_order() {
        let mut buffer = MomentBuffer::with_len(1000.0, 4);

        buffer.push_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(buffer.moment(), &[0.0, 1.0, 2.0, 3.0]);

        buffer.push_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(buffer.moment(), &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_time_advances_with_samples() {
        let mut buffer = MomentBuffer::new(44100.0);
        assert_eq!(buffer.time(), 0.0);
        assert!(!buffer.is_primed());

        buffer.push_slice(&vec![0.0; 4410]);
        assert!((buffer.time() - 0.1).abs() < 1e-12);
        assert!(buffer.is_primed());
        assert_eq!(buffer.moment().len(), MOMENT_LEN);
    }

    #[test]
    fn test_fill_from_ring_buffer() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(64).split();
        let mut buffer = MomentBuffer::with_len(8000.0, 8);
        let mut scratch = [0.0; 5];

        let data: Vec<f64> = (1..=12).map(|x| x as f64).collect();
        assert_eq!(producer.write(&data), 12);

        assert_eq!(buffer.fill_from(&mut consumer, &mut scratch), 12);
        assert_eq!(buffer.moment(), &[5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        assert_eq!(buffer.samples_consumed(), 12);
    }
}
