//! Raw sample hand-off between the capture thread and the demodulator
//!
//! Single producer, single consumer. Only raw audio crosses this boundary;
//! engine scratch buffers never leave the demodulation thread.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Lock-free sample queue, split once into its two ends
pub struct AudioRingBuffer {
    producer: HeapProducer<f64>,
    consumer: HeapConsumer<f64>,
}

impl AudioRingBuffer {
    /// Create a queue holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<f64>::new(capacity).split();
        Self { producer, consumer }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        (
            AudioProducer {
                producer: self.producer,
                dropped: 0,
            },
            AudioConsumer {
                consumer: self.consumer,
            },
        )
    }
}

/// Writing end, owned by the capture callback
pub struct AudioProducer {
    producer: HeapProducer<f64>,

    /// Samples discarded because the queue was full
    dropped: u64,
}

impl AudioProducer {
    /// Queue samples, discarding whatever does not fit
    ///
    /// # Returns
    /// Number of samples actually queued
    pub fn write(&mut self, samples: &[f64]) -> usize {
        let written = self.producer.push_slice(samples);

        if written < samples.len() {
            let lost = samples.len() - written;
            self.dropped += lost as u64;
            tracing::warn!(lost, total = self.dropped, "sample queue full, dropping samples");
        }

        written
    }

    /// Free slots left in the queue
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    /// Total samples discarded so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Reading end, owned by the demodulator
pub struct AudioConsumer {
    consumer: HeapConsumer<f64>,
}

impl AudioConsumer {
    /// Dequeue up to `buffer.len()` samples
    ///
    /// # Returns
    /// Number of samples read (0 if none are queued)
    pub fn read(&mut self, buffer: &mut [f64]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    /// Number of queued samples
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let (mut producer, mut consumer) = AudioRingBuffer::new(1024).split();

        let data = vec![0.25, -0.5, 1.0];
        assert_eq!(producer.write(&data), 3);
        assert_eq!(consumer.len(), 3);

        let mut output = vec![0.0; 8];
        assert_eq!(consumer.read(&mut output), 3);
        assert_eq!(&output[..3], &data[..]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_overflow_counts_dropped_samples() {
        let (mut producer, _consumer) = AudioRingBuffer::new(10).split();

        let written = producer.write(&[1.0; 25]);
        assert!(written <= 10);
        assert_eq!(producer.dropped(), (25 - written) as u64);
        assert_eq!(producer.free_len(), 10 - written);
    }

    #[test]
    fn test_read_from_empty() {
        let (_producer, mut consumer) = AudioRingBuffer::new(16).split();

        let mut output = [0.0; 4];
        assert_eq!(consumer.read(&mut output), 0);
    }
}
