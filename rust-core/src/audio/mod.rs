//! Sample delivery into the demodulator
//!
//! The engine reads audio only through [`SampleInput`]. [`MomentBuffer`] is
//! the stock implementation, fed from an [`AudioRingBuffer`] that a capture
//! callback (see the `capture` feature) or any other producer writes into.

#[cfg(feature = "capture")]
pub mod input;
pub mod buffer;
pub mod moment;
pub mod processor;

#[cfg(feature = "capture")]
pub use input::AudioInput;
pub use buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
pub use moment::{MomentBuffer, MOMENT_LEN};
pub use processor::{DemodHandle, DemodProcessor, DemodResults, ProcessorConfig};

/// Source of the raw audio the spectral engine analyzes
pub trait SampleInput {
    /// Sample rate in Hz, constant for the session
    fn sample_rate(&self) -> f64;

    /// Current processing time in seconds (monotonic)
    fn time(&self) -> f64;

    /// The most recent samples, oldest first, centered on "now"
    fn moment(&self) -> &[f64];
}

impl<T: SampleInput> SampleInput for &T {
    #[inline]
    fn sample_rate(&self) -> f64 {
        (**self).sample_rate()
    }

    #[inline]
    fn time(&self) -> f64 {
        (**self).time()
    }

    #[inline]
    fn moment(&self) -> &[f64] {
        (**self).moment()
    }
}
