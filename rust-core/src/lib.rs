//! SSTV Demod - Spectral FM Demodulation Core
//!
//! Turns SSTV audio into luminance samples and signal-quality metrics, and
//! locks onto known tone sequences (the calibration header) with unknown
//! frequency and time offset.
//!
//! The engine reads audio through [`audio::SampleInput`]; live capture from a
//! sound card is available with the `capture` feature.

pub mod audio;
pub mod filters;
pub mod modes;
pub mod spectrum;
pub mod sync;
pub mod tones;

pub use audio::{DemodProcessor, MomentBuffer, ProcessorConfig, SampleInput};
pub use filters::{WindowKind, WindowType};
pub use modes::SstvMode;
pub use spectrum::{ConfigError, EngineConfig, SpectralEngine};
pub use sync::{find_melody, MelodyMatch, Tone};
