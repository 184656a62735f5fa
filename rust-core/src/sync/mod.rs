//! Synchronization on known tone patterns

pub mod melody;

pub use melody::{find_melody, MelodyMatch, Tone, FREQ_MARGIN, VIS_HEADER};
