//! Demodulation pipeline - keeps the engine on one thread
//!
//! Raw samples arrive through the ring buffer; the processor owns the moment
//! buffer and the spectral engine, so the transform scratch buffers are never
//! shared. Only the derived scalars in [`DemodResults`] leave the worker.

use super::buffer::AudioConsumer;
use super::moment::MomentBuffer;
use super::SampleInput;
use crate::filters::windows::WindowKind;
use crate::modes::SstvMode;
use crate::spectrum::{best_window_for, ConfigError, EngineConfig, SpectralEngine, ASSUMED_SNR_DB};
use crate::sync::{find_melody, MelodyMatch, Tone, VIS_HEADER};
use crate::tones::{FREQ_MAX, FREQ_MIN};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Largest header frequency offset searched for, in Hz
const MAX_HEADER_SHIFT: f64 = 250.0;

/// Window for the wideband frequency estimate
const TRACKING_WINDOW: WindowKind = WindowKind::Hann1023;

/// Processor configuration
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Mode being received; picks the video window
    pub mode: SstvMode,

    /// Choose the video window from the live SNR
    pub adaptive: bool,

    /// Source time between demodulated samples, in seconds
    pub hop_interval: f64,

    /// Look for the calibration header in the tracked frequency
    pub detect_header: bool,

    pub engine: EngineConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            mode: SstvMode::Scottie1,
            adaptive: true,
            hop_interval: 1e-3,
            detect_header: true,
            engine: EngineConfig::default(),
        }
    }
}

/// One demodulated sample
#[derive(Debug, Clone, PartialEq)]
pub struct DemodResults {
    /// Source time, in seconds
    pub time: f64,

    /// Luminance, 0 (black) to 255 (white)
    pub video_level: u8,

    /// Strongest frequency between FREQ_MIN and FREQ_MAX, in Hz
    pub freq: f64,

    /// Video SNR in dB
    pub snr: f64,

    /// Sync tone power relative to the video band
    pub sync_power: f64,

    /// Window used for the video level
    pub window: WindowKind,

    /// Calibration header ending at this sample, if any
    pub header: Option<MelodyMatch>,
}

/// Single-threaded demodulator fed from a ring buffer
pub struct DemodProcessor {
    engine: SpectralEngine<MomentBuffer>,

    consumer: AudioConsumer,

    mode: SstvMode,

    adaptive: bool,

    /// Samples per demodulated output
    hop: usize,

    /// Samples still to consume before the next output
    until_next: usize,

    /// Transfer buffer, one hop long
    scratch: Vec<f64>,

    /// Recent tracked frequencies, one per hop, oldest first
    history: Option<VecDeque<f64>>,

    /// Entries kept in `history`; enough to hold the header
    history_len: usize,

    /// Seconds per history entry
    dt: f64,
}

impl DemodProcessor {
    /// Create a processor reading `sample_rate` Hz audio from `consumer`
    pub fn new(
        consumer: AudioConsumer,
        sample_rate: f64,
        config: ProcessorConfig,
    ) -> Result<Self, ConfigError> {
        if !(config.hop_interval > 0.0) {
            return Err(ConfigError::InvalidHopInterval(config.hop_interval));
        }

        let engine = SpectralEngine::new(MomentBuffer::new(sample_rate), config.engine)?;
        let hop = ((config.hop_interval * sample_rate).round() as usize).max(1);
        let dt = hop as f64 / sample_rate;

        let history_len = (melody_duration(&VIS_HEADER) / dt).round() as usize + 1;
        let history = config
            .detect_header
            .then(|| VecDeque::with_capacity(history_len));

        tracing::debug!(mode = %config.mode, hop, adaptive = config.adaptive, "processor ready");

        Ok(Self {
            engine,
            consumer,
            mode: config.mode,
            adaptive: config.adaptive,
            hop,
            until_next: hop,
            scratch: vec![0.0; hop],
            history,
            history_len,
            dt,
        })
    }

    pub fn engine(&self) -> &SpectralEngine<MomentBuffer> {
        &self.engine
    }

    /// Engine access for corrections (fshift, sync window) between calls
    pub fn engine_mut(&mut self) -> &mut SpectralEngine<MomentBuffer> {
        &mut self.engine
    }

    pub fn set_mode(&mut self, mode: SstvMode) {
        tracing::debug!(%mode, "mode set");
        self.mode = mode;
    }

    /// Samples per demodulated output
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Consume everything queued, demodulating once per hop
    ///
    /// Nothing is produced until a full moment of audio has arrived.
    pub fn process_available(&mut self) -> Vec<DemodResults> {
        let mut results = Vec::new();

        loop {
            let n = self.consumer.read(&mut self.scratch[..self.until_next]);
            if n == 0 {
                break;
            }

            self.engine.input_mut().push_slice(&self.scratch[..n]);
            self.until_next -= n;

            if self.until_next == 0 {
                self.until_next = self.hop;
                if self.engine.input().is_primed() {
                    results.push(self.demodulate());
                }
            }
        }

        results
    }

    fn demodulate(&mut self) -> DemodResults {
        let snr = if self.adaptive {
            self.engine.calc_video_snr()
        } else {
            ASSUMED_SNR_DB
        };
        let window = best_window_for(self.mode, snr);
        let video_level = self.engine.calc_video_level(self.mode, self.adaptive);
        let sync_power = self.engine.calc_sync_power();
        let freq = self.engine.calc_peak_freq(FREQ_MIN, FREQ_MAX, TRACKING_WINDOW);

        let header = self.history.as_mut().and_then(|history| {
            if history.len() == self.history_len {
                history.pop_front();
            }
            history.push_back(freq);

            let wave = history.make_contiguous();
            find_melody(wave, &VIS_HEADER, self.dt, -MAX_HEADER_SHIFT, MAX_HEADER_SHIFT)
        });

        DemodResults {
            time: self.engine.input().time(),
            video_level,
            freq,
            snr,
            sync_power,
            window,
            header,
        }
    }

    /// Run on a worker thread until the handle is stopped or dropped
    pub fn spawn(self) -> DemodHandle {
        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));

        let thread = {
            let latest = Arc::clone(&latest);
            let running = Arc::clone(&running);
            let mut processor = self;

            std::thread::spawn(move || {
                tracing::info!(hop = processor.hop, "demodulator started");

                while running.load(Ordering::SeqCst) {
                    let results = processor.process_available();

                    match results.into_iter().last() {
                        Some(last) => {
                            if let Ok(mut guard) = latest.lock() {
                                *guard = Some(last);
                            }
                        }
                        // Nothing queued; 100µs keeps latency low without spinning
                        None => std::thread::sleep(Duration::from_micros(100)),
                    }
                }

                tracing::info!("demodulator stopped");
            })
        };

        DemodHandle {
            latest,
            running,
            thread: Some(thread),
        }
    }
}

fn melody_duration(melody: &[Tone]) -> f64 {
    melody.iter().map(|tone| tone.dur).sum()
}

/// Handle to a demodulator running on its own thread
pub struct DemodHandle {
    latest: Arc<Mutex<Option<DemodResults>>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DemodHandle {
    /// Take the most recent result, if one arrived since the last call
    pub fn latest(&self) -> Option<DemodResults> {
        self.latest.lock().ok().and_then(|mut guard| guard.take())
    }

    /// Whether the worker is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the worker and wait for it to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DemodHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
