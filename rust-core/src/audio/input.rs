//! Live audio capture using cpal
//!
//! Only compiled with the `capture` feature. The device callback is a plain
//! closure that owns the producer end of the sample queue.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use super::buffer::AudioProducer;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),
}

/// Audio input device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Running capture stream feeding an [`AudioProducer`]
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioInput {
    /// Capture from the host's default input device
    pub fn from_default_device(producer: AudioProducer) -> Result<Self, AudioError> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(AudioError::NoDevice)?;

        Self::from_device(device, producer)
    }

    /// Capture from a specific device
    ///
    /// Multi-channel frames are averaged down to mono before queueing. The
    /// device's native rate is kept; read it back from [`device_info`](Self::device_info)
    /// to configure the moment buffer.
    pub fn from_device(device: Device, mut producer: AudioProducer) -> Result<Self, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let device_info = AudioDeviceInfo {
            name,
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };
        tracing::debug!(?device_info, "opening capture device");

        let channels = usize::from(device_info.channels.max(1));
        let stream_config: StreamConfig = config.into();
        let mut mono = Vec::new();

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    mono.clear();
                    mono.extend(data.chunks(channels).map(|frame| {
                        frame.iter().map(|&s| f64::from(s)).sum::<f64>() / frame.len() as f64
                    }));
                    producer.write(&mono);
                },
                move |error| {
                    tracing::warn!(%error, "audio input stream error");
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio capture
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}
