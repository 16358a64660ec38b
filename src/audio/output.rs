// Audio output using cpal
// The stream runs for the lifetime of the line and pulls frames from it

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig, SupportedStreamConfig};
use tracing::{debug, error, info};

use super::clip::ClipLine;
use crate::error::{ClipError, Result};

/// Resolve the default output device, or the one whose name matches
pub fn find_device(name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();

    match name {
        None => host
            .default_output_device()
            .ok_or_else(|| ClipError::Device("No output device available".to_string())),
        Some(wanted) => {
            let devices = host
                .output_devices()
                .map_err(|e| ClipError::Device(format!("Failed to list output devices: {}", e)))?;
            for device in devices {
                if device.name().map(|n| n == wanted).unwrap_or(false) {
                    return Ok(device);
                }
            }
            Err(ClipError::Device(format!("Output device not found: {}", wanted)))
        }
    }
}

pub fn default_config(device: &Device) -> Result<SupportedStreamConfig> {
    device
        .default_output_config()
        .map_err(|e| ClipError::Device(format!("Failed to get default output config: {}", e)))
}

pub struct AudioOutput {
    _stream: Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Open an output stream on `device` that renders `line`
    pub fn open(device: &Device, config: SupportedStreamConfig, line: Arc<ClipLine>) -> Result<Self> {
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(device, &config.into(), line)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(device, &config.into(), line)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(device, &config.into(), line)?,
            format => {
                return Err(ClipError::Device(format!(
                    "Unsupported sample format: {:?}",
                    format
                )))
            }
        };

        stream
            .play()
            .map_err(|e| ClipError::Device(format!("Failed to start stream: {}", e)))?;

        info!(
            "Output stream started ({} ch @ {} Hz on {})",
            channels,
            sample_rate,
            device.name().unwrap_or_else(|_| "unknown device".to_string())
        );

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &Device,
        config: &StreamConfig,
        line: Arc<ClipLine>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;
        let mut scratch: Vec<f32> = Vec::new();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if scratch.len() < data.len() {
                        scratch.resize(data.len(), 0.0);
                    }
                    let buffer = &mut scratch[..data.len()];
                    line.render(buffer, channels);
                    for (out, &sample) in data.iter_mut().zip(buffer.iter()) {
                        *out = T::from_sample(sample);
                    }
                },
                move |err| {
                    error!("Audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| ClipError::Device(format!("Failed to build output stream: {}", e)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        debug!("Output stream released");
    }
}
