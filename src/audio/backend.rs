// Platform audio service: turns a decoded clip into an open, device-ready line

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::clip::ClipLine;
use super::decoder::DecodedClip;
use super::gain::{GainControl, GainRange};
use super::output::{self, AudioOutput};
use super::resample::resample_clip;
use crate::error::{ClipError, Result};

/// Opens lines for decoded clips
pub trait AudioBackend {
    fn open_clip(&self, clip: DecodedClip, gain: GainRange) -> Result<ClipHandle>;
}

/// An open clip owned by exactly one player.
/// Dropping the handle closes the line and releases whatever drives it.
pub struct ClipHandle {
    line: Arc<ClipLine>,
    _output: Option<AudioOutput>,
    clock: Option<JoinHandle<()>>,
}

impl ClipHandle {
    pub fn line(&self) -> &Arc<ClipLine> {
        &self.line
    }
}

impl Drop for ClipHandle {
    fn drop(&mut self) {
        self.line.close();
        if let Some(clock) = self.clock.take() {
            if clock.join().is_err() {
                warn!("Headless clock thread panicked");
            }
        }
    }
}

/// Plays through a cpal output device
#[derive(Debug, Clone, Default)]
pub struct DeviceBackend {
    device_name: Option<String>,
}

impl DeviceBackend {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl AudioBackend for DeviceBackend {
    fn open_clip(&self, clip: DecodedClip, gain: GainRange) -> Result<ClipHandle> {
        let device = output::find_device(self.device_name.as_deref())?;
        let config = output::default_config(&device)?;

        let clip = resample_clip(clip, config.sample_rate().0)?;
        let line = Arc::new(ClipLine::new(clip, Some(GainControl::new(gain))));
        let output = AudioOutput::open(&device, config, line.clone())?;
        debug!(
            "Clip line opened on device ({} ch @ {} Hz)",
            output.channels(),
            output.sample_rate()
        );

        Ok(ClipHandle {
            line,
            _output: Some(output),
            clock: None,
        })
    }
}

const CLOCK_TICK: Duration = Duration::from_millis(10);

/// No device. Lines advance by hand, or on a wall-clock thread.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessBackend {
    realtime: bool,
    gain: bool,
}

impl HeadlessBackend {
    /// Lines only move through `ClipLine::advance`
    pub fn manual() -> Self {
        Self {
            realtime: false,
            gain: true,
        }
    }

    /// Lines are consumed at their own sample rate by a background thread
    pub fn realtime() -> Self {
        Self {
            realtime: true,
            gain: true,
        }
    }

    /// Lines without a master gain control
    pub fn without_gain(self) -> Self {
        Self {
            gain: false,
            ..self
        }
    }
}

impl AudioBackend for HeadlessBackend {
    fn open_clip(&self, clip: DecodedClip, gain: GainRange) -> Result<ClipHandle> {
        if clip.channels == 0 || clip.sample_rate == 0 {
            return Err(ClipError::Device(format!(
                "Unplayable format: {} ch @ {} Hz",
                clip.channels, clip.sample_rate
            )));
        }

        let gain = self.gain.then(|| GainControl::new(gain));
        let line = Arc::new(ClipLine::new(clip, gain));

        let clock = if self.realtime {
            let clock_line = line.clone();
            let frames_per_tick =
                (clock_line.sample_rate() as u128 * CLOCK_TICK.as_millis() / 1000) as usize;
            let handle = thread::Builder::new()
                .name("musica-clock".to_string())
                .spawn(move || {
                    while !clock_line.is_closed() {
                        clock_line.advance(frames_per_tick);
                        thread::sleep(CLOCK_TICK);
                    }
                })?;
            Some(handle)
        } else {
            None
        };

        Ok(ClipHandle {
            line,
            _output: None,
            clock,
        })
    }
}
