// Clip player: owns one open clip and exposes transport, volume and position control
use std::io::Read;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::{AudioBackend, ClipHandle};
use super::clip::{ClipLine, LoopCount};
use super::decoder::decode_stream;
use super::scheduler::LoopTask;
use crate::error::{ClipError, Result};
use crate::settings::PlayerSettings;

/// Playback state as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

pub struct ClipPlayer {
    handle: Option<ClipHandle>,
    looping: bool,
    paused: bool,
    /// Position captured by the last pause, in microseconds
    paused_at_us: u64,
    settings: PlayerSettings,
}

impl ClipPlayer {
    /// Decode `stream` and open it on `backend`.
    /// The default volume from `settings` is applied once the line is open.
    pub fn open<R: Read>(
        stream: R,
        looping: bool,
        backend: &dyn AudioBackend,
        settings: &PlayerSettings,
    ) -> Result<Self> {
        let clip = decode_stream(stream, settings.format_hint.as_deref())?;
        let handle = backend.open_clip(clip, settings.gain)?;

        let player = Self {
            handle: Some(handle),
            looping,
            paused: false,
            paused_at_us: 0,
            settings: settings.clone(),
        };
        if let Err(e) = player.set_volume(settings.default_volume) {
            warn!("Error setting volume: {}", e);
        }

        info!("Loaded clip ({} us, loop: {})", player.length(), looping);
        Ok(player)
    }

    /// Like `open`, but never fails: on any error the failure is logged
    /// and an inert player is returned.
    pub fn load<R: Read>(
        stream: Option<R>,
        looping: bool,
        backend: &dyn AudioBackend,
        settings: &PlayerSettings,
    ) -> Self {
        let opened = match stream {
            Some(stream) => Self::open(stream, looping, backend, settings),
            None => Err(ClipError::MissingStream),
        };
        opened.unwrap_or_else(|e| {
            warn!("Error loading audio: {}", e);
            Self::inert(looping, settings)
        })
    }

    /// A player with no clip. Every transport call reports `NotLoaded`.
    pub fn inert(looping: bool, settings: &PlayerSettings) -> Self {
        Self {
            handle: None,
            looping,
            paused: false,
            paused_at_us: 0,
            settings: settings.clone(),
        }
    }

    fn line(&self) -> Result<&Arc<ClipLine>> {
        self.handle
            .as_ref()
            .map(ClipHandle::line)
            .ok_or(ClipError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Map `volume` (0.0 to 1.0) linearly onto the line's gain range
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        let line = self.line()?;
        let control = line.gain_control()?;
        let gain = control.gain_for_volume(volume)?;
        line.set_gain(gain)?;
        debug!("Volume {} -> {:.2} dB", volume, gain);
        Ok(())
    }

    /// Current master gain in dB, if the line has one
    pub fn gain_db(&self) -> Option<f32> {
        self.line().ok()?.gain_control().ok().map(|c| c.value())
    }

    /// Play from the beginning, whatever the current state
    pub fn start_playback(&mut self) -> Result<()> {
        let line = self.line()?;
        if line.is_running() {
            line.stop();
        }
        line.set_frame_position(0)?;
        line.start()?;
        self.paused = false;
        self.paused_at_us = 0;
        Ok(())
    }

    /// Capture the position and stop. Does nothing unless playing.
    pub fn pause_playback(&mut self) -> Result<()> {
        let line = self.line()?;
        if line.is_running() {
            let position = line.microsecond_position();
            line.stop();
            self.paused_at_us = position;
            self.paused = true;
            debug!("Paused at {} us", position);
        }
        Ok(())
    }

    /// Continue from the captured position. Does nothing unless paused.
    pub fn resume_playback(&mut self) -> Result<()> {
        let line = self.line()?;
        if self.paused {
            line.set_microsecond_position(self.paused_at_us)?;
            line.start()?;
            self.paused = false;
            debug!("Resumed at {} us", self.paused_at_us);
        }
        Ok(())
    }

    /// Stop and release the line. Closing twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.line().stop();
            drop(handle);
            self.paused = false;
            info!("Clip closed");
        }
        Ok(())
    }

    /// Rewind and start looping (or a single playthrough) after the
    /// configured delay, without blocking the caller.
    /// Clears any pending resume point, as `start_playback` does.
    pub fn start_loop_task(&mut self) -> Result<LoopTask> {
        let line = self.line()?.clone();
        let task = LoopTask::spawn(line, self.settings.loop_start_delay(), self.looping)?;
        self.paused = false;
        self.paused_at_us = 0;
        Ok(task)
    }

    pub fn is_playing(&self) -> bool {
        self.line().map(|line| line.is_running()).unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.handle.is_some() && self.paused
    }

    pub fn state(&self) -> PlayerState {
        if self.is_playing() {
            PlayerState::Playing
        } else if self.is_paused() {
            PlayerState::Paused
        } else {
            PlayerState::Stopped
        }
    }

    /// Playback ran to the end, or stopped within the finish tolerance of it
    /// with no loops left
    pub fn has_finished(&self) -> bool {
        let Ok(line) = self.line() else {
            return false;
        };
        if line.reached_end() {
            return true;
        }
        if line.is_running() || line.loops_remaining() != LoopCount::Times(0) {
            return false;
        }
        let position = line.microsecond_position();
        let remaining = line.microsecond_length().saturating_sub(position);
        position > 0 && remaining <= self.settings.finish_tolerance_us()
    }

    pub fn set_position(&self, position_us: u64) -> Result<()> {
        self.line()?.set_microsecond_position(position_us)
    }

    pub fn position(&self) -> u64 {
        self.line().map(|line| line.microsecond_position()).unwrap_or(0)
    }

    /// Clip length in microseconds, 0 without a clip
    pub fn length(&self) -> u64 {
        self.line().map(|line| line.microsecond_length()).unwrap_or(0)
    }

    /// Jump to `position_us` and make sure the clip is playing
    pub fn seek_and_ensure_playing(&mut self, position_us: u64) -> Result<()> {
        let line = self.line()?;
        line.set_microsecond_position(position_us)?;
        if !line.is_running() {
            line.start()?;
        }
        self.paused = false;
        Ok(())
    }

    /// Direct access to the open line, e.g. to pump a headless backend
    pub fn clip_line(&self) -> Option<&Arc<ClipLine>> {
        self.handle.as_ref().map(ClipHandle::line)
    }
}

impl Drop for ClipPlayer {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
