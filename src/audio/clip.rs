// Device clip: a decoded buffer plus the transport state the output stream reads.
// Shared between the control thread and the audio callback.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use super::decoder::{frames_to_us, us_to_frames, DecodedClip};
use super::gain::GainControl;
use crate::error::{ClipError, Result};

/// How many extra passes a line plays once it reaches the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Continuous,
    Times(u32),
}

struct Cursor {
    frame: u64,
    /// Position reported for `anchor_frame`; keeps sub-frame seeks exact
    anchor_frame: u64,
    anchor_us: u64,
    loops: LoopCount,
    end_of_media: bool,
}

impl Cursor {
    fn jump_to_frame(&mut self, frame: u64, sample_rate: u32) {
        self.frame = frame;
        self.anchor_frame = frame;
        self.anchor_us = frames_to_us(frame, sample_rate);
    }
}

pub struct ClipLine {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    total_frames: u64,
    cursor: Mutex<Cursor>,
    gain: Option<Mutex<GainControl>>,
    running: AtomicBool,
    closed: AtomicBool,
}

impl ClipLine {
    /// Wrap a decoded clip. `gain` is `None` for lines without a master gain control.
    pub fn new(clip: DecodedClip, gain: Option<GainControl>) -> Self {
        let total_frames = clip.frames();
        Self {
            samples: clip.samples,
            channels: clip.channels as usize,
            sample_rate: clip.sample_rate,
            total_frames,
            cursor: Mutex::new(Cursor {
                frame: 0,
                anchor_frame: 0,
                anchor_us: 0,
                loops: LoopCount::Times(0),
                end_of_media: false,
            }),
            gain: gain.map(Mutex::new),
            running: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClipError::Closed);
        }
        Ok(())
    }

    pub fn start(&self) -> Result<()> {
        self.ensure_open()?;
        let mut cursor = self.cursor.lock();
        cursor.end_of_media = false;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop and refuse any further transport calls
    pub fn close(&self) {
        self.stop();
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Audio line closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Set the loop count and start playing from the current position
    pub fn loop_playback(&self, count: LoopCount) -> Result<()> {
        self.ensure_open()?;
        let mut cursor = self.cursor.lock();
        cursor.loops = count;
        cursor.end_of_media = false;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn frame_length(&self) -> u64 {
        self.total_frames
    }

    pub fn frame_position(&self) -> u64 {
        self.cursor.lock().frame
    }

    pub fn set_frame_position(&self, frame: u64) -> Result<()> {
        self.ensure_open()?;
        let mut cursor = self.cursor.lock();
        cursor.jump_to_frame(frame.min(self.total_frames), self.sample_rate);
        cursor.end_of_media = false;
        Ok(())
    }

    pub fn microsecond_length(&self) -> u64 {
        frames_to_us(self.total_frames, self.sample_rate)
    }

    pub fn microsecond_position(&self) -> u64 {
        let cursor = self.cursor.lock();
        let position = if cursor.frame >= cursor.anchor_frame {
            cursor.anchor_us + frames_to_us(cursor.frame - cursor.anchor_frame, self.sample_rate)
        } else {
            frames_to_us(cursor.frame, self.sample_rate)
        };
        position.min(self.microsecond_length())
    }

    /// Seek to a microsecond offset, clamped to the clip length
    pub fn set_microsecond_position(&self, us: u64) -> Result<()> {
        self.ensure_open()?;
        let us = us.min(self.microsecond_length());
        let mut cursor = self.cursor.lock();
        let frame = us_to_frames(us, self.sample_rate).min(self.total_frames);
        cursor.frame = frame;
        cursor.anchor_frame = frame;
        cursor.anchor_us = us;
        cursor.end_of_media = false;
        Ok(())
    }

    /// True once playback ran off the end with no loops left
    pub fn reached_end(&self) -> bool {
        self.cursor.lock().end_of_media
    }

    /// Passes still owed before the line may stop at the end
    pub fn loops_remaining(&self) -> LoopCount {
        self.cursor.lock().loops
    }

    pub fn gain_control(&self) -> Result<GainControl> {
        self.gain
            .as_ref()
            .map(|gain| *gain.lock())
            .ok_or(ClipError::GainUnsupported)
    }

    pub fn set_gain(&self, value_db: f32) -> Result<()> {
        let gain = self.gain.as_ref().ok_or(ClipError::GainUnsupported)?;
        gain.lock().set_value(value_db)
    }

    /// Fill `out` (interleaved, `out_channels` wide) from the cursor.
    /// Writes silence while stopped. Returns the number of clip frames consumed.
    pub fn render(&self, out: &mut [f32], out_channels: usize) -> usize {
        if out_channels == 0 {
            return 0;
        }
        if !self.is_running() || self.channels == 0 {
            out.fill(0.0);
            return 0;
        }

        let amplitude = self
            .gain
            .as_ref()
            .map(|gain| gain.lock().amplitude())
            .unwrap_or(1.0);

        let mut cursor = self.cursor.lock();
        let mut consumed = 0;

        for frame_out in out.chunks_mut(out_channels) {
            if !self.is_running() || cursor.frame >= self.total_frames {
                frame_out.fill(0.0);
                if self.is_running() && !self.wrap_or_finish(&mut cursor) {
                    self.running.store(false, Ordering::SeqCst);
                }
                continue;
            }

            let base = cursor.frame as usize * self.channels;
            for (ch, sample) in frame_out.iter_mut().enumerate() {
                *sample = self.samples[base + ch % self.channels] * amplitude;
            }
            cursor.frame += 1;
            consumed += 1;

            if cursor.frame >= self.total_frames && !self.wrap_or_finish(&mut cursor) {
                self.running.store(false, Ordering::SeqCst);
            }
        }

        consumed
    }

    /// Handle the cursor hitting the end. Returns false when playback should stop.
    fn wrap_or_finish(&self, cursor: &mut Cursor) -> bool {
        match cursor.loops {
            LoopCount::Continuous if self.total_frames > 0 => {
                cursor.jump_to_frame(0, self.sample_rate);
                true
            }
            LoopCount::Times(n) if n > 0 && self.total_frames > 0 => {
                cursor.loops = LoopCount::Times(n - 1);
                cursor.jump_to_frame(0, self.sample_rate);
                true
            }
            _ => {
                cursor.end_of_media = true;
                false
            }
        }
    }

    /// Consume `frames` frames without an output device
    pub fn advance(&self, frames: usize) -> usize {
        let channels = self.channels.max(1);
        let mut scratch = vec![0.0f32; frames * channels];
        self.render(&mut scratch, channels)
    }
}
