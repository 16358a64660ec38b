// Master gain control in decibels
// Maps a normalized volume onto the line's native gain range

use serde::{Deserialize, Serialize};

use crate::error::{ClipError, Result};

/// Native gain range of a line, in dB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainRange {
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for GainRange {
    fn default() -> Self {
        // Typical master gain range of a 16-bit line: -80 dB floor, +6.02 dB (x2) ceiling
        Self {
            min_db: -80.0,
            max_db: 6.0206,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainControl {
    range: GainRange,
    value_db: f32,
}

impl GainControl {
    /// New control at unity gain (clamped into the range)
    pub fn new(range: GainRange) -> Self {
        let value_db = if range.min_db <= range.max_db {
            0.0f32.clamp(range.min_db, range.max_db)
        } else {
            range.min_db
        };
        Self { range, value_db }
    }

    pub fn minimum(&self) -> f32 {
        self.range.min_db
    }

    pub fn maximum(&self) -> f32 {
        self.range.max_db
    }

    pub fn value(&self) -> f32 {
        self.value_db
    }

    pub fn set_value(&mut self, value_db: f32) -> Result<()> {
        if !(self.range.min_db..=self.range.max_db).contains(&value_db) {
            return Err(ClipError::InvalidGain {
                value: value_db,
                min: self.range.min_db,
                max: self.range.max_db,
            });
        }
        self.value_db = value_db;
        Ok(())
    }

    /// Linear position of `volume` (0.0 to 1.0) inside the dB range
    pub fn gain_for_volume(&self, volume: f32) -> Result<f32> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ClipError::InvalidVolume(volume));
        }
        let gain = self.range.min_db + (self.range.max_db - self.range.min_db) * volume;
        // f32 rounding can step just past either end
        Ok(gain.max(self.range.min_db).min(self.range.max_db))
    }

    /// Sample multiplier for the current gain
    pub fn amplitude(&self) -> f32 {
        db_to_amplitude(self.value_db)
    }
}

pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}
