// Settings management and persistence
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::audio::gain::GainRange;
use crate::error::{ClipError, Result};

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub version: i32, // Settings schema version for future migrations
    /// Volume applied right after a clip opens (0.0 to 1.0)
    pub default_volume: f32,
    /// Native gain range of opened lines
    pub gain: GainRange,
    pub loop_start_delay_ms: u64,
    /// How close to the end counts as finished
    pub finish_tolerance_ms: u64,
    /// Output device name, host default when unset
    pub output_device: Option<String>,
    /// File extension passed to the format probe, e.g. "wav"
    pub format_hint: Option<String>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: 1,
            default_volume: 0.6,
            gain: GainRange::default(),
            loop_start_delay_ms: 0,
            finish_tolerance_ms: 20,
            output_device: None,
            format_hint: None,
        }
    }
}

impl PlayerSettings {
    /// Get the settings file path
    pub fn get_settings_path(dir: &Path) -> PathBuf {
        dir.join("settings.json")
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::get_settings_path(dir);

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let settings: PlayerSettings = serde_json::from_str(&content)
            .map_err(|e| ClipError::Settings(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;

        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let path = Self::get_settings_path(dir);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ClipError::Settings(format!("Failed to serialize settings: {}", e)))?;
        fs::write(&path, content)?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ClipError::Settings(format!(
                "default_volume {} is outside 0.0..=1.0",
                self.default_volume
            )));
        }
        if !(self.gain.min_db < self.gain.max_db) {
            return Err(ClipError::Settings(format!(
                "gain range {}..{} dB is empty",
                self.gain.min_db, self.gain.max_db
            )));
        }
        Ok(())
    }

    pub fn loop_start_delay(&self) -> Duration {
        Duration::from_millis(self.loop_start_delay_ms)
    }

    pub fn finish_tolerance_us(&self) -> u64 {
        self.finish_tolerance_ms.saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.default_volume, 0.6);
        assert_eq!(settings.loop_start_delay(), Duration::ZERO);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PlayerSettings::load(dir.path()).unwrap();
        assert_eq!(settings, PlayerSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("config");
        let settings = PlayerSettings {
            default_volume: 0.25,
            loop_start_delay_ms: 500,
            output_device: Some("Speakers".to_string()),
            ..PlayerSettings::default()
        };
        settings.save(&nested).unwrap();
        assert_eq!(PlayerSettings::load(&nested).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            PlayerSettings::get_settings_path(dir.path()),
            r#"{ "default_volume": 0.9 }"#,
        )
        .unwrap();
        let settings = PlayerSettings::load(dir.path()).unwrap();
        assert_eq!(settings.default_volume, 0.9);
        assert_eq!(settings.finish_tolerance_ms, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let loud = PlayerSettings {
            default_volume: 1.5,
            ..PlayerSettings::default()
        };
        assert!(loud.validate().is_err());

        let empty_range = PlayerSettings {
            gain: GainRange { min_db: 0.0, max_db: 0.0 },
            ..PlayerSettings::default()
        };
        assert!(empty_range.validate().is_err());
    }

    #[test]
    fn test_huge_tolerance_saturates() {
        let settings = PlayerSettings {
            finish_tolerance_ms: u64::MAX,
            ..PlayerSettings::default()
        };
        assert_eq!(settings.finish_tolerance_us(), u64::MAX);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(PlayerSettings::get_settings_path(dir.path()), "not json").unwrap();
        assert!(matches!(
            PlayerSettings::load(dir.path()),
            Err(ClipError::Settings(_))
        ));
    }
}
