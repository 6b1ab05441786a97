//! Configuration management
//!
//! Loads and saves the component's capture, recording and storage settings as
//! TOML, and turns them into the [`CaptureOptions`] a controller is mounted
//! with.

use crate::dimensions::{AspectRatio, DimensionSpec};
use crate::errors::WebcamError;
use crate::types::{CaptureOptions, DEFAULT_MIME_TYPE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebcamConfig {
    pub capture: CaptureConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
}

/// Host options for the capture component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Include the microphone in the captured stream
    pub audio: bool,
    /// Render the preview fullscreen
    pub fullscreen: bool,
    /// Show the REC overlay while recording
    pub show_indicator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// `"16:9"`, a preset name, or a decimal ratio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

/// Recording behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Container type requested from the recorder
    pub mime_type: String,
    /// Blink period of the REC indicator in milliseconds
    pub indicator_period_ms: u64,
}

/// Where downloads land
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub download_directory: String,
    /// File name used when the host does not supply one
    pub default_file_name: String,
}

impl Default for WebcamConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                audio: false,
                fullscreen: false,
                show_indicator: false,
                width: Some(640),
                height: Some(360),
                aspect_ratio: None,
            },
            recording: RecordingConfig {
                mime_type: DEFAULT_MIME_TYPE.to_string(),
                indicator_period_ms: 600,
            },
            storage: StorageConfig {
                download_directory: "./recordings".to_string(),
                default_file_name: "recording".to_string(),
            },
        }
    }
}

impl WebcamConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, WebcamError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| WebcamError::Config(format!("Failed to read config file: {}", e)))?;

        let config: WebcamConfig = toml::from_str(&contents)
            .map_err(|e| WebcamError::Config(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WebcamError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    WebcamError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| WebcamError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| WebcamError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("webcam-recorder.toml")
    }

    /// Load from default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capture.width == Some(0) || self.capture.height == Some(0) {
            return Err("Width and height must be positive".to_string());
        }
        if let Some(ratio) = &self.capture.aspect_ratio {
            match AspectRatio::parse(ratio) {
                Some(parsed) if parsed.value().is_finite() && parsed.value() > 0.0 => {}
                _ => return Err(format!("Invalid aspect ratio: {}", ratio)),
            }
        }

        if self.recording.mime_type.trim().is_empty() {
            return Err("Recording mime type must not be empty".to_string());
        }
        if self.recording.indicator_period_ms == 0 || self.recording.indicator_period_ms > 10_000
        {
            return Err("Indicator period must be between 1 and 10000 ms".to_string());
        }

        if self.storage.download_directory.trim().is_empty() {
            return Err("Download directory must not be empty".to_string());
        }
        if self.storage.default_file_name.trim().is_empty() {
            return Err("Default file name must not be empty".to_string());
        }

        Ok(())
    }

    pub fn dimension_spec(&self) -> DimensionSpec {
        DimensionSpec {
            width: self.capture.width,
            height: self.capture.height,
            aspect_ratio: self
                .capture
                .aspect_ratio
                .as_deref()
                .and_then(AspectRatio::parse),
        }
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            request_audio: self.capture.audio,
            display_fullscreen: self.capture.fullscreen,
            show_indicator: self.capture.show_indicator,
            dimensions: self.dimension_spec(),
        }
    }

    pub fn indicator_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.recording.indicator_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::Dimensions;

    #[test]
    fn test_default_config() {
        let config = WebcamConfig::default();
        assert!(!config.capture.audio);
        assert_eq!(config.recording.indicator_period_ms, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad = WebcamConfig::default();
        bad.capture.width = Some(0);
        assert!(bad.validate().is_err());

        let mut bad_ratio = WebcamConfig::default();
        bad_ratio.capture.aspect_ratio = Some("wide".to_string());
        assert!(bad_ratio.validate().is_err());

        let mut bad_period = WebcamConfig::default();
        bad_period.recording.indicator_period_ms = 0;
        assert!(bad_period.validate().is_err());
    }

    #[test]
    fn test_capture_options_from_ratio() {
        let mut config = WebcamConfig::default();
        config.capture.width = None;
        config.capture.height = Some(480);
        config.capture.aspect_ratio = Some("4:3".to_string());

        let options = config.capture_options();
        assert_eq!(options.resolved_dimensions(), Dimensions::new(640, 480));
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&WebcamConfig::default()).unwrap();

        assert!(toml_string.contains("[capture]"));
        assert!(toml_string.contains("[recording]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("indicator_period_ms"));
        assert!(!toml_string.contains("aspect_ratio"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = WebcamConfig::load_from_file("nonexistent_webcam_config.toml");
        assert_eq!(result.unwrap(), WebcamConfig::default());
    }
}
