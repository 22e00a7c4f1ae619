//! Pipeline configuration shared by collection, training and prediction.
//!
//! Every parameter that changes the shape of a window or feature vector lives here,
//! so a model trained with one config can be checked against the config used at
//! prediction time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::PipelineError;
use crate::types::{CHANNELS, DEFAULT_TIMESTEPS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples per window
    pub timesteps: usize,
    /// Channels per sample, fixed at 6
    pub channels: usize,
    /// Serial device the wearable is attached to
    pub serial_port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Where collected sample files are written
    pub output_dir: PathBuf,
    /// Extension appended to manifest identifiers and collected files
    pub sample_extension: String,
    /// Abort a live source after this many malformed lines in a row
    pub max_consecutive_malformed: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timesteps: DEFAULT_TIMESTEPS,
            channels: CHANNELS,
            serial_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            output_dir: PathBuf::from("collected_data"),
            sample_extension: "txt".to_string(),
            max_consecutive_malformed: Some(50),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PipelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.timesteps == 0 {
            return Err(PipelineError::InvalidConfig(
                "timesteps must be greater than zero".into(),
            ));
        }
        if self.channels != CHANNELS {
            return Err(PipelineError::ChannelMismatch {
                expected: CHANNELS,
                actual: self.channels,
            });
        }
        if self.baud_rate == 0 {
            return Err(PipelineError::InvalidConfig(
                "baud rate must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Length of every feature vector this config produces.
    pub fn feature_len(&self) -> usize {
        self.timesteps * self.channels
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Path of the sample file for a manifest identifier inside `dir`.
    pub fn sample_path(&self, dir: &Path, identifier: &str) -> PathBuf {
        dir.join(format!("{identifier}.{}", self.sample_extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.timesteps, 400);
        assert_eq!(config.channels, 6);
        assert_eq!(config.feature_len(), 2400);
        assert_eq!(config.baud_rate, 115_200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"timesteps": 100, "serial_port": "COM3"}"#).unwrap();
        assert_eq!(config.timesteps, 100);
        assert_eq!(config.serial_port, "COM3");
        assert_eq!(config.channels, 6);
        assert_eq!(config.sample_extension, "txt");
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let config = PipelineConfig {
            timesteps: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
        let config = PipelineConfig {
            channels: 7,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::ChannelMismatch {
                expected: 6,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_sample_path_appends_extension() {
        let config = PipelineConfig::default();
        let path = config.sample_path(Path::new("help-words"), "help_21");
        assert_eq!(path, PathBuf::from("help-words/help_21.txt"));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("imu-gesture-config-test.json");
        let config = PipelineConfig {
            timesteps: 200,
            max_consecutive_malformed: None,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = PipelineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(path);
    }
}
