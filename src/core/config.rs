use crate::core::ml_models::ModelConfig;
use crate::models::measurement::LengthConfig;
use crate::models::pose::PostureConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Ruler box counting
    pub length: LengthConfig,
    /// Knee and ankle thresholds
    pub posture: PostureConfig,
    /// Pose landmark model selection and cache location
    pub model: ModelConfig,
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults if it doesn't exist.
    /// Missing fields take their default values.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.length.min_box_area.is_finite() || self.length.min_box_area < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Invalid minimum box area: {}. Must be a non-negative number",
                self.length.min_box_area
            )));
        }

        if self.length.poster_length <= 0 {
            return Err(ConfigError::Invalid(format!(
                "Invalid poster length: {}. Must be positive",
                self.length.poster_length
            )));
        }

        if self.length.outline_thickness == 0 {
            return Err(ConfigError::Invalid(
                "Outline thickness must be at least 1 pixel".to_string(),
            ));
        }

        if !(0.0..=180.0).contains(&self.posture.knee_threshold_deg) {
            return Err(ConfigError::Invalid(format!(
                "Invalid knee threshold: {}. Must be between 0 and 180 degrees",
                self.posture.knee_threshold_deg
            )));
        }

        if !(0.0..=1.0).contains(&self.posture.ankle_height_threshold) {
            return Err(ConfigError::Invalid(format!(
                "Invalid ankle height threshold: {}. Must be between 0.0 and 1.0",
                self.posture.ankle_height_threshold
            )));
        }

        if self.posture.marker_radius < 0 {
            return Err(ConfigError::Invalid(format!(
                "Invalid marker radius: {}. Must not be negative",
                self.posture.marker_radius
            )));
        }

        if let Some(url) = &self.model.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "Invalid model URL: {}. Must be http or https",
                    url
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ml_models::ModelChoice;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.length.min_box_area, 2000.0);
        assert_eq!(config.length.poster_length, 200);
        assert_eq!(config.length.brightness_threshold, 100);
        assert_eq!(config.posture.knee_threshold_deg, 160.0);
        assert_eq!(config.posture.ankle_height_threshold, 0.01);
        assert_eq!(config.model.choice, ModelChoice::Lite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.length.poster_length = 0;
        assert!(config.validate().is_err());
        config.length.poster_length = 200;

        config.length.min_box_area = -1.0;
        assert!(config.validate().is_err());
        config.length.min_box_area = 2000.0;

        config.posture.knee_threshold_deg = 200.0;
        assert!(config.validate().is_err());
        config.posture.knee_threshold_deg = 160.0;

        config.posture.ankle_height_threshold = 1.5;
        assert!(config.validate().is_err());
        config.posture.ankle_height_threshold = 0.01;

        config.model.url = Some("ftp://example.com/pose.task".to_string());
        assert!(config.validate().is_err());
        config.model.url = None;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config").join("settings.json");

        let mut config = Config::default();
        config.length.poster_length = 150;
        config.model.choice = ModelChoice::Heavy;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load_from(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"posture": {"knee_threshold_deg": 150.0}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.posture.knee_threshold_deg, 150.0);
        assert_eq!(config.posture.ankle_height_threshold, 0.01);
        assert_eq!(config.length, LengthConfig::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));

        std::fs::write(&path, r#"{"length": {"poster_length": -5}}"#).unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }
}
