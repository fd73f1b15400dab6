//! Editor configuration
//!
//! JSON-loadable settings for the controller. Every field has a default, so
//! a config file only needs the values it changes.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveditError};
use crate::state::DEFAULT_MAX_UNDO_LEVELS;

/// Default debounce window for display width changes (ms)
pub const DEFAULT_PEAK_DEBOUNCE_MS: u64 = 50;

/// Default minimum position change reported while polling (seconds)
pub const DEFAULT_POSITION_EPSILON_SECS: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Depth of the undo stack
    pub max_undo_levels: usize,
    /// Quiet period before a display width change regenerates peaks
    pub peak_debounce_ms: u64,
    /// Smallest position delta that produces a position event when polling
    pub position_epsilon_secs: f64,
    /// Initial peak target width; 0 disables peak generation
    pub display_width: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
            peak_debounce_ms: DEFAULT_PEAK_DEBOUNCE_MS,
            position_epsilon_secs: DEFAULT_POSITION_EPSILON_SECS,
            display_width: 0,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_undo_levels == 0 {
            return Err(WaveditError::InvalidConfig {
                reason: "max_undo_levels must be at least 1".to_string(),
            });
        }
        if !self.position_epsilon_secs.is_finite() || self.position_epsilon_secs < 0.0 {
            return Err(WaveditError::InvalidConfig {
                reason: format!(
                    "position_epsilon_secs must be a non-negative number, got {}",
                    self.position_epsilon_secs
                ),
            });
        }
        Ok(())
    }

    pub fn peak_debounce(&self) -> Duration {
        Duration::from_millis(self.peak_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.max_undo_levels, 50);
        assert_eq!(config.peak_debounce(), Duration::from_millis(50));
        assert_eq!(config.display_width, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "display_width": 800 }"#).unwrap();
        assert_eq!(
            config,
            EditorConfig {
                display_width: 800,
                ..EditorConfig::default()
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EditorConfig::from_json_str(r#"{ "max_undo_levels": 0 }"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = EditorConfig::from_json_str(r#"{ "position_epsilon_secs": -1.0 }"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");

        let err = EditorConfig::from_json_str("not json").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let json = r#"{ "max_undo_levels": 5, "peak_debounce_ms": 10 }"#;
        file.write_all(json.as_bytes()).unwrap();

        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.max_undo_levels, 5);
        assert_eq!(config.peak_debounce_ms, 10);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EditorConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, WaveditError::Io(_)));
    }
}
