//! Search window configuration

use std::path::Path;
use serde::{Serialize, Deserialize};
use tl_core::ConfigError;

/// Sizing of the time windows used when searching backward for a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial window when nothing is known about topic density
    pub default_window_ms: f64,

    /// Lower clamp for a density-derived window
    pub min_window_ms: f64,

    /// Upper clamp for a density-derived window
    pub max_window_ms: f64,

    /// No grown window exceeds this
    pub window_cap_ms: f64,

    /// Messages a density-derived window should hold
    pub target_messages: usize,

    /// Number of windows tried before scanning from the topic start
    pub max_windows: usize,

    /// Each window is this many times the previous one
    pub growth_factor: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_window_ms: 500.0,
            min_window_ms: 100.0,
            max_window_ms: 30_000.0,
            window_cap_ms: 60_000.0,
            target_messages: 10,
            max_windows: 4,
            growth_factor: 5.0,
        }
    }
}

impl WindowConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WindowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_window_ms <= 0.0 || self.min_window_ms > self.max_window_ms {
            return Err(ConfigError::Invalid(format!(
                "window bounds must satisfy 0 < min ({}) <= max ({})",
                self.min_window_ms, self.max_window_ms
            )));
        }
        if self.default_window_ms <= 0.0 || self.window_cap_ms <= 0.0 {
            return Err(ConfigError::Invalid("window sizes must be positive".to_string()));
        }
        if self.max_windows == 0 || self.target_messages == 0 {
            return Err(ConfigError::Invalid(
                "max_windows and target_messages must be at least 1".to_string(),
            ));
        }
        if self.growth_factor < 1.0 {
            return Err(ConfigError::Invalid("growth_factor must be at least 1".to_string()));
        }
        Ok(())
    }
}
