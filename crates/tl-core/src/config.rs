//! Session configuration

use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::error::ConfigError;
use crate::time::Time;

/// Configuration passed when a navigation session is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Topic the session navigates
    pub topic: String,

    /// Initial playhead, if the viewer already has one
    pub start_time: Option<Time>,

    /// Feed resolved message times back into the boundary tracker
    pub record_resolved_boundaries: bool,

    /// Keep asking the source after it reported no further message,
    /// even if the boundaries have not widened since
    pub retry_after_exhaustion: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            start_time: None,
            record_resolved_boundaries: true,
            retry_after_exhaustion: false,
        }
    }
}

impl NavigatorConfig {
    /// Configuration for `topic` with default settings
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn with_start_time(mut self, start_time: Time) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: NavigatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("topic must not be empty".to_string()));
        }
        Ok(())
    }
}
