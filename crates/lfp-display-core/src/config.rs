//! Display buffer configuration
//!
//! Stored as JSON. Missing fields fall back to their defaults so older files
//! keep loading.

use crate::error::BufferError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_window_seconds() -> f64 {
    crate::DEFAULT_WINDOW_SECONDS
}

fn default_marker_capacity() -> usize {
    1024
}

fn default_event_queue_capacity() -> usize {
    32
}

/// Tunables for the display buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Length of history kept by the ring, in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: f64,
    /// Slots in the event marker queue
    #[serde(default = "default_marker_capacity")]
    pub marker_capacity: usize,
    /// Slots in each channel-based lifecycle subscription
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            marker_capacity: default_marker_capacity(),
            event_queue_capacity: default_event_queue_capacity(),
        }
    }
}

impl DisplayConfig {
    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), BufferError> {
        let window_ok = self.window_seconds.is_finite() && self.window_seconds > 0.0;
        if !window_ok || self.marker_capacity == 0 || self.event_queue_capacity == 0 {
            return Err(BufferError::InvalidConfiguration {
                channels: 0,
                sample_rate_hz: 0.0,
                window_seconds: self.window_seconds,
            });
        }
        Ok(())
    }

    /// Load config from disk, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Self>(&contents) {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Invalid config, using defaults"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = DisplayConfig::default();
        assert_relative_eq!(config.window_seconds, 5.0);
        assert_eq!(config.marker_capacity, 1024);
        assert_eq!(config.event_queue_capacity, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"window_seconds": 2.5}"#;
        let config: DisplayConfig = serde_json::from_str(json).unwrap();
        assert_relative_eq!(config.window_seconds, 2.5);
        assert_eq!(config.marker_capacity, 1024);

        let config: DisplayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DisplayConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        for window in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = DisplayConfig {
                window_seconds: window,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "window {} accepted", window);
        }

        let config = DisplayConfig {
            marker_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("display.json");

        let config = DisplayConfig {
            window_seconds: 10.0,
            marker_capacity: 64,
            event_queue_capacity: 8,
        };
        config.save(&path).unwrap();
        assert_eq!(DisplayConfig::load(&path), config);
    }

    #[test]
    fn test_load_falls_back_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("display.json");

        assert_eq!(DisplayConfig::load(&path), DisplayConfig::default());

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(DisplayConfig::load(&path), DisplayConfig::default());

        std::fs::write(&path, r#"{"window_seconds": -3.0}"#).unwrap();
        assert_eq!(DisplayConfig::load(&path), DisplayConfig::default());
    }
}
