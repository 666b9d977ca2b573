//! Configuration management for relicwatch
//!
//! This module provides configuration structures and defaults for the trigger
//! patterns, the countdown, and the log tailer. Values come from built-in
//! defaults, an optional TOML file, then `RELICWATCH_*` environment variables,
//! in that order of precedence.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::triggers::{TriggerSet, RESET_PATTERN, START_PATTERN};

/// Global configuration for relicwatch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelicwatchConfig {
    /// Trigger substring configuration
    pub triggers: TriggerConfig,
    /// Countdown configuration
    pub countdown: CountdownConfig,
    /// Log tailer configuration
    pub tailer: TailerConfig,
}

/// The two substrings scanned for in each log line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Line content that starts (or restarts) the countdown
    pub start_pattern: String,
    /// Line content that cancels the countdown
    pub reset_pattern: String,
}

/// Countdown timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Countdown duration in seconds
    pub duration_secs: u32,
    /// Tick interval in milliseconds
    pub tick_interval_ms: u64,
}

/// Log tailer timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailerConfig {
    /// Sleep between polls when no new line is available, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for RelicwatchConfig {
    fn default() -> Self {
        Self {
            triggers: TriggerConfig::default(),
            countdown: CountdownConfig::default(),
            tailer: TailerConfig::default(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            start_pattern: START_PATTERN.to_string(),
            reset_pattern: RESET_PATTERN.to_string(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: 180, // the relic's 3-minute cooldown
            tick_interval_ms: 1000,
        }
    }
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl TriggerConfig {
    pub fn trigger_set(&self) -> TriggerSet {
        TriggerSet::new(self.start_pattern.clone(), self.reset_pattern.clone())
    }
}

impl CountdownConfig {
    /// Get tick interval duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl TailerConfig {
    /// Get poll interval duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration loading and management
impl RelicwatchConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config.with_env_overrides())
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RELICWATCH_START_PATTERN") {
            self.triggers.start_pattern = val;
        }

        if let Ok(val) = std::env::var("RELICWATCH_RESET_PATTERN") {
            self.triggers.reset_pattern = val;
        }

        if let Ok(val) = std::env::var("RELICWATCH_DURATION_SECS") {
            if let Ok(secs) = val.parse::<u32>() {
                self.countdown.duration_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("RELICWATCH_POLL_INTERVAL_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.tailer.poll_interval_ms = ms;
            }
        }

        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.triggers.start_pattern.is_empty() {
            return Err("start_pattern must not be empty".to_string());
        }

        if self.triggers.reset_pattern.is_empty() {
            return Err("reset_pattern must not be empty".to_string());
        }

        if self.countdown.duration_secs == 0 {
            return Err("duration_secs must be greater than 0".to_string());
        }

        if self.countdown.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".to_string());
        }

        if self.tailer.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelicwatchConfig::default();

        assert_eq!(config.countdown.duration_secs, 180);
        assert_eq!(config.countdown.tick_interval_ms, 1000);
        assert_eq!(config.tailer.poll_interval_ms, 100);
        assert_eq!(config.triggers.start_pattern, START_PATTERN);
        assert_eq!(config.triggers.reset_pattern, RESET_PATTERN);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RelicwatchConfig::default();
        assert!(config.validate().is_ok());

        config.countdown.duration_secs = 0;
        assert!(config.validate().is_err());

        config.countdown.duration_secs = 180;
        config.triggers.start_pattern.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = RelicwatchConfig::default();

        assert_eq!(config.countdown.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.tailer.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RelicwatchConfig = toml::from_str(
            r#"
            [countdown]
            duration_secs = 90
            "#,
        )
        .unwrap();

        assert_eq!(config.countdown.duration_secs, 90);
        assert_eq!(config.countdown.tick_interval_ms, 1000);
        assert_eq!(config.triggers.start_pattern, START_PATTERN);
    }

    #[test]
    fn test_toml_file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relicwatch.toml");
        std::fs::write(
            &path,
            r#"
            [triggers]
            start_pattern = "boss spawned"
            reset_pattern = "boss died"

            [tailer]
            poll_interval_ms = 50
            "#,
        )
        .unwrap();

        let config = RelicwatchConfig::load(&path).unwrap();
        assert_eq!(config.triggers.start_pattern, "boss spawned");
        assert_eq!(config.triggers.reset_pattern, "boss died");
        assert_eq!(config.tailer.poll_interval_ms, 50);
    }

    #[test]
    fn test_env_config_loading() {
        std::env::set_var("RELICWATCH_DURATION_SECS", "60");
        std::env::set_var("RELICWATCH_POLL_INTERVAL_MS", "250");

        let config = RelicwatchConfig::from_env();

        assert_eq!(config.countdown.duration_secs, 60);
        assert_eq!(config.tailer.poll_interval_ms, 250);

        // Cleanup
        std::env::remove_var("RELICWATCH_DURATION_SECS");
        std::env::remove_var("RELICWATCH_POLL_INTERVAL_MS");
    }
}
