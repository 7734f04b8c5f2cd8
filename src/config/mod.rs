// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorder configuration.
//!
//! Settings come from an optional YAML file, then `MIDISPLIT_*` environment
//! variables, then command line flags, each layer overriding the last.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::recording::FileNameTemplate;
use crate::split::SplitConfig;

/// Prefix of the environment overrides
pub const ENV_PREFIX: &str = "MIDISPLIT_";

/// Everything needed to run a recording session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Inputs to record, by index or name fragment
    #[serde(default)]
    pub midi_inputs: Vec<String>,
    /// Silence (ms) after which a take is cut
    #[serde(default = "default_delay_to_save_ms")]
    pub delay_to_save_ms: u64,
    /// Time (ms) after which a held note or pedal is released
    #[serde(default = "default_timeout_to_save_ms")]
    pub timeout_to_save_ms: u64,
    /// Output path template
    #[serde(default = "default_path_format")]
    pub path_format: String,
    /// Ticks per quarter note in written files
    #[serde(default = "default_midi_resolution")]
    pub midi_resolution: u16,
}

fn default_delay_to_save_ms() -> u64 {
    5_000
}
fn default_timeout_to_save_ms() -> u64 {
    30_000
}
fn default_path_format() -> String {
    "{now:%Y%m%d%H%M%S}_{notes}.mid".to_string()
}
fn default_midi_resolution() -> u16 {
    480
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            midi_inputs: Vec::new(),
            delay_to_save_ms: default_delay_to_save_ms(),
            timeout_to_save_ms: default_timeout_to_save_ms(),
            path_format: default_path_format(),
            midi_resolution: default_midi_resolution(),
        }
    }
}

impl RecorderConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Apply `MIDISPLIT_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any `MIDISPLIT_*` lookup.
    ///
    /// `MIDISPLIT_MIDI_INPUTS` is a comma-separated list.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(inputs) = var("MIDI_INPUTS") {
            self.midi_inputs = inputs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = var("DELAY_TO_SAVE_MS") {
            self.delay_to_save_ms = parse_number("DELAY_TO_SAVE_MS", &value)?;
        }
        if let Some(value) = var("TIMEOUT_TO_SAVE_MS") {
            self.timeout_to_save_ms = parse_number("TIMEOUT_TO_SAVE_MS", &value)?;
        }
        if let Some(value) = var("PATH_FORMAT") {
            self.path_format = value;
        }
        if let Some(value) = var("MIDI_RESOLUTION") {
            self.midi_resolution = parse_number("MIDI_RESOLUTION", &value)?;
        }
        Ok(())
    }

    /// Check that the settings can drive a session
    pub fn validate(&self) -> Result<()> {
        if self.delay_to_save_ms == 0 {
            bail!("delay_to_save_ms must be greater than 0");
        }
        if self.timeout_to_save_ms == 0 {
            bail!("timeout_to_save_ms must be greater than 0");
        }
        if self.midi_resolution == 0 {
            bail!("midi_resolution must be greater than 0");
        }
        self.template()?;
        Ok(())
    }

    /// Timeouts for the splitter
    pub fn split_config(&self) -> SplitConfig {
        SplitConfig::new(
            Duration::from_millis(self.timeout_to_save_ms),
            Duration::from_millis(self.delay_to_save_ms),
        )
    }

    /// Parsed output path template
    pub fn template(&self) -> Result<FileNameTemplate> {
        FileNameTemplate::parse(&self.path_format)
            .with_context(|| format!("Invalid path_format '{}'", self.path_format))
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{ENV_PREFIX}{name}: '{value}' is not a valid number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
midi_inputs:
  - "0"
  - "Digital Piano"
delay_to_save_ms: 3000
timeout_to_save_ms: 60000
path_format: "takes/{now:%Y}/{guid}.mid"
midi_resolution: 960
"#;

        let config = RecorderConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.midi_inputs, vec!["0", "Digital Piano"]);
        assert_eq!(config.delay_to_save_ms, 3000);
        assert_eq!(config.timeout_to_save_ms, 60000);
        assert_eq!(config.midi_resolution, 960);
        assert!(config.validate().is_ok());

        let split = config.split_config();
        assert_eq!(split.quiet_period, Duration::from_secs(3));
        assert_eq!(split.held_event_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_default_values() {
        let config = RecorderConfig::from_yaml("midi_inputs: [\"1\"]").unwrap();
        assert_eq!(config.delay_to_save_ms, 5000);
        assert_eq!(config.timeout_to_save_ms, 30000);
        assert_eq!(config.path_format, "{now:%Y%m%d%H%M%S}_{notes}.mid");
        assert_eq!(config.midi_resolution, 480);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(RecorderConfig::from_yaml("delay_to_save: 10").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MIDISPLIT_MIDI_INPUTS", "0, Keystation ,"),
            ("MIDISPLIT_DELAY_TO_SAVE_MS", "2500"),
            ("MIDISPLIT_PATH_FORMAT", "{guid}.mid"),
        ]
        .into_iter()
        .collect();

        let mut config = RecorderConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.midi_inputs, vec!["0", "Keystation"]);
        assert_eq!(config.delay_to_save_ms, 2500);
        assert_eq!(config.timeout_to_save_ms, 30000);
        assert_eq!(config.path_format, "{guid}.mid");
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = RecorderConfig::default();
        let err = config
            .apply_overrides(|key| (key == "MIDISPLIT_MIDI_RESOLUTION").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("MIDISPLIT_MIDI_RESOLUTION"));
    }

    #[test]
    fn test_validation() {
        let mut config = RecorderConfig::default();
        assert!(config.validate().is_ok());

        config.delay_to_save_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RecorderConfig::default();
        config.midi_resolution = 0;
        assert!(config.validate().is_err());

        let mut config = RecorderConfig::default();
        config.path_format = "{when}.mid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recorder.yaml");

        let mut original = RecorderConfig::default();
        original.midi_inputs = vec!["2".to_string()];
        original.delay_to_save_ms = 1234;
        original.save(&path).unwrap();

        let loaded = RecorderConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(RecorderConfig::load(dir.path().join("nope.yaml")).is_err());
    }
}
