//! Loading `deriva.toml`, the config file for `deriva demo pick-to-sum`.
//!
//! Mirrors the manifest-loading pattern used elsewhere in this codebase:
//! a `Serialize`/`Deserialize` struct with `#[serde(default)]` fields, a
//! dedicated error enum, and a `load` function that reads and parses in one
//! step.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level config file contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SynthConfig {
    #[serde(default)]
    pub pick_to_sum: PickToSumSettings,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig { pick_to_sum: PickToSumSettings::default() }
    }
}

/// Parameters for the `pick-to-sum` demo: split `total` into `n` positive parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PickToSumSettings {
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default = "default_total")]
    pub total: u32,
}

impl Default for PickToSumSettings {
    fn default() -> Self {
        PickToSumSettings { n: default_n(), total: default_total() }
    }
}

fn default_n() -> usize {
    3
}

fn default_total() -> u32 {
    5
}

/// Errors that can occur when loading a config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, String),
    Parse(PathBuf, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "failed to read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "failed to parse {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SynthConfig {
    /// Reads and parses a config file from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_scenario() {
        let config = SynthConfig::default();
        assert_eq!(config.pick_to_sum.n, 3);
        assert_eq!(config.pick_to_sum.total, 5);
    }

    #[test]
    fn parses_a_partial_override() {
        let toml = r#"
[pick_to_sum]
total = 7
"#;
        let config: SynthConfig = toml::from_str(toml).expect("should parse partial config");
        assert_eq!(config.pick_to_sum.n, 3);
        assert_eq!(config.pick_to_sum.total, 7);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SynthConfig::load(Path::new("/nonexistent/deriva.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
