use crate::error::{Result, ReconcilerError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
}

/// Threshold knobs for the matching cascade.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum combined score for a fighter name pair to count as a match
    pub min_name_similarity: f64,
    /// Minimum score for candidates returned from a directory search
    pub min_search_similarity: f64,
    /// Minimum score for a fuzzy event-name match to be accepted at all
    pub event_fuzzy_threshold: f64,
    /// Fuzzy event scores at or above this are High confidence
    pub event_high_threshold: f64,
    /// Fuzzy event scores at or above this are Medium confidence
    pub event_medium_threshold: f64,
    /// Average name score at or above this makes a winner determination High
    pub winner_high_threshold: f64,
    /// Average name score at or above this makes a winner determination Medium
    pub winner_medium_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            matching: MatchingConfig::default(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_name_similarity: 0.85,
            min_search_similarity: 0.7,
            event_fuzzy_threshold: 0.80,
            event_high_threshold: 0.95,
            event_medium_threshold: 0.85,
            winner_high_threshold: 0.95,
            winner_medium_threshold: 0.85,
        }
    }
}

impl Config {
    /// Load config.toml if present, falling back to defaults otherwise.
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ReconcilerError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path, e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = Config::default();
        assert_eq!(config.matching.min_name_similarity, 0.85);
        assert_eq!(config.matching.min_search_similarity, 0.7);
        assert_eq!(config.matching.event_fuzzy_threshold, 0.80);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("[matching]\nmin_name_similarity = 0.9\n").unwrap();
        assert_eq!(config.matching.min_name_similarity, 0.9);
        assert_eq!(config.matching.event_fuzzy_threshold, 0.80);
    }
}
