//! evalboard configuration.
//!
//! Loaded from an optional TOML file; every key has a default. Command-line
//! flags override file values.
//!
//! ```toml
//! store_root = ".evalboard"
//! default_k = 5
//! max_explicit_runs = 10
//! default_threshold = 0.5
//! track_distribution = true
//! cache_capacity = 256
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{EvalboardError, Result};

/// Settings shared by the service and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EvalboardConfig {
    /// Root of the filesystem Run Store snapshot.
    pub store_root: PathBuf,

    /// K used for most-recent-K selection.
    pub default_k: usize,

    /// Cap on explicitly selected runs.
    pub max_explicit_runs: usize,

    /// Pass threshold when the caller supplies none.
    pub default_threshold: f64,

    /// Whether aggregations include the correct-count distribution.
    pub track_distribution: bool,

    /// Memoized aggregation results kept by the service; oldest evicted first.
    /// 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for EvalboardConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(".evalboard"),
            default_k: 5,
            max_explicit_runs: 10,
            default_threshold: 0.5,
            track_distribution: true,
            cache_capacity: 256,
        }
    }
}

impl EvalboardConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_k == 0 {
            return Err(EvalboardError::Config("default_k must be at least 1".into()));
        }
        if self.max_explicit_runs == 0 {
            return Err(EvalboardError::Config(
                "max_explicit_runs must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(EvalboardError::Config(format!(
                "default_threshold {} outside 0.0-1.0",
                self.default_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvalboardConfig::default();
        assert_eq!(config.default_k, 5);
        assert_eq!(config.max_explicit_runs, 10);
        assert_eq!(config.default_threshold, 0.5);
        assert!(config.track_distribution);
        assert_eq!(config.cache_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EvalboardConfig::from_toml_str("default_k = 3\n").unwrap();
        assert_eq!(config.default_k, 3);
        assert_eq!(config.max_explicit_runs, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EvalboardConfig::from_toml_str("default_k = 0\n"),
            Err(EvalboardError::Config(_))
        ));
        assert!(matches!(
            EvalboardConfig::from_toml_str("default_threshold = 1.5\n"),
            Err(EvalboardError::Config(_))
        ));
        assert!(matches!(
            EvalboardConfig::from_toml_str("bogus = true\n"),
            Err(EvalboardError::Toml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evalboard.toml");
        std::fs::write(&path, "store_root = \"/data/runs\"\ntrack_distribution = false\n")
            .unwrap();

        let config = EvalboardConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.store_root, PathBuf::from("/data/runs"));
        assert!(!config.track_distribution);

        let config = EvalboardConfig::load_or_default(None).unwrap();
        assert_eq!(config, EvalboardConfig::default());
    }
}
