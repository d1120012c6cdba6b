//! Store configuration

use gridbag_grid::PlacementStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading a [`StoreConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for an [`InventoryStore`](crate::InventoryStore)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How free slots are searched
    pub placement: PlacementStrategy,
    /// Verify touched containers after every commit
    pub verify_after_commit: bool,
    /// How often a transaction re-plans its lock set before it is withdrawn
    pub lock_retry_limit: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            placement: PlacementStrategy::default(),
            verify_after_commit: false,
            lock_retry_limit: 8,
        }
    }
}

impl StoreConfig {
    /// Parse from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_placement(mut self, placement: PlacementStrategy) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_verify_after_commit(mut self, verify: bool) -> Self {
        self.verify_after_commit = verify;
        self
    }

    pub fn with_lock_retry_limit(mut self, limit: u32) -> Self {
        self.lock_retry_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbag_grid::{RotationPolicy, ScanOrder};
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.lock_retry_limit, 8);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
verify_after_commit = true
lock_retry_limit = 2

[placement]
order = "column_major"
rotation = "never"
"#
        )
        .unwrap();

        let config = StoreConfig::load(file.path()).unwrap();
        assert!(config.verify_after_commit);
        assert_eq!(config.lock_retry_limit, 2);
        assert_eq!(config.placement.order, ScanOrder::ColumnMajor);
        assert_eq!(config.placement.rotation, RotationPolicy::Never);
    }

    #[test]
    fn test_parse_error() {
        let err = StoreConfig::from_toml_str("lock_retry_limit = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
