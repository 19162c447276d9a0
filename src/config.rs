//!
//! Engine configuration: the field-kind weight table and operator knobs.
//!
//! Loaded from JSON. Harness binaries usually call [`EngineConfig::from_env`],
//! which reads the file named by `WASM_MUTATOR_CONFIG` and falls back to
//! defaults when the variable is unset.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::select::WeightTable;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "WASM_MUTATOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Relative weights of the mutable field kinds.
    pub weights: WeightTable,
    /// Let the integer buckets (integers outside a Repeat) be mutated.
    /// When off, selecting an integer kind is a no-op.
    pub standalone_int_replacement: bool,
    /// Upper bound on the bytes a single byte-level operator may insert.
    pub max_bytes_growth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            weights: WeightTable::default(),
            standalone_int_replacement: false,
            max_bytes_growth: 16,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Loads the file named by [`CONFIG_ENV`], or the defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::debug!("Loading mutator config from {:?}", path);
                Self::from_path(path)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldKind;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::from_json_str(r#"{"standalone_int_replacement": true}"#).unwrap();
        assert!(config.standalone_int_replacement);
        assert_eq!(config.weights, WeightTable::default());
        assert_eq!(config.max_bytes_growth, 16);
    }

    #[test]
    fn custom_weights_are_validated() {
        let ok = EngineConfig::from_json_str(r#"{"weights": [{"kind": "Repeat", "weight": 1}]}"#).unwrap();
        assert_eq!(ok.weights.weight(FieldKind::Repeat), Some(1));

        let zero = EngineConfig::from_json_str(r#"{"weights": [{"kind": "Bytes", "weight": 0}]}"#);
        assert!(matches!(zero, Err(ConfigError::ZeroWeight(FieldKind::Bytes))));

        let bad_json = EngineConfig::from_json_str("{");
        assert!(matches!(bad_json, Err(ConfigError::Json(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_bytes_growth": 4}}"#).unwrap();
        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_bytes_growth, 4);

        let missing = EngineConfig::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
