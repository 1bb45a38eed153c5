//! Serving configuration, loaded from TOML.
//!
//! ```toml
//! checkpoint_dir = "models"
//! placement = "gpu"
//! model_version = "v1.0"
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use soundscape_burn::{DevicePlacement, TrainingConfig, DEFAULT_MODEL_VERSION};
use std::path::{Path, PathBuf};

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding `<pack>_model.{mpk,json}` checkpoints.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,

    /// Requested device; GPU falls back to CPU when no adapter is found.
    #[serde(default)]
    pub placement: DevicePlacement,

    /// Version recorded in checkpoints written by training runs.
    #[serde(default = "default_model_version")]
    pub model_version: String,

    #[serde(default = "TrainingConfig::new")]
    pub training: TrainingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            placement: DevicePlacement::default(),
            model_version: default_model_version(),
            training: TrainingConfig::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.checkpoint_dir, PathBuf::from("models"));
        assert_eq!(config.placement, DevicePlacement::Cpu);
        assert_eq!(config.model_version, "v1.0");
        assert_eq!(config.training.num_epochs, 100);
        assert_eq!(config.training.batch_size, 32);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            checkpoint_dir = "/var/lib/soundscape"
            placement = "gpu"
            model_version = "v2.3"
            "#,
        )
        .unwrap();
        assert_eq!(config.checkpoint_dir, PathBuf::from("/var/lib/soundscape"));
        assert_eq!(config.placement, DevicePlacement::Gpu);
        assert_eq!(config.model_version, "v2.3");
    }

    #[test]
    fn test_bad_placement_rejected() {
        let result = EngineConfig::from_toml_str(r#"placement = "tpu""#);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "model_version = \"v9\"\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.model_version, "v9");
        assert!(matches!(
            EngineConfig::from_file(dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
