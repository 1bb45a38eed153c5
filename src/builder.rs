//! Builder for configuring and constructing a `ComposerEngine`.

use crate::config::EngineConfig;
use crate::{ComposerEngine, Result};
use soundscape_burn::{BackendPool, DevicePlacement, TrainingConfig};
use soundscape_core::{FallbackGenerator, RuleBasedGenerator};
use std::path::PathBuf;

/// The current checkpoint of every pack is loaded from the checkpoint
/// directory at build time. Packs without a readable checkpoint are served by
/// the fallback generator until a training run succeeds.
///
/// GPU placement is only a request: without a usable adapter models run on
/// the CPU.
///
/// # Example
///
/// ```ignore
/// use soundscape::prelude::*;
///
/// let engine = ComposerEngine::builder()
///     .config(EngineConfig::from_file("soundscape.toml")?)
///     .fallback(MyTableGenerator::new())
///     .build()?;
/// ```
pub struct ComposerEngineBuilder {
    config: EngineConfig,
    fallback: Option<Box<dyn FallbackGenerator>>,
    cpu_only: bool,
}

impl Default for ComposerEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            fallback: None,
            cpu_only: false,
        }
    }
}

impl ComposerEngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: `models`
    pub fn checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.checkpoint_dir = dir.into();
        self
    }

    /// Default: CPU
    pub fn placement(mut self, placement: DevicePlacement) -> Self {
        self.config.placement = placement;
        self
    }

    pub fn model_version(mut self, version: impl Into<String>) -> Self {
        self.config.model_version = version.into();
        self
    }

    pub fn training(mut self, training: TrainingConfig) -> Self {
        self.config.training = training;
        self
    }

    /// Use a custom fallback instead of [`RuleBasedGenerator`].
    pub fn fallback(mut self, fallback: impl FallbackGenerator + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Skip GPU detection entirely.
    pub fn cpu_only(mut self) -> Self {
        self.cpu_only = true;
        self
    }

    pub fn build(self) -> Result<ComposerEngine> {
        self.config.training.validate()?;

        let pool = if self.cpu_only || self.config.placement == DevicePlacement::Cpu {
            BackendPool::cpu_only()
        } else {
            BackendPool::new()
        };
        if self.config.placement == DevicePlacement::Gpu && !pool.has_gpu() {
            tracing::warn!("GPU placement requested but no adapter found, using CPU");
        }

        let fallback = self
            .fallback
            .unwrap_or_else(|| Box::new(RuleBasedGenerator::new()));

        Ok(ComposerEngine::from_parts(self.config, pool, fallback))
    }
}
