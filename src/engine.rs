//! ComposerEngine: the serving boundary for learned composition.

use crate::config::EngineConfig;
use crate::registry::ModelRegistry;
use crate::Result;
use rand::RngCore;
use serde::Serialize;
use soundscape_burn::{train_on, validate_temperature, BackendPool, DevicePlacement, TrainingReport};
use soundscape_core::{CompositionSource, FallbackGenerator, GeneratedComposition, Pack};
use std::panic::AssertUnwindSafe;
use uuid::Uuid;

/// Generates compositions per pack from loaded models, falling back to the
/// rule-based generator whenever no model can serve the request.
///
/// # Example
///
/// ```ignore
/// use soundscape::prelude::*;
///
/// let engine = ComposerEngine::builder()
///     .checkpoint_dir("models")
///     .placement(DevicePlacement::Gpu)
///     .build()?;
///
/// let composition = engine.generate(Pack::Combat, 0.8);
/// if let Some(report) = engine.train(Pack::Combat, &source).await? {
///     println!("best val loss {}", report.best_val_loss);
/// }
/// ```
pub struct ComposerEngine {
    config: EngineConfig,
    pool: BackendPool,
    registry: ModelRegistry,
    fallback: Box<dyn FallbackGenerator>,
}

/// Snapshot of one pack's model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackStatus {
    pub pack: Pack,
    pub loaded: bool,
    pub version: Option<String>,
    pub num_params: Option<usize>,
    pub placement: Option<DevicePlacement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    /// Compute backend serving requests.
    pub device: String,
    pub has_gpu: bool,
    pub packs: Vec<PackStatus>,
}

impl EngineStatus {
    pub fn pack(&self, pack: Pack) -> Option<&PackStatus> {
        self.packs.iter().find(|status| status.pack == pack)
    }
}

impl ComposerEngine {
    pub fn builder() -> crate::ComposerEngineBuilder {
        crate::ComposerEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        pool: BackendPool,
        fallback: Box<dyn FallbackGenerator>,
    ) -> Self {
        let engine = Self {
            config,
            pool,
            registry: ModelRegistry::new(),
            fallback,
        };
        for pack in Pack::ALL {
            engine.reload(pack);
        }
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn has_gpu(&self) -> bool {
        self.pool.has_gpu()
    }

    /// Re-read the current checkpoint of `pack` from disk.
    pub fn reload(&self, pack: Pack) -> bool {
        self.registry.load(
            pack,
            &self.config.checkpoint_dir,
            self.config.placement,
            &self.pool,
        )
    }

    /// Generate a composition with a thread-local RNG.
    pub fn generate(&self, pack: Pack, temperature: f64) -> GeneratedComposition {
        let mut rng = rand::thread_rng();
        self.generate_with_rng(pack, temperature, &mut rng)
    }

    /// Generate a composition. Never fails: invalid temperatures, missing
    /// models, sampling errors and model panics all produce a rule-based
    /// composition.
    pub fn generate_with_rng(
        &self,
        pack: Pack,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> GeneratedComposition {
        if let Err(e) = validate_temperature(temperature) {
            tracing::warn!("{}; using rule-based generation for {}", e, pack);
            return self.fallback.generate(pack, rng);
        }

        let Some(generator) = self.registry.get(pack) else {
            tracing::debug!("No model loaded for {}, using rule-based generation", pack);
            return self.fallback.generate(pack, rng);
        };

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            generator.lock().generate(temperature, &mut *rng)
        }));
        match outcome {
            Ok(Ok(composition)) => composition,
            Ok(Err(e)) => {
                tracing::error!("Generation failed for {}: {}; using rule-based", pack, e);
                self.fallback.generate(pack, rng)
            }
            Err(_) => {
                tracing::error!("Model for {} panicked during generation; using rule-based", pack);
                self.fallback.generate(pack, rng)
            }
        }
    }

    /// Train `pack` on the user compositions of `source` and serve the result.
    ///
    /// Returns `Ok(None)` when the source holds too few compositions; nothing
    /// is written in that case.
    pub async fn train<S: CompositionSource>(
        &self,
        pack: Pack,
        source: &S,
    ) -> Result<Option<TrainingReport>> {
        let run_id = Uuid::new_v4();
        tracing::info!("Training run {} started for {}", run_id, pack);

        let compositions = source.load_user_compositions(pack).await?;
        tracing::info!(
            "Training run {}: {} user compositions loaded",
            run_id,
            compositions.len()
        );

        let report = match train_on(
            self.config.placement,
            &self.pool,
            self.config.training.clone(),
            &self.config.checkpoint_dir,
            &self.config.model_version,
            pack,
            &compositions,
        ) {
            Ok(report) => report,
            Err(soundscape_burn::Error::InsufficientData { found, required, .. }) => {
                tracing::warn!(
                    "Training run {} aborted: {} compositions, need {}",
                    run_id,
                    found,
                    required
                );
                return Ok(None);
            }
            Err(e) => {
                tracing::error!("Training run {} failed: {}", run_id, e);
                return Err(e.into());
            }
        };

        tracing::info!(
            "Training run {} finished: best val loss {:.4} at epoch {:?}",
            run_id,
            report.best_val_loss,
            report.best_epoch
        );
        if report.current_checkpoint.is_some() {
            self.reload(pack);
        }
        Ok(Some(report))
    }

    pub fn status(&self) -> EngineStatus {
        let packs = Pack::ALL
            .iter()
            .map(|&pack| match self.registry.get(pack) {
                Some(handle) => {
                    let generator = handle.lock();
                    PackStatus {
                        pack,
                        loaded: true,
                        version: Some(generator.version().to_string()),
                        num_params: Some(generator.num_params()),
                        placement: Some(generator.placement()),
                    }
                }
                None => PackStatus {
                    pack,
                    loaded: false,
                    version: None,
                    num_params: None,
                    placement: None,
                },
            })
            .collect();

        EngineStatus {
            device: self.config.placement.backend_name(&self.pool),
            has_gpu: self.pool.has_gpu(),
            packs,
        }
    }
}
