//! Burn model, trainer and sampler for soundscape compositions.
//!
//! A [`ComposerModel`] is trained per pack on encoded compositions and
//! sampled autoregressively into 16-scene [`GeneratedComposition`]s. Models run
//! on NdArray (CPU) or wgpu (GPU); [`DeviceGenerator`] hides which.
//!
//! ```rust,ignore
//! let pool = BackendPool::new();
//! let stem = checkpoint::checkpoint_stem("models", Pack::Combat, CheckpointKind::Current);
//! let generator = DeviceGenerator::load(&stem, DevicePlacement::Gpu, &pool)?;
//! let composition = generator.generate(0.8, &mut rand::thread_rng())?;
//! ```
//!
//! [`GeneratedComposition`]: soundscape_core::GeneratedComposition

mod backend_pool;
mod batcher;
pub mod checkpoint;
mod dispatch;
mod error;
mod generator;
mod loss;
mod metrics;
pub mod model;
mod scheduler;
mod trainer;

pub use backend_pool::{
    BackendPool, CpuBackend, CpuDevice, CpuTrainBackend, GpuBackend, GpuTrainBackend,
};
pub use batcher::{CompositionBatch, CompositionBatcher};
pub use checkpoint::{CheckpointKind, CheckpointManifest, DEFAULT_MODEL_VERSION};
pub use dispatch::{train_on, DeviceGenerator, DevicePlacement};
pub use error::{Error, Result};
pub use generator::{
    temperature_softmax, validate_temperature, CompositionGenerator, SampledSource,
    MAX_SOURCES_PER_SCENE, MIN_SOURCES_PER_SCENE,
};
pub use loss::{CompositionLoss, LossOutput};
pub use metrics::BatchMetrics;
pub use model::{ComposerModel, ComposerModelConfig, ModelOutput};
pub use scheduler::PlateauScheduler;
pub use trainer::{EpochSummary, Trainer, TrainingConfig, TrainingReport};
