//! # Soundscape - Learned Multi-Scene Composition
//!
//! Generates 16-scene soundscape compositions per content pack from models
//! trained on user-authored examples.
//!
//! ## Architecture
//!
//! Soundscape is an umbrella crate that coordinates:
//! - **soundscape-core** - Data model, pack vocabularies, encoding, augmentation, fallback
//! - **soundscape-burn** - Transformer model, trainer, sampler, checkpoints (CPU/GPU)
//!
//! and adds the serving side: [`ComposerEngine`] owns a per-pack
//! [`ModelRegistry`], answers generation requests (falling back to rule-based
//! generation when no model can serve), and runs training against a
//! [`CompositionSource`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use soundscape::prelude::*;
//!
//! let engine = ComposerEngine::builder()
//!     .checkpoint_dir("models")
//!     .build()?;
//!
//! // Learned model if one is loaded for the pack, rule-based otherwise
//! let composition = engine.generate(Pack::Adventure, 1.0);
//!
//! // Retrain from user data and hot-swap the served model
//! engine.train(Pack::Adventure, &source).await?;
//! ```

/// Re-export of soundscape-core for direct access
pub use soundscape_core as core;

/// Re-export of soundscape-burn for direct access
pub use soundscape_burn as model;

pub use soundscape_core::{
    Arrangement, Composition, CompositionSource, FallbackGenerator, GeneratedComposition,
    InMemorySource, Pack, PlacedSource, RuleBasedGenerator, Scene, SourceVocabulary, Token,
    CANVAS_HEIGHT, CANVAS_WIDTH, NUM_SCENES, RULE_BASED_VERSION,
};

pub use soundscape_core::metrics::{diversity_score, musicality_score};

pub use soundscape_burn::{
    BackendPool, ComposerModelConfig, DevicePlacement, EpochSummary, TrainingConfig,
    TrainingReport,
};

mod builder;
mod config;
mod engine;
mod error;
mod registry;

pub use builder::ComposerEngineBuilder;
pub use config::EngineConfig;
pub use engine::{ComposerEngine, EngineStatus, PackStatus};
pub use error::{Error, Result};
pub use registry::{GeneratorHandle, ModelRegistry};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{ComposerEngine, ComposerEngineBuilder, EngineConfig};

    // Data model
    pub use crate::{Composition, GeneratedComposition, Pack, PlacedSource, Scene};

    // Collaborators
    pub use crate::{CompositionSource, FallbackGenerator, InMemorySource};

    // Model
    pub use crate::{DevicePlacement, TrainingConfig, TrainingReport};
}
