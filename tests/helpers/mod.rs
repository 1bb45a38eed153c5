//! Test helpers and fixtures for soundscape integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `PIXEL_EPSILON` (1e-3): Canvas coordinates after normalization round-trips
//! - `SCORE_EPSILON` (1e-9): Heuristic scores computed in f64

#![allow(dead_code)]

pub mod tolerances;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use soundscape::prelude::*;
use soundscape::{ComposerModelConfig, SourceVocabulary, NUM_SCENES};
use std::path::Path;

/// Seed shared by deterministic tests.
pub const TEST_SEED: u64 = 7;

/// Small enough to train in a test: one layer, width 16.
pub fn tiny_model_config() -> ComposerModelConfig {
    ComposerModelConfig::new()
        .with_embedding_dim(8)
        .with_position_dim(4)
        .with_hidden_dim(16)
        .with_num_heads(2)
        .with_num_layers(1)
        .with_dropout(0.0)
        .with_max_sources_per_scene(4)
}

/// A two-epoch run that checkpoints every epoch.
pub fn quick_training_config() -> TrainingConfig {
    TrainingConfig::new()
        .with_model(tiny_model_config())
        .with_num_epochs(2)
        .with_batch_size(8)
        .with_checkpoint_every(1)
        .with_seed(TEST_SEED)
}

/// CPU engine serving from `dir` and training with [`quick_training_config`].
pub fn test_engine(dir: &Path) -> ComposerEngine {
    ComposerEngine::builder()
        .checkpoint_dir(dir)
        .model_version("v-test")
        .training(quick_training_config())
        .cpu_only()
        .build()
        .expect("Failed to create test engine")
}

/// A plausible user composition: 2 to 5 vocabulary sources in every scene.
pub fn user_composition(pack: Pack, seed: u64) -> Composition {
    let vocabulary = SourceVocabulary::for_pack(pack);
    let names = vocabulary.names();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut composition = Composition::empty(pack);
    for (scene_id, scene) in composition.scenes.iter_mut().enumerate() {
        let count = rng.gen_range(2..=5);
        scene.placed_sources = (0..count)
            .map(|i| {
                let name = &names[rng.gen_range(0..names.len())];
                PlacedSource::new(
                    format!("user_{}_{}", scene_id, i),
                    name.clone(),
                    rng.gen_range(0.0..=1000.0),
                    rng.gen_range(0.0..=600.0),
                    rng.gen_range(0.3..=1.0),
                )
            })
            .collect();
    }
    composition
}

pub fn user_compositions(pack: Pack, count: usize) -> Vec<Composition> {
    (0..count)
        .map(|i| user_composition(pack, TEST_SEED + i as u64))
        .collect()
}

/// In-memory source holding `count` compositions of `pack`.
pub fn source_with(pack: Pack, count: usize) -> InMemorySource {
    InMemorySource::from_compositions(user_compositions(pack, count))
}

/// Assert the generation output contract.
pub fn assert_valid_generated(composition: &GeneratedComposition) {
    assert_eq!(composition.scenes.len(), NUM_SCENES);
    for (i, scene) in composition.scenes.iter().enumerate() {
        assert_eq!(scene.id, i as i32, "scene ids must be 0..15 in order");
        for source in &scene.placed_sources {
            assert!(
                (0.0..=1000.0).contains(&source.x),
                "x {} out of canvas",
                source.x
            );
            assert!(
                (0.0..=600.0).contains(&source.y),
                "y {} out of canvas",
                source.y
            );
            assert!(
                (0.0..=1.0).contains(&source.volume),
                "volume {} out of range",
                source.volume
            );
        }
    }
    assert!(composition.validate().is_ok());
}

/// Shannon entropy of the source ids used across `compositions`.
pub fn source_entropy(compositions: &[GeneratedComposition]) -> f64 {
    let mut counts = std::collections::HashMap::new();
    let mut total = 0usize;
    for composition in compositions {
        for scene in &composition.scenes {
            for source in &scene.placed_sources {
                *counts.entry(source.source_id.as_str()).or_insert(0usize) += 1;
                total += 1;
            }
        }
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.ln()
        })
        .sum()
}
