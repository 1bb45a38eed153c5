//! Engine construction, checkpoint loading and fallback integration tests

use crate::helpers::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use soundscape::prelude::*;
use soundscape::model::checkpoint::{self, CheckpointKind};
use soundscape::model::{CheckpointManifest, CpuBackend};
use soundscape::{Scene, SourceVocabulary, NUM_SCENES, RULE_BASED_VERSION};
use std::fs;

/// Fallback that always returns empty scenes.
struct SilentFallback;

impl FallbackGenerator for SilentFallback {
    fn generate(&self, pack: Pack, _rng: &mut dyn RngCore) -> GeneratedComposition {
        let scenes = (0..NUM_SCENES as i32).map(Scene::new).collect();
        GeneratedComposition::new(pack, scenes, "silent")
    }
}

#[test]
fn test_missing_checkpoints_serve_rule_based() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path());

    let mut rng = StdRng::seed_from_u64(TEST_SEED);
    for pack in Pack::ALL {
        let composition = engine.generate_with_rng(pack, 1.0, &mut rng);
        assert_eq!(composition.model_version, RULE_BASED_VERSION);
        assert_valid_generated(&composition);
    }
}

#[test]
fn test_corrupt_checkpoint_serves_rule_based() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("adventure_model.mpk"), b"\x00\x01garbage").unwrap();
    fs::write(
        dir.path().join("adventure_model.json"),
        br#"{"pack":"adventure","num_sources":32}"#,
    )
    .unwrap();

    let engine = test_engine(dir.path());
    assert!(!engine.registry().is_loaded(Pack::Adventure));

    let composition = engine.generate(Pack::Adventure, 0.8);
    assert!(composition.is_rule_based());
    assert_valid_generated(&composition);
}

fn save_combat_checkpoint(dir: &std::path::Path, stem_pack: Pack, manifest_hidden_dim: usize) {
    let model = tiny_model_config().init::<CpuBackend>(&Default::default());
    let manifest = CheckpointManifest::new(
        &SourceVocabulary::for_pack(Pack::Combat),
        tiny_model_config().with_hidden_dim(manifest_hidden_dim),
        "v-test",
        1,
        0.5,
    );
    let stem = checkpoint::checkpoint_stem(dir, stem_pack, CheckpointKind::Current);
    checkpoint::save(&model, &manifest, &stem).unwrap();
}

#[test]
fn test_weights_disagreeing_with_manifest_serve_rule_based() {
    let dir = tempfile::tempdir().unwrap();
    save_combat_checkpoint(dir.path(), Pack::Combat, 32);

    let engine = test_engine(dir.path());
    assert!(!engine.registry().is_loaded(Pack::Combat));

    let mut rng = StdRng::seed_from_u64(TEST_SEED);
    let composition = engine.generate_with_rng(Pack::Combat, 1.0, &mut rng);
    assert!(composition.is_rule_based());
    assert_valid_generated(&composition);
}

#[test]
fn test_checkpoint_of_other_pack_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    save_combat_checkpoint(dir.path(), Pack::Adventure, 16);

    let engine = test_engine(dir.path());
    assert!(engine.registry().loaded_packs().is_empty());

    let composition = engine.generate(Pack::Adventure, 1.0);
    assert_eq!(composition.pack, Pack::Adventure);
    assert!(composition.is_rule_based());
}

#[test]
fn test_custom_fallback_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ComposerEngine::builder()
        .checkpoint_dir(dir.path())
        .fallback(SilentFallback)
        .cpu_only()
        .build()
        .unwrap();

    let composition = engine.generate(Pack::Combat, 1.0);
    assert_eq!(composition.model_version, "silent");
    assert_eq!(composition.scenes.len(), NUM_SCENES);
    assert!(composition.scenes.iter().all(|s| s.placed_sources.is_empty()));
}

#[test]
fn test_engine_from_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("soundscape.toml");
    fs::write(
        &path,
        format!(
            "checkpoint_dir = {:?}\nplacement = \"cpu\"\nmodel_version = \"v3\"\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    let engine = ComposerEngine::builder()
        .config(config)
        .cpu_only()
        .build()
        .unwrap();

    assert_eq!(engine.config().model_version, "v3");
    assert_eq!(engine.config().checkpoint_dir, dir.path());
}

#[test]
fn test_status_reports_every_pack() {
    let dir = tempfile::tempdir().unwrap();
    let status = test_engine(dir.path()).status();

    assert_eq!(status.packs.len(), Pack::ALL.len());
    for pack in Pack::ALL {
        let pack_status = status.pack(pack).unwrap();
        assert!(!pack_status.loaded);
        assert!(pack_status.num_params.is_none());
    }
}
