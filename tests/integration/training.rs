//! End-to-end training through the engine

use crate::helpers::*;
use soundscape::model::checkpoint::{self, CheckpointKind};
use soundscape::prelude::*;

#[tokio::test]
async fn test_nine_compositions_abort_without_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path());

    let report = engine
        .train(Pack::Shelter, &source_with(Pack::Shelter, 9))
        .await
        .unwrap();

    assert!(report.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(!engine.registry().is_loaded(Pack::Shelter));
}

#[tokio::test]
async fn test_other_packs_do_not_count() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path());

    let mut source = source_with(Pack::Combat, 5);
    for composition in user_compositions(Pack::Adventure, 10) {
        source.insert(composition);
    }

    let report = engine.train(Pack::Combat, &source).await.unwrap();
    assert!(report.is_none());
}

#[tokio::test]
async fn test_ten_compositions_train_and_serve() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path());

    let report = engine
        .train(Pack::Combat, &source_with(Pack::Combat, 10))
        .await
        .unwrap()
        .expect("10 compositions is enough to train");

    assert_eq!(report.pack, Pack::Combat);
    assert_eq!(report.history.len(), 2);
    assert_eq!(report.history[0].epoch, 1);
    assert!(report.best_val_loss.is_finite());

    // Epoch 1 always improves on an infinite best.
    let best = checkpoint::checkpoint_stem(dir.path(), Pack::Combat, CheckpointKind::Best);
    assert!(checkpoint::exists(&best));
    let epoch1 = checkpoint::checkpoint_stem(dir.path(), Pack::Combat, CheckpointKind::Epoch(1));
    assert!(report.epoch_checkpoints.contains(&epoch1));
    let current = checkpoint::checkpoint_stem(dir.path(), Pack::Combat, CheckpointKind::Current);
    assert_eq!(report.current_checkpoint.as_deref(), Some(current.as_path()));

    let manifest = checkpoint::load_manifest(&current).unwrap();
    assert_eq!(manifest.version, "v-test");
    assert_eq!(manifest.source_mapping.len(), 32);

    // The promoted model is hot-swapped into the registry.
    assert!(engine.registry().is_loaded(Pack::Combat));
    assert!(!engine.registry().is_loaded(Pack::Adventure));
    let status = engine.status();
    let combat = status.pack(Pack::Combat).unwrap();
    assert!(combat.loaded);
    assert_eq!(combat.version.as_deref(), Some("v-test"));
    assert!(combat.num_params.unwrap_or(0) > 0);

    let composition = engine.generate(Pack::Combat, 1.0);
    assert_eq!(composition.model_version, "v-test");
    assert_valid_generated(&composition);
}

#[tokio::test]
async fn test_new_engine_loads_trained_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    {
        let engine = test_engine(dir.path());
        engine
            .train(Pack::Adventure, &source_with(Pack::Adventure, 10))
            .await
            .unwrap();
    }

    let engine = test_engine(dir.path());
    assert_eq!(engine.registry().loaded_packs(), vec![Pack::Adventure]);
}

#[tokio::test]
async fn test_empty_source() {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path());
    let report = engine
        .train(Pack::Adventure, &InMemorySource::new())
        .await
        .unwrap();
    assert!(report.is_none());
}
