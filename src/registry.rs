//! Per-pack registry of loaded generators.

use parking_lot::{Mutex, RwLock};
use soundscape_burn::checkpoint::{self, CheckpointKind};
use soundscape_burn::{BackendPool, DeviceGenerator, DevicePlacement};
use soundscape_core::Pack;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Shared handle to one pack's generator.
pub type GeneratorHandle = Arc<Mutex<DeviceGenerator>>;

/// Loaded models keyed by pack. Generation takes the read lock; swapping in a
/// retrained model takes the write lock.
#[derive(Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<Pack, GeneratorHandle>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `<pack>_model` from `dir`, replacing any loaded model.
    ///
    /// A missing or unreadable checkpoint, or one trained for another pack,
    /// leaves the pack unloaded and returns `false`.
    pub fn load(
        &self,
        pack: Pack,
        dir: &Path,
        placement: DevicePlacement,
        pool: &BackendPool,
    ) -> bool {
        let stem = checkpoint::checkpoint_stem(dir, pack, CheckpointKind::Current);
        if !checkpoint::exists(&stem) {
            tracing::warn!(
                "No checkpoint for {} at {}, using rule-based generation",
                pack,
                stem.display()
            );
            self.remove(pack);
            return false;
        }

        match DeviceGenerator::load(&stem, placement, pool) {
            Ok(generator) if generator.pack() != pack => {
                tracing::warn!(
                    "Checkpoint {} was trained for {}, not {}; using rule-based generation",
                    stem.display(),
                    generator.pack(),
                    pack
                );
                self.remove(pack);
                false
            }
            Ok(generator) => {
                tracing::info!(
                    "Loaded {} model {} on {:?} ({} params)",
                    pack,
                    generator.version(),
                    generator.placement(),
                    generator.num_params()
                );
                self.insert(pack, generator);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to load {} model: {}", pack, e);
                self.remove(pack);
                false
            }
        }
    }

    pub fn insert(&self, pack: Pack, generator: DeviceGenerator) {
        self.models
            .write()
            .insert(pack, Arc::new(Mutex::new(generator)));
    }

    pub fn remove(&self, pack: Pack) -> Option<GeneratorHandle> {
        self.models.write().remove(&pack)
    }

    pub fn get(&self, pack: Pack) -> Option<GeneratorHandle> {
        self.models.read().get(&pack).cloned()
    }

    pub fn is_loaded(&self, pack: Pack) -> bool {
        self.models.read().contains_key(&pack)
    }

    /// Loaded packs in [`Pack::ALL`] order.
    pub fn loaded_packs(&self) -> Vec<Pack> {
        let models = self.models.read();
        Pack::ALL
            .iter()
            .copied()
            .filter(|pack| models.contains_key(pack))
            .collect()
    }
}
