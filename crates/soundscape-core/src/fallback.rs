//! Rule-based fallback generation.
//!
//! Used whenever no trained model is available for a pack or learned
//! generation fails. Sources come from a small curated table per pack and are
//! placed uniformly at random.

use crate::composition::{PlacedSource, Scene, NUM_SCENES};
use crate::output::{GeneratedComposition, RULE_BASED_VERSION};
use crate::pack::Pack;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Produces complete compositions without a learned model.
pub trait FallbackGenerator: Send + Sync {
    fn generate(&self, pack: Pack, rng: &mut dyn RngCore) -> GeneratedComposition;
}

/// Curated music/ambience sources per pack.
fn curated(pack: Pack) -> (&'static [&'static str], &'static [&'static str]) {
    match pack {
        Pack::Adventure => (
            &["adv-hero", "adv-drums", "adv-flute", "adv-strings"],
            &["adv-birds", "adv-wind", "adv-grass"],
        ),
        Pack::Combat => (
            &["cmb-warrior", "cmb-war_drums", "cmb-horn", "cmb-heavy_bass"],
            &["cmb-sword_clash", "cmb-fire", "cmb-thunder"],
        ),
        Pack::Shelter => (
            &["shl-melody", "shl-piano", "shl-harp", "shl-pad"],
            &["shl-fireplace", "shl-rain", "shl-night"],
        ),
    }
}

/// Every scene gets 2 to 4 distinct music sources placed uniformly within a
/// 50px margin of the canvas edges, plus the full ambience bed within a 100px
/// margin.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedGenerator;

impl RuleBasedGenerator {
    pub fn new() -> Self {
        Self
    }

    fn scene(&self, pack: Pack, id: usize, rng: &mut dyn RngCore) -> Scene {
        let (music, ambience) = curated(pack);
        let count = rng.gen_range(2..=4).min(music.len());
        let mut placed = Vec::with_capacity(count + ambience.len());

        for (idx, source_id) in music.choose_multiple(rng, count).enumerate() {
            placed.push(PlacedSource {
                id: format!("source_{}_{}", id, idx),
                source_id: (*source_id).to_string(),
                x: rng.gen_range(50.0..=950.0),
                y: rng.gen_range(50.0..=550.0),
                volume: rng.gen_range(0.7..=1.0),
                muted: false,
            });
        }

        for (idx, source_id) in ambience.iter().enumerate() {
            placed.push(PlacedSource {
                id: format!("amb_{}_{}", id, idx),
                source_id: (*source_id).to_string(),
                x: rng.gen_range(100.0..=900.0),
                y: rng.gen_range(100.0..=500.0),
                volume: rng.gen_range(0.5..=0.8),
                muted: false,
            });
        }

        Scene::with_sources(id as i32, placed)
    }
}

impl FallbackGenerator for RuleBasedGenerator {
    fn generate(&self, pack: Pack, rng: &mut dyn RngCore) -> GeneratedComposition {
        tracing::info!("Generating rule-based composition for {}", pack);
        let scenes = (0..NUM_SCENES).map(|id| self.scene(pack, id, rng)).collect();
        GeneratedComposition::new(pack, scenes, RULE_BASED_VERSION)
    }
}
