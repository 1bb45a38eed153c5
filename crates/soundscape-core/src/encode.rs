//! Fixed-shape encoding of compositions.
//!
//! Each composition becomes a `[16, slots]` grid. Every placed source whose
//! name is in the vocabulary takes the next free slot of its scene; remaining
//! slots keep the PAD token, zero attributes and `mask = false`. Positions are
//! stored normalized to `[0, 1]` by the canvas size.

use crate::composition::{Composition, CANVAS_HEIGHT, CANVAS_WIDTH, NUM_SCENES};
use crate::vocabulary::SourceVocabulary;

/// Default padded width of a scene.
pub const DEFAULT_MAX_SOURCES_PER_SCENE: usize = 20;

/// Pixel position -> normalized `[0, 1]` pair.
pub fn normalize_position(x: f64, y: f64) -> (f32, f32) {
    (
        (x / CANVAS_WIDTH).clamp(0.0, 1.0) as f32,
        (y / CANVAS_HEIGHT).clamp(0.0, 1.0) as f32,
    )
}

/// Normalized pair -> pixel position. Exact inverse of [`normalize_position`]
/// for in-canvas coordinates, up to `f32` precision.
pub fn denormalize_position(nx: f32, ny: f32) -> (f64, f64) {
    (
        (nx as f64 * CANVAS_WIDTH).clamp(0.0, CANVAS_WIDTH),
        (ny as f64 * CANVAS_HEIGHT).clamp(0.0, CANVAS_HEIGHT),
    )
}

/// A single occupied slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedSlot {
    pub token: usize,
    pub x: f32,
    pub y: f32,
    pub volume: f32,
}

/// One composition flattened into row-major `[16, slots]` buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedComposition {
    slots: usize,
    /// `[16 * slots]` token indices, PAD where empty.
    pub source_ids: Vec<i64>,
    /// `[16 * slots * 2]` normalized `(x, y)` pairs.
    pub positions: Vec<f32>,
    /// `[16 * slots]` volumes.
    pub volumes: Vec<f32>,
    /// `[16 * slots]`, true where the slot holds a real source.
    pub mask: Vec<bool>,
}

impl EncodedComposition {
    /// All-padding grid.
    pub fn empty(vocabulary: &SourceVocabulary, slots: usize) -> Self {
        let cells = NUM_SCENES * slots;
        Self {
            slots,
            source_ids: vec![vocabulary.pad_index() as i64; cells],
            positions: vec![0.0; cells * 2],
            volumes: vec![0.0; cells],
            mask: vec![false; cells],
        }
    }

    /// Encode a raw composition.
    ///
    /// Scenes with an out-of-range or repeated id are skipped. Sources missing
    /// from the vocabulary are dropped without consuming a slot, and scenes are
    /// truncated to `slots` sources.
    pub fn encode(composition: &Composition, vocabulary: &SourceVocabulary, slots: usize) -> Self {
        let mut encoded = Self::empty(vocabulary, slots);
        let mut seen = [false; NUM_SCENES];

        for scene in &composition.scenes {
            let Some(scene_index) = scene.index() else {
                tracing::warn!("Skipping scene with out-of-range id {}", scene.id);
                continue;
            };
            if seen[scene_index] {
                tracing::warn!("Skipping duplicate scene id {}", scene.id);
                continue;
            }
            seen[scene_index] = true;

            let mut next = 0;
            for source in &scene.placed_sources {
                if next == slots {
                    tracing::debug!(
                        "Scene {} truncated to {} sources ({} placed)",
                        scene.id,
                        slots,
                        scene.placed_sources.len()
                    );
                    break;
                }
                let Some(token) = vocabulary.index(&source.source_id) else {
                    tracing::debug!("Unknown source '{}' in scene {}", source.source_id, scene.id);
                    continue;
                };

                let cell = scene_index * slots + next;
                let (nx, ny) = normalize_position(source.x, source.y);
                encoded.source_ids[cell] = token as i64;
                encoded.positions[cell * 2] = nx;
                encoded.positions[cell * 2 + 1] = ny;
                encoded.volumes[cell] = source.volume.clamp(0.0, 1.0) as f32;
                encoded.mask[cell] = true;
                next += 1;
            }
        }

        encoded
    }

    /// Padded width of each scene.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Number of occupied slots.
    pub fn valid_slots(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn slot(&self, scene: usize, slot: usize) -> Option<EncodedSlot> {
        if scene >= NUM_SCENES || slot >= self.slots {
            return None;
        }
        let cell = scene * self.slots + slot;
        if !self.mask[cell] {
            return None;
        }
        Some(EncodedSlot {
            token: self.source_ids[cell] as usize,
            x: self.positions[cell * 2],
            y: self.positions[cell * 2 + 1],
            volume: self.volumes[cell],
        })
    }

    /// Pixel position of an occupied slot.
    pub fn pixel_position(&self, scene: usize, slot: usize) -> Option<(f64, f64)> {
        self.slot(scene, slot)
            .map(|s| denormalize_position(s.x, s.y))
    }
}

/// Encode many compositions with the same vocabulary and width.
pub fn encode_all(
    compositions: &[Composition],
    vocabulary: &SourceVocabulary,
    slots: usize,
) -> Vec<EncodedComposition> {
    compositions
        .iter()
        .map(|c| EncodedComposition::encode(c, vocabulary, slots))
        .collect()
}
