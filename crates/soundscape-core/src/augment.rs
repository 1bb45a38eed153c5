//! Training-set augmentation and splitting.
//!
//! Augmentations produce new compositions; the input is never mutated.

use crate::composition::{Composition, CANVAS_WIDTH};
use rand::seq::SliceRandom;
use rand::Rng;

/// Default relative volume jitter.
pub const DEFAULT_VOLUME_JITTER: f64 = 0.1;

/// Default train fraction of a split.
pub const DEFAULT_TRAIN_SPLIT: f64 = 0.8;

/// Horizontal mirror: `x' = canvas_width - x`, everything else unchanged.
pub fn mirror(composition: &Composition) -> Composition {
    let mut mirrored = composition.clone();
    for source in mirrored
        .scenes
        .iter_mut()
        .flat_map(|s| s.placed_sources.iter_mut())
    {
        source.x = CANVAS_WIDTH - source.x;
    }
    mirrored
}

/// Scale every volume by an independent `U(1 - epsilon, 1 + epsilon)` factor,
/// clipped to `[0, 1]`.
pub fn jitter_volume<R: Rng + ?Sized>(
    composition: &Composition,
    epsilon: f64,
    rng: &mut R,
) -> Composition {
    let epsilon = epsilon.abs();
    let mut jittered = composition.clone();
    for source in jittered
        .scenes
        .iter_mut()
        .flat_map(|s| s.placed_sources.iter_mut())
    {
        let factor = rng.gen_range((1.0 - epsilon)..=(1.0 + epsilon));
        source.volume = (source.volume * factor).clamp(0.0, 1.0);
    }
    jittered
}

/// The original plus its mirrored and volume-jittered variants.
pub fn augment<R: Rng + ?Sized>(
    composition: &Composition,
    epsilon: f64,
    rng: &mut R,
) -> Vec<Composition> {
    vec![
        composition.clone(),
        mirror(composition),
        jitter_volume(composition, epsilon, rng),
    ]
}

/// [`augment`] applied to every composition, in order.
pub fn augment_all<R: Rng + ?Sized>(
    compositions: &[Composition],
    epsilon: f64,
    rng: &mut R,
) -> Vec<Composition> {
    compositions
        .iter()
        .flat_map(|c| augment(c, epsilon, rng))
        .collect()
}

/// Shuffle, then split into `(train, validation)` at `floor(len * ratio)`.
pub fn train_val_split<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    ratio: f64,
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    items.shuffle(rng);
    let split = ((items.len() as f64) * ratio.clamp(0.0, 1.0)).floor() as usize;
    let validation = items.split_off(split.min(items.len()));
    (items, validation)
}
