//! Stacking encoded compositions into device tensors.

use burn::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use soundscape_core::{EncodedComposition, NUM_SCENES};

/// Padded, masked batch of `N` compositions with `M` slots per scene.
#[derive(Debug, Clone)]
pub struct CompositionBatch<B: Backend> {
    /// `[N, 16, M]`, PAD where empty.
    pub source_ids: Tensor<B, 3, Int>,
    /// `[N, 16, M, 2]`, normalized to `[0, 1]`.
    pub positions: Tensor<B, 4>,
    /// `[N, 16, M]`.
    pub volumes: Tensor<B, 3>,
    /// `[N, 16, M]`, true where a slot holds a real source.
    pub mask: Tensor<B, 3, Bool>,
}

impl<B: Backend> CompositionBatch<B> {
    pub fn len(&self) -> usize {
        self.source_ids.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompositionBatcher {
    slots: usize,
}

impl CompositionBatcher {
    pub fn new(slots: usize) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Stack `items` on `device`. Every item must be encoded with this
    /// batcher's slot width.
    pub fn batch<B: Backend>(
        &self,
        items: &[EncodedComposition],
        device: &B::Device,
    ) -> CompositionBatch<B> {
        let n = items.len();
        let cells = NUM_SCENES * self.slots;

        let mut source_ids = Vec::with_capacity(n * cells);
        let mut positions = Vec::with_capacity(n * cells * 2);
        let mut volumes = Vec::with_capacity(n * cells);
        let mut mask = Vec::with_capacity(n * cells);
        for item in items {
            debug_assert_eq!(item.slots(), self.slots);
            source_ids.extend_from_slice(&item.source_ids);
            positions.extend_from_slice(&item.positions);
            volumes.extend_from_slice(&item.volumes);
            mask.extend_from_slice(&item.mask);
        }

        CompositionBatch {
            source_ids: Tensor::from_data(
                TensorData::new(source_ids, [n, NUM_SCENES, self.slots]),
                device,
            ),
            positions: Tensor::from_data(
                TensorData::new(positions, [n, NUM_SCENES, self.slots, 2]),
                device,
            ),
            volumes: Tensor::from_data(
                TensorData::new(volumes, [n, NUM_SCENES, self.slots]),
                device,
            ),
            mask: Tensor::from_data(TensorData::new(mask, [n, NUM_SCENES, self.slots]), device),
        }
    }

    /// Consecutive batches of at most `batch_size` items.
    pub fn batches<'a, B: Backend>(
        &'a self,
        items: &'a [EncodedComposition],
        batch_size: usize,
        device: &'a B::Device,
    ) -> impl Iterator<Item = CompositionBatch<B>> + 'a {
        items
            .chunks(batch_size.max(1))
            .map(move |chunk| self.batch::<B>(chunk, device))
    }

    /// Like [`batches`](Self::batches), in a fresh random order.
    pub fn shuffled_batches<B: Backend, R: Rng + ?Sized>(
        &self,
        items: &[EncodedComposition],
        batch_size: usize,
        device: &B::Device,
        rng: &mut R,
    ) -> Vec<CompositionBatch<B>> {
        let mut order = items.iter().collect::<Vec<_>>();
        order.shuffle(rng);
        order
            .chunks(batch_size.max(1))
            .map(|chunk| {
                let owned = chunk.iter().map(|&item| item.clone()).collect::<Vec<_>>();
                self.batch::<B>(&owned, device)
            })
            .collect()
    }
}
