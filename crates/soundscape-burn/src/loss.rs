//! Masked multi-task objective.

use crate::batcher::CompositionBatch;
use crate::model::ModelOutput;
use burn::prelude::*;
use burn::tensor::activation::log_softmax;

/// Weighted sum of source cross-entropy, position MSE and volume MSE, each
/// averaged over valid slots only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionLoss {
    pub source_weight: f64,
    pub position_weight: f64,
    pub volume_weight: f64,
}

impl Default for CompositionLoss {
    fn default() -> Self {
        Self {
            source_weight: 1.0,
            position_weight: 0.5,
            volume_weight: 0.3,
        }
    }
}

/// Scalar loss terms, each `[1]`.
#[derive(Debug, Clone)]
pub struct LossOutput<B: Backend> {
    pub total: Tensor<B, 1>,
    pub source: Tensor<B, 1>,
    pub position: Tensor<B, 1>,
    pub volume: Tensor<B, 1>,
}

impl CompositionLoss {
    pub fn new(source_weight: f64, position_weight: f64, volume_weight: f64) -> Self {
        Self {
            source_weight,
            position_weight,
            volume_weight,
        }
    }

    /// `output` rows must line up with the batch's `[N * 16, M]` slots.
    /// Padding contributes nothing; a batch without valid slots scores zero.
    pub fn forward<B: Backend>(
        &self,
        output: &ModelOutput<B>,
        batch: &CompositionBatch<B>,
    ) -> LossOutput<B> {
        let [rows, slots, classes] = output.source_logits.dims();
        let cells = rows * slots;

        let mask = batch.mask.clone().reshape([cells]);
        let weights = mask.clone().float();
        let count = weights.clone().sum().clamp_min(1.0);

        // PAD is out of range for the class axis.
        let targets = batch
            .source_ids
            .clone()
            .reshape([cells])
            .mask_fill(mask.bool_not(), 0);
        let log_probs = log_softmax(output.source_logits.clone().reshape([cells, classes]), 1);
        let picked = log_probs.gather(1, targets.reshape([cells, 1])).reshape([cells]);
        let source = (picked.neg() * weights.clone()).sum() / count.clone();

        let position_error = (output.positions.clone().reshape([cells, 2])
            - batch.positions.clone().reshape([cells, 2]))
        .powf_scalar(2.0)
        .mean_dim(1)
        .reshape([cells]);
        let position = (position_error * weights.clone()).sum() / count.clone();

        let volume_error = (output.volumes.clone().reshape([cells])
            - batch.volumes.clone().reshape([cells]))
        .powf_scalar(2.0);
        let volume = (volume_error * weights).sum() / count;

        let total = source.clone().mul_scalar(self.source_weight)
            + position.clone().mul_scalar(self.position_weight)
            + volume.clone().mul_scalar(self.volume_weight);

        LossOutput {
            total,
            source,
            position,
            volume,
        }
    }
}
