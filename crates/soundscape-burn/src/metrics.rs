//! Validation metrics over valid slots.

use crate::batcher::CompositionBatch;
use crate::error::{tensor_error, Result};
use crate::model::ModelOutput;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Source accuracy and attribute errors, averaged over valid slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub source_accuracy: f64,
    /// Mean absolute error of normalized `(x, y)`.
    pub position_mae: f64,
    pub volume_mae: f64,
    pub valid_slots: usize,
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> Result<f64> {
    let values = tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(tensor_error)?;
    Ok(values.first().copied().unwrap_or_default())
}

impl BatchMetrics {
    pub fn compute<B: Backend>(output: &ModelOutput<B>, batch: &CompositionBatch<B>) -> Result<Self> {
        let [rows, slots, _] = output.source_logits.dims();
        let cells = rows * slots;

        let mask = batch.mask.clone().reshape([cells]);
        let weights = mask.float();
        let valid = scalar(weights.clone().sum())?;
        if valid == 0.0 {
            return Ok(Self::default());
        }

        let predicted = output.source_logits.clone().argmax(2).reshape([cells]);
        let targets = batch.source_ids.clone().reshape([cells]);
        let correct = predicted.equal(targets).float() * weights.clone();

        let position_error = (output.positions.clone().reshape([cells, 2])
            - batch.positions.clone().reshape([cells, 2]))
        .abs()
        .mean_dim(1)
        .reshape([cells]);

        let volume_error = (output.volumes.clone().reshape([cells])
            - batch.volumes.clone().reshape([cells]))
        .abs();

        Ok(Self {
            source_accuracy: scalar(correct.sum())? / valid,
            position_mae: scalar((position_error * weights.clone()).sum())? / valid,
            volume_mae: scalar((volume_error * weights).sum())? / valid,
            valid_slots: valid.round() as usize,
        })
    }

    /// Slot-weighted mean of two partial results.
    pub fn merge(self, other: Self) -> Self {
        let total = self.valid_slots + other.valid_slots;
        if total == 0 {
            return Self::default();
        }
        let (a, b) = (self.valid_slots as f64, other.valid_slots as f64);
        let mix = |x: f64, y: f64| (x * a + y * b) / total as f64;
        Self {
            source_accuracy: mix(self.source_accuracy, other.source_accuracy),
            position_mae: mix(self.position_mae, other.position_mae),
            volume_mae: mix(self.volume_mae, other.volume_mae),
            valid_slots: total,
        }
    }
}
