//! Source, position and volume projections.

use super::ModelOutput;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;

#[derive(Module, Debug)]
pub struct OutputHeads<B: Backend> {
    source: Linear<B>,
    position: Linear<B>,
    volume: Linear<B>,
}

impl<B: Backend> OutputHeads<B> {
    pub fn new(hidden_dim: usize, num_sources: usize, device: &B::Device) -> Self {
        Self {
            source: LinearConfig::new(hidden_dim, num_sources).init(device),
            position: LinearConfig::new(hidden_dim, 2).init(device),
            volume: LinearConfig::new(hidden_dim, 1).init(device),
        }
    }

    /// `[N, S, H]` -> logits `[N, S, V]`, positions `[N, S, 2]` and volumes
    /// `[N, S]`, the latter two squashed to `[0, 1]`.
    pub fn forward(&self, state: Tensor<B, 3>) -> ModelOutput<B> {
        let [batch, seq, _] = state.dims();
        ModelOutput {
            source_logits: self.source.forward(state.clone()),
            positions: sigmoid(self.position.forward(state.clone())),
            volumes: sigmoid(self.volume.forward(state)).reshape([batch, seq]),
        }
    }
}
