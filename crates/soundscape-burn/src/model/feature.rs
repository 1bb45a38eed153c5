//! Per-source feature fusion.

use burn::nn::{Embedding, EmbeddingConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

#[derive(Config, Debug)]
pub struct FeatureEncoderConfig {
    /// Embedding rows: real sources plus PAD.
    pub vocab_size: usize,
    #[config(default = 64)]
    pub embedding_dim: usize,
    #[config(default = 32)]
    pub position_dim: usize,
    #[config(default = 256)]
    pub hidden_dim: usize,
}

/// Fuses `[token embedding, position MLP(x, y), volume]` into one
/// `hidden_dim` vector per placed source.
#[derive(Module, Debug)]
pub struct FeatureEncoder<B: Backend> {
    token_embedding: Embedding<B>,
    position_in: Linear<B>,
    position_out: Linear<B>,
    projection: Linear<B>,
}

impl FeatureEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeatureEncoder<B> {
        FeatureEncoder {
            token_embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            position_in: LinearConfig::new(2, self.position_dim).init(device),
            position_out: LinearConfig::new(self.position_dim, self.position_dim).init(device),
            projection: LinearConfig::new(self.embedding_dim + self.position_dim + 1, self.hidden_dim)
                .init(device),
        }
    }
}

impl<B: Backend> FeatureEncoder<B> {
    /// `tokens [N, S]`, `positions [N, S, 2]`, `volumes [N, S]` -> `[N, S, H]`.
    pub fn forward(
        &self,
        tokens: Tensor<B, 2, Int>,
        positions: Tensor<B, 3>,
        volumes: Tensor<B, 2>,
    ) -> Tensor<B, 3> {
        let tokens = self.token_embedding.forward(tokens);
        let positions = self
            .position_out
            .forward(relu(self.position_in.forward(positions)));
        let volumes = volumes.unsqueeze_dim::<3>(2);

        self.projection
            .forward(Tensor::cat(vec![tokens, positions, volumes], 2))
    }

    /// Token-only input for decoding: zero position, unit volume.
    pub fn forward_tokens(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch, seq] = tokens.dims();
        let device = tokens.device();
        self.forward(
            tokens,
            Tensor::zeros([batch, seq, 2], &device),
            Tensor::ones([batch, seq], &device),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let encoder = FeatureEncoderConfig::new(9)
            .with_embedding_dim(8)
            .with_position_dim(4)
            .with_hidden_dim(16)
            .init::<TestBackend>(&device);

        let tokens = Tensor::<TestBackend, 2, Int>::zeros([3, 5], &device);
        let positions = Tensor::<TestBackend, 3>::ones([3, 5, 2], &device);
        let volumes = Tensor::<TestBackend, 2>::ones([3, 5], &device);

        assert_eq!(encoder.forward(tokens.clone(), positions, volumes).dims(), [3, 5, 16]);
        assert_eq!(encoder.forward_tokens(tokens).dims(), [3, 5, 16]);
    }
}
