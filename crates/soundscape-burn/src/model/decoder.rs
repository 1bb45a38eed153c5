//! Causal decoder producing one placed source per position.

use burn::nn::attention::generate_autoregressive_mask;
use burn::nn::transformer::{TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct AutoregressiveDecoderConfig {
    pub hidden_dim: usize,
    pub num_heads: usize,
    pub num_layers: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

#[derive(Module, Debug)]
pub struct AutoregressiveDecoder<B: Backend> {
    transformer: TransformerDecoder<B>,
}

impl AutoregressiveDecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AutoregressiveDecoder<B> {
        AutoregressiveDecoder {
            transformer: TransformerDecoderConfig::new(
                self.hidden_dim,
                self.hidden_dim * 4,
                self.num_heads,
                self.num_layers,
            )
            .with_dropout(self.dropout)
            .init(device),
        }
    }
}

impl<B: Backend> AutoregressiveDecoder<B> {
    /// Causal self-attention over `target [N, S, H]` plus cross-attention to
    /// `memory [N, M, H]`. Position `t` only sees positions `<= t`.
    pub fn forward(&self, target: Tensor<B, 3>, memory: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, _] = target.dims();
        let causal = generate_autoregressive_mask::<B>(batch, seq, &target.device());
        self.transformer
            .forward(TransformerDecoderInput::new(target, memory).target_mask_attn(causal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_prefix_outputs_do_not_see_future() {
        let device = Default::default();
        let decoder = AutoregressiveDecoderConfig::new(8, 2, 1)
            .with_dropout(0.0)
            .init::<TestBackend>(&device);
        let memory = Tensor::<TestBackend, 3>::ones([1, 1, 8], &device);

        let full = Tensor::<TestBackend, 3>::random(
            [1, 4, 8],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let prefix = full.clone().narrow(1, 0, 2);

        let full_out = decoder.forward(full, memory.clone()).narrow(1, 0, 2);
        let prefix_out = decoder.forward(prefix, memory);

        let diff = (full_out - prefix_out)
            .abs()
            .max()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .unwrap();
        assert!(diff[0] < 1e-4, "causal leak: {}", diff[0]);
    }
}
