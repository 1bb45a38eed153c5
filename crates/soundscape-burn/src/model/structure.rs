//! Bidirectional encoder over every placed source of a composition.

use burn::nn::transformer::{TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput};
use burn::prelude::*;

#[derive(Config, Debug)]
pub struct StructureEncoderConfig {
    pub hidden_dim: usize,
    pub num_heads: usize,
    pub num_layers: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

#[derive(Module, Debug)]
pub struct StructureEncoder<B: Backend> {
    transformer: TransformerEncoder<B>,
}

impl StructureEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> StructureEncoder<B> {
        StructureEncoder {
            transformer: TransformerEncoderConfig::new(
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

impl<B: Backend> StructureEncoder<B> {
    /// `features [N, S, H]` with `padding [N, S]` (true = empty slot) -> `[N, S, H]`.
    pub fn forward(&self, features: Tensor<B, 3>, padding: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        self.transformer
            .forward(TransformerEncoderInput::new(features).mask_pad(padding))
    }

    /// Mean over valid slots: `[N, S, H]`, `valid [N, S]` -> `[N, 1, H]`.
    ///
    /// A row with no valid slot pools to zeros.
    pub fn pool(encoded: Tensor<B, 3>, valid: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let weights = valid.float().unsqueeze_dim::<3>(2);
        let count = weights.clone().sum_dim(1).clamp_min(1.0);
        (encoded * weights).sum_dim(1) / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_pool_ignores_padding() {
        let device = Default::default();
        let encoded = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0, 100.0, 100.0], [1, 3, 2]),
            &device,
        );
        let valid = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![true, true, false], [1, 3]),
            &device,
        );

        let pooled = StructureEncoder::pool(encoded, valid);
        assert_eq!(pooled.dims(), [1, 1, 2]);
        let values = pooled.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert_abs_diff_eq!(values[0], 2.0);
        assert_abs_diff_eq!(values[1], 3.0);
    }

    #[test]
    fn test_pool_empty_row_is_zero() {
        let device = Default::default();
        let encoded = Tensor::<TestBackend, 3>::ones([2, 4, 3], &device);
        let valid = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![false; 8], [2, 4]),
            &device,
        );
        let sum = StructureEncoder::pool(encoded, valid)
            .abs()
            .sum()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .unwrap();
        assert_abs_diff_eq!(sum[0], 0.0);
    }

    #[test]
    fn test_forward_shape_with_padding() {
        let device = Default::default();
        let encoder = StructureEncoderConfig::new(8, 2, 1)
            .with_dropout(0.0)
            .init::<TestBackend>(&device);
        let features = Tensor::<TestBackend, 3>::ones([2, 6, 8], &device);
        let padding = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(
                vec![
                    false, false, true, true, true, true, false, true, true, true, true, true,
                ],
                [2, 6],
            ),
            &device,
        );
        assert_eq!(encoder.forward(features, padding).dims(), [2, 6, 8]);
    }
}
