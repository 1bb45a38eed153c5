//! Composition transformer: feature fusion, structure encoder, causal
//! decoder and output heads.
//!
//! Training runs the whole stack over a [`CompositionBatch`]: the structure
//! encoder contextualizes every placed source of a composition, its valid
//! slots are mean-pooled into a one-step memory, and the decoder is
//! teacher-forced per scene on `[START, s_0, .., s_{M-2}]` to predict
//! `[s_0, .., s_{M-1}]`. Generation calls [`ComposerModel::next_source`]
//! with a caller-provided memory.

mod decoder;
mod feature;
mod heads;
mod structure;

pub use decoder::{AutoregressiveDecoder, AutoregressiveDecoderConfig};
pub use feature::{FeatureEncoder, FeatureEncoderConfig};
pub use heads::OutputHeads;
pub use structure::{StructureEncoder, StructureEncoderConfig};

use crate::batcher::CompositionBatch;
use crate::error::{self, Error};
use burn::prelude::*;
use soundscape_core::{SourceVocabulary, Token, DEFAULT_MAX_SOURCES_PER_SCENE};

/// Hyper-parameters of [`ComposerModel`]. Stored in every checkpoint manifest.
#[derive(Config, Debug)]
pub struct ComposerModelConfig {
    /// Real sources in the vocabulary; heads predict over these.
    #[config(default = 32)]
    pub num_sources: usize,
    #[config(default = 64)]
    pub embedding_dim: usize,
    #[config(default = 32)]
    pub position_dim: usize,
    #[config(default = 256)]
    pub hidden_dim: usize,
    #[config(default = 8)]
    pub num_heads: usize,
    #[config(default = 6)]
    pub num_layers: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
    /// Padded width of a scene.
    #[config(default = 20)]
    pub max_sources_per_scene: usize,
}

impl ComposerModelConfig {
    /// Default hyper-parameters sized for `vocabulary`.
    pub fn for_vocabulary(vocabulary: &SourceVocabulary) -> Self {
        Self::new()
            .with_num_sources(vocabulary.num_sources())
            .with_max_sources_per_scene(DEFAULT_MAX_SOURCES_PER_SCENE)
    }

    pub fn validate(&self) -> error::Result<()> {
        if self.num_sources < 2 {
            return Err(Error::InvalidConfig(format!(
                "num_sources must be at least 2, got {}",
                self.num_sources
            )));
        }
        if self.num_heads == 0 || self.hidden_dim % self.num_heads != 0 {
            return Err(Error::InvalidConfig(format!(
                "hidden_dim {} is not divisible by num_heads {}",
                self.hidden_dim, self.num_heads
            )));
        }
        if self.num_layers == 0 || self.max_sources_per_scene == 0 {
            return Err(Error::InvalidConfig(
                "num_layers and max_sources_per_scene must be non-zero".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ComposerModel<B> {
        ComposerModel {
            features: FeatureEncoderConfig::new(self.num_sources + 1)
                .with_embedding_dim(self.embedding_dim)
                .with_position_dim(self.position_dim)
                .with_hidden_dim(self.hidden_dim)
                .init(device),
            encoder: StructureEncoderConfig::new(self.hidden_dim, self.num_heads, self.num_layers)
                .with_dropout(self.dropout)
                .init(device),
            decoder: AutoregressiveDecoderConfig::new(
                self.hidden_dim,
                self.num_heads,
                self.num_layers,
            )
            .with_dropout(self.dropout)
            .init(device),
            heads: OutputHeads::new(self.hidden_dim, self.num_sources, device),
            num_sources: self.num_sources,
            hidden_dim: self.hidden_dim,
        }
    }
}

/// Raw head outputs. The leading dims are `[rows, positions]`.
#[derive(Debug, Clone)]
pub struct ModelOutput<B: Backend> {
    pub source_logits: Tensor<B, 3>,
    /// Normalized `(x, y)` in `[0, 1]`.
    pub positions: Tensor<B, 3>,
    pub volumes: Tensor<B, 2>,
}

#[derive(Module, Debug)]
pub struct ComposerModel<B: Backend> {
    pub features: FeatureEncoder<B>,
    pub encoder: StructureEncoder<B>,
    pub decoder: AutoregressiveDecoder<B>,
    pub heads: OutputHeads<B>,
    num_sources: usize,
    hidden_dim: usize,
}

impl<B: Backend> ComposerModel<B> {
    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Index fed as the first decoder token.
    pub fn start_index(&self) -> usize {
        Token::Start.index(self.num_sources)
    }

    /// Encode every composition of the batch and pool it to `[N, 1, H]`.
    pub fn encode(&self, batch: &CompositionBatch<B>) -> Tensor<B, 3> {
        let [n, scenes, slots] = batch.source_ids.dims();
        let seq = scenes * slots;

        let valid = batch.mask.clone().reshape([n, seq]);
        let features = self.features.forward(
            batch.source_ids.clone().reshape([n, seq]),
            batch.positions.clone().reshape([n, seq, 2]),
            batch.volumes.clone().reshape([n, seq]),
        );
        let encoded = self.encoder.forward(features, valid.clone().bool_not());
        StructureEncoder::pool(encoded, valid)
    }

    /// Teacher-forced pass over every scene. Output rows are
    /// `composition * 16 + scene`, positions are slots.
    pub fn forward(&self, batch: &CompositionBatch<B>) -> ModelOutput<B> {
        let [n, scenes, slots] = batch.source_ids.dims();
        let rows = n * scenes;
        let device = batch.source_ids.device();

        let memory = self.encode(batch);
        let hidden = memory.dims()[2];
        let memory = memory.repeat_dim(1, scenes).reshape([rows, 1, hidden]);

        let start =
            Tensor::<B, 2, Int>::full([rows, 1], self.start_index() as i64, &device);
        let inputs = if slots > 1 {
            let previous = batch
                .source_ids
                .clone()
                .reshape([rows, slots])
                .narrow(1, 0, slots - 1);
            Tensor::cat(vec![start, previous], 1)
        } else {
            start
        };

        let decoded = self
            .decoder
            .forward(self.features.forward_tokens(inputs), memory);
        self.heads.forward(decoded)
    }

    /// Predictions for the token after `tokens [N, S]`, each output `[N, 1, *]`.
    pub fn next_source(&self, tokens: Tensor<B, 2, Int>, memory: Tensor<B, 3>) -> ModelOutput<B> {
        let decoded = self
            .decoder
            .forward(self.features.forward_tokens(tokens), memory);
        let seq = decoded.dims()[1];
        self.heads.forward(decoded.narrow(1, seq - 1, 1))
    }
}
