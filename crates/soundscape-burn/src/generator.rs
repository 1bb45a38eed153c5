//! Autoregressive sampling of complete compositions.
//!
//! Every scene runs a small state machine: `Start` seeds the token sequence
//! with START, each `Generating` step samples one placed source from the
//! model's prediction for the last position, and `Done` is reached after the
//! scene's source count (uniform in `2..=6`). All 16 scenes share one
//! standard-normal memory drawn at the start of the composition.

use crate::checkpoint;
use crate::error::{tensor_error, Error, Result};
use crate::model::ComposerModel;
use burn::prelude::*;
use burn::tensor::activation::softmax;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_distr::StandardNormal;
use soundscape_core::{
    denormalize_position, GeneratedComposition, Pack, PlacedSource, Scene, SourceVocabulary,
    NUM_SCENES,
};
use std::path::Path;

/// Inclusive bounds of sources generated per scene.
pub const MIN_SOURCES_PER_SCENE: usize = 2;
pub const MAX_SOURCES_PER_SCENE: usize = 6;

/// Reject temperatures outside `(0, inf)`.
pub fn validate_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTemperature(temperature))
    }
}

/// `softmax(logits / temperature)` over the last axis.
pub fn temperature_softmax<B: Backend, const D: usize>(
    logits: Tensor<B, D>,
    temperature: f64,
) -> Tensor<B, D> {
    softmax(logits.div_scalar(temperature), D - 1)
}

/// One sampled placed source, in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledSource {
    pub token: usize,
    /// Normalized `(x, y)`.
    pub position: (f32, f32),
    pub volume: f32,
}

enum SceneState {
    Start,
    Generating { step: usize, tokens: Vec<i64> },
    Done,
}

/// A trained model bound to its vocabulary and device.
pub struct CompositionGenerator<B: Backend> {
    model: ComposerModel<B>,
    vocabulary: SourceVocabulary,
    version: String,
    device: B::Device,
}

impl<B: Backend> CompositionGenerator<B> {
    pub fn new(
        model: ComposerModel<B>,
        vocabulary: SourceVocabulary,
        version: impl Into<String>,
        device: B::Device,
    ) -> Self {
        Self {
            model,
            vocabulary,
            version: version.into(),
            device,
        }
    }

    /// Load the checkpoint at `stem` onto `device`.
    pub fn load(stem: &Path, device: &B::Device) -> Result<Self> {
        let (model, manifest) = checkpoint::load::<B>(stem, device)?;
        tracing::info!(
            "Loaded {} model {} (epoch {}, val_loss {:.4})",
            manifest.pack,
            manifest.version,
            manifest.epoch,
            manifest.val_loss
        );
        Ok(Self::new(
            model,
            manifest.vocabulary()?,
            manifest.version.clone(),
            device.clone(),
        ))
    }

    pub fn pack(&self) -> Pack {
        self.vocabulary.pack()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn vocabulary(&self) -> &SourceVocabulary {
        &self.vocabulary
    }

    pub fn num_params(&self) -> usize {
        self.model.num_params()
    }

    /// Unconditioned `[1, 1, H]` memory.
    fn placeholder_memory<R: Rng + ?Sized>(&self, rng: &mut R) -> Tensor<B, 3> {
        let hidden = self.model.hidden_dim();
        let values = (0..hidden)
            .map(|_| Distribution::<f32>::sample(&StandardNormal, rng))
            .collect::<Vec<_>>();
        Tensor::from_data(TensorData::new(values, [1, 1, hidden]), &self.device)
    }

    /// Sample the source that follows `tokens`.
    pub fn sample_next<R: Rng + ?Sized>(
        &self,
        tokens: &[i64],
        memory: &Tensor<B, 3>,
        temperature: f64,
        rng: &mut R,
    ) -> Result<SampledSource> {
        validate_temperature(temperature)?;

        let input = Tensor::<B, 2, Int>::from_data(
            TensorData::new(tokens.to_vec(), [1, tokens.len()]),
            &self.device,
        );
        let output = self.model.next_source(input, memory.clone());
        let classes = output.source_logits.dims()[2];

        let probabilities = temperature_softmax(output.source_logits.reshape([classes]), temperature)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(tensor_error)?;
        let token = WeightedIndex::new(&probabilities)
            .map_err(|e| Error::Sampling(e.to_string()))?
            .sample(rng);

        let position = output
            .positions
            .reshape([2])
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(tensor_error)?;
        let volume = output
            .volumes
            .reshape([1])
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(tensor_error)?;

        Ok(SampledSource {
            token,
            position: (position[0], position[1]),
            volume: volume[0],
        })
    }

    fn placed(&self, scene: usize, idx: usize, sampled: SampledSource) -> PlacedSource {
        let source_id = self
            .vocabulary
            .name(sampled.token)
            .or_else(|| self.vocabulary.name(0))
            .unwrap_or_default();
        let (x, y) = denormalize_position(sampled.position.0, sampled.position.1);
        PlacedSource {
            id: format!("gen_{}_{}", scene, idx),
            source_id: source_id.to_string(),
            x,
            y,
            volume: (sampled.volume as f64).clamp(0.0, 1.0),
            muted: false,
        }
    }

    fn generate_scene<R: Rng + ?Sized>(
        &self,
        scene: usize,
        count: usize,
        memory: &Tensor<B, 3>,
        temperature: f64,
        rng: &mut R,
    ) -> Result<Scene> {
        let mut placed = Vec::with_capacity(count);
        let mut state = SceneState::Start;

        loop {
            state = match state {
                SceneState::Start => SceneState::Generating {
                    step: 0,
                    tokens: vec![self.model.start_index() as i64],
                },
                SceneState::Generating { step, .. } if step == count => SceneState::Done,
                SceneState::Generating { step, mut tokens } => {
                    let sampled = self.sample_next(&tokens, memory, temperature, rng)?;
                    tokens.push(sampled.token as i64);
                    placed.push(self.placed(scene, step, sampled));
                    SceneState::Generating {
                        step: step + 1,
                        tokens,
                    }
                }
                SceneState::Done => break,
            };
        }

        Ok(Scene::with_sources(scene as i32, placed))
    }

    /// Sample a full 16-scene composition.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        temperature: f64,
        rng: &mut R,
    ) -> Result<GeneratedComposition> {
        validate_temperature(temperature)?;

        let memory = self.placeholder_memory(rng);
        let mut scenes = Vec::with_capacity(NUM_SCENES);
        for scene in 0..NUM_SCENES {
            let count = rng.gen_range(MIN_SOURCES_PER_SCENE..=MAX_SOURCES_PER_SCENE);
            scenes.push(self.generate_scene(scene, count, &memory, temperature, rng)?);
        }

        tracing::debug!(
            "Generated {} composition with {} sources",
            self.pack(),
            scenes.iter().map(|s| s.placed_sources.len()).sum::<usize>()
        );
        Ok(GeneratedComposition::new(
            self.pack(),
            scenes,
            self.version.clone(),
        ))
    }
}
