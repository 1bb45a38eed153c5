//! Epoch loop: teacher-forced training, validation, plateau scheduling and
//! checkpointing.

use crate::batcher::CompositionBatcher;
use crate::checkpoint::{self, CheckpointKind, CheckpointManifest, DEFAULT_MODEL_VERSION};
use crate::error::{self, tensor_error, Error};
use crate::loss::CompositionLoss;
use crate::metrics::BatchMetrics;
use crate::model::{ComposerModel, ComposerModelConfig};
use crate::scheduler::PlateauScheduler;
use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use soundscape_core::augment::{augment_all, train_val_split};
use soundscape_core::{encode_all, Composition, EncodedComposition, Pack, SourceVocabulary};
use std::path::{Path, PathBuf};

#[derive(Config, Debug)]
pub struct TrainingConfig {
    #[config(default = "ComposerModelConfig::new()")]
    pub model: ComposerModelConfig,
    #[config(default = 100)]
    pub num_epochs: usize,
    #[config(default = 32)]
    pub batch_size: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    #[config(default = 0.01)]
    pub weight_decay: f32,
    /// Gradient L2-norm clip.
    #[config(default = 1.0)]
    pub grad_clip_norm: f32,
    #[config(default = 10)]
    pub lr_patience: usize,
    #[config(default = 0.5)]
    pub lr_factor: f64,
    /// Write `<pack>_model_epoch{N}` every this many epochs; 0 disables.
    #[config(default = 10)]
    pub checkpoint_every: usize,
    #[config(default = 0.8)]
    pub train_split: f64,
    #[config(default = 0.1)]
    pub volume_jitter: f64,
    /// Fewer user compositions than this aborts the run.
    #[config(default = 10)]
    pub min_compositions: usize,
    #[config(default = 1.0)]
    pub source_weight: f64,
    #[config(default = 0.5)]
    pub position_weight: f64,
    #[config(default = 0.3)]
    pub volume_weight: f64,
    #[config(default = 42)]
    pub seed: u64,
}

impl TrainingConfig {
    pub fn loss(&self) -> CompositionLoss {
        CompositionLoss::new(self.source_weight, self.position_weight, self.volume_weight)
    }

    pub fn validate(&self) -> error::Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be non-zero".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.lr_factor > 0.0 && self.lr_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "lr_factor must be in (0, 1], got {}",
                self.lr_factor
            )));
        }
        if !self.grad_clip_norm.is_finite() || self.grad_clip_norm <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "grad_clip_norm must be positive, got {}",
                self.grad_clip_norm
            )));
        }
        if !self.weight_decay.is_finite() || self.weight_decay < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "weight_decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if !(0.0..1.0).contains(&self.volume_jitter) {
            return Err(Error::InvalidConfig(format!(
                "volume_jitter must be in [0, 1), got {}",
                self.volume_jitter
            )));
        }
        if !(0.0..=1.0).contains(&self.train_split) {
            return Err(Error::InvalidConfig(format!(
                "train_split must be in [0, 1], got {}",
                self.train_split
            )));
        }
        self.model.validate()
    }
}

/// Losses and metrics of one epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: f64,
    pub learning_rate: f64,
    pub metrics: BatchMetrics,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub pack: Pack,
    pub history: Vec<EpochSummary>,
    pub best_val_loss: f64,
    pub best_epoch: Option<usize>,
    pub best_checkpoint: Option<PathBuf>,
    pub epoch_checkpoints: Vec<PathBuf>,
    /// Stem of the promoted current checkpoint.
    pub current_checkpoint: Option<PathBuf>,
}

pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    checkpoint_dir: PathBuf,
    version: String,
    device: B::Device,
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> error::Result<f64> {
    let values = tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(tensor_error)?;
    Ok(values.first().copied().unwrap_or_default())
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(config: TrainingConfig, checkpoint_dir: impl AsRef<Path>, device: B::Device) -> Self {
        Self {
            config,
            checkpoint_dir: checkpoint_dir.as_ref().to_path_buf(),
            version: DEFAULT_MODEL_VERSION.to_string(),
            device,
        }
    }

    /// Version string recorded in written checkpoints.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train a fresh model for `pack` on `compositions`.
    ///
    /// Fails with [`Error::InsufficientData`] before touching any checkpoint
    /// when fewer than `min_compositions` are given.
    pub fn train(&self, pack: Pack, compositions: &[Composition]) -> error::Result<TrainingReport> {
        if compositions.len() < self.config.min_compositions {
            tracing::warn!(
                "Not enough {} compositions to train: {} < {}",
                pack,
                compositions.len(),
                self.config.min_compositions
            );
            return Err(Error::InsufficientData {
                pack,
                found: compositions.len(),
                required: self.config.min_compositions,
            });
        }
        self.config.validate()?;

        let vocabulary = SourceVocabulary::for_pack(pack);
        let model_config = self
            .config
            .model
            .clone()
            .with_num_sources(vocabulary.num_sources());
        let slots = model_config.max_sources_per_scene;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let augmented = augment_all(compositions, self.config.volume_jitter, &mut rng);
        let (train, validation) = train_val_split(augmented, self.config.train_split, &mut rng);
        let train = encode_all(&train, &vocabulary, slots);
        let validation = encode_all(&validation, &vocabulary, slots);
        tracing::info!(
            "Training {} model on {} compositions ({} train / {} validation after augmentation)",
            pack,
            compositions.len(),
            train.len(),
            validation.len()
        );

        let batcher = CompositionBatcher::new(slots);
        let loss_fn = self.config.loss();
        let mut model = model_config.init::<B>(&self.device);
        let mut optim = AdamWConfig::new()
            .with_weight_decay(self.config.weight_decay)
            .with_grad_clipping(Some(GradientClippingConfig::Norm(self.config.grad_clip_norm)))
            .init();
        let mut scheduler = PlateauScheduler::new(
            self.config.learning_rate,
            self.config.lr_factor,
            self.config.lr_patience,
        );

        let best_stem = checkpoint::checkpoint_stem(&self.checkpoint_dir, pack, CheckpointKind::Best);
        let mut report = TrainingReport {
            pack,
            history: Vec::with_capacity(self.config.num_epochs),
            best_val_loss: f64::INFINITY,
            best_epoch: None,
            best_checkpoint: None,
            epoch_checkpoints: Vec::new(),
            current_checkpoint: None,
        };

        for epoch in 1..=self.config.num_epochs {
            let lr = scheduler.lr();

            let mut train_total = 0.0;
            let mut train_batches = 0;
            for batch in batcher.shuffled_batches::<B, _>(
                &train,
                self.config.batch_size,
                &self.device,
                &mut rng,
            ) {
                let output = model.forward(&batch);
                let loss = loss_fn.forward(&output, &batch);
                train_total += scalar(loss.total.clone())?;
                train_batches += 1;

                let grads = GradientsParams::from_grads(loss.total.backward(), &model);
                model = optim.step(lr, model, grads);
            }
            let train_loss = mean(train_total, train_batches);

            let (val_loss, metrics) = match self.evaluate(&model.valid(), &batcher, &validation)? {
                Some(result) => result,
                None => (train_loss, BatchMetrics::default()),
            };
            let next_lr = scheduler.step(val_loss);

            tracing::info!(
                "[{}] epoch {}/{}: train_loss={:.4} val_loss={:.4} acc={:.3} lr={:.2e}",
                pack,
                epoch,
                self.config.num_epochs,
                train_loss,
                val_loss,
                metrics.source_accuracy,
                lr
            );

            if val_loss < report.best_val_loss {
                report.best_val_loss = val_loss;
                report.best_epoch = Some(epoch);
                let manifest = CheckpointManifest::new(
                    &vocabulary,
                    model_config.clone(),
                    self.version.clone(),
                    epoch,
                    val_loss,
                );
                report.best_checkpoint = Some(checkpoint::save(&model.valid(), &manifest, &best_stem)?);
            }

            if self.config.checkpoint_every > 0 && epoch % self.config.checkpoint_every == 0 {
                let manifest = CheckpointManifest::new(
                    &vocabulary,
                    model_config.clone(),
                    self.version.clone(),
                    epoch,
                    val_loss,
                );
                let stem = checkpoint::checkpoint_stem(
                    &self.checkpoint_dir,
                    pack,
                    CheckpointKind::Epoch(epoch),
                );
                report
                    .epoch_checkpoints
                    .push(checkpoint::save(&model.valid(), &manifest, &stem)?);
            }

            report.history.push(EpochSummary {
                epoch,
                train_loss,
                val_loss,
                learning_rate: next_lr,
                metrics,
            });
        }

        if report.best_checkpoint.is_some() {
            let current =
                checkpoint::checkpoint_stem(&self.checkpoint_dir, pack, CheckpointKind::Current);
            checkpoint::promote(&best_stem, &current)?;
            report.current_checkpoint = Some(current);
        } else {
            tracing::warn!("No {} checkpoint improved on the initial loss; nothing promoted", pack);
        }

        tracing::info!(
            "Finished training {} model: best val_loss {:.4} at epoch {:?}",
            pack,
            report.best_val_loss,
            report.best_epoch
        );
        Ok(report)
    }

    /// Mean validation loss and metrics, or `None` without validation data.
    fn evaluate(
        &self,
        model: &ComposerModel<B::InnerBackend>,
        batcher: &CompositionBatcher,
        validation: &[EncodedComposition],
    ) -> error::Result<Option<(f64, BatchMetrics)>> {
        if validation.is_empty() {
            return Ok(None);
        }

        let loss_fn = self.config.loss();
        let mut total = 0.0;
        let mut batches = 0;
        let mut metrics = BatchMetrics::default();
        for batch in batcher.batches::<B::InnerBackend>(validation, self.config.batch_size, &self.device) {
            let output = model.forward(&batch);
            total += scalar(loss_fn.forward(&output, &batch).total)?;
            metrics = metrics.merge(BatchMetrics::compute(&output, &batch)?);
            batches += 1;
        }
        Ok(Some((mean(total, batches), metrics)))
    }
}
