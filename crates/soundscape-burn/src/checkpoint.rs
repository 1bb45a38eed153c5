//! Checkpoint files: `<stem>.mpk` weights plus a `<stem>.json` manifest.
//!
//! Stems are per pack: `<pack>_model` (current), `<pack>_model_best` and
//! `<pack>_model_epoch{N}`.

use crate::error::{Error, Result};
use crate::model::{ComposerModel, ComposerModelConfig};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use serde::{Deserialize, Serialize};
use soundscape_core::{Pack, SourceVocabulary};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

/// Version string written by default.
pub const DEFAULT_MODEL_VERSION: &str = "v1.0";

const WEIGHTS_EXTENSION: &str = "mpk";
const MANIFEST_EXTENSION: &str = "json";

type Recorder = NamedMpkFileRecorder<FullPrecisionSettings>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    /// The checkpoint served for a pack.
    Current,
    Best,
    Epoch(usize),
}

impl CheckpointKind {
    pub fn stem(&self, pack: Pack) -> String {
        match self {
            CheckpointKind::Current => format!("{}_model", pack),
            CheckpointKind::Best => format!("{}_model_best", pack),
            CheckpointKind::Epoch(epoch) => format!("{}_model_epoch{}", pack, epoch),
        }
    }
}

/// `dir/<stem>` without extension.
pub fn checkpoint_stem(dir: impl AsRef<Path>, pack: Pack, kind: CheckpointKind) -> PathBuf {
    dir.as_ref().join(kind.stem(pack))
}

pub fn weights_path(stem: &Path) -> PathBuf {
    stem.with_extension(WEIGHTS_EXTENSION)
}

pub fn manifest_path(stem: &Path) -> PathBuf {
    stem.with_extension(MANIFEST_EXTENSION)
}

/// Both files of a checkpoint are present.
pub fn exists(stem: &Path) -> bool {
    weights_path(stem).is_file() && manifest_path(stem).is_file()
}

/// Everything besides the weights needed to rebuild and serve a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointManifest {
    pub pack: Pack,
    pub num_sources: usize,
    pub version: String,
    /// Source name of every token index, in order.
    pub source_mapping: Vec<String>,
    pub epoch: usize,
    pub val_loss: f64,
    pub model: ComposerModelConfig,
}

impl CheckpointManifest {
    pub fn new(
        vocabulary: &SourceVocabulary,
        model: ComposerModelConfig,
        version: impl Into<String>,
        epoch: usize,
        val_loss: f64,
    ) -> Self {
        Self {
            pack: vocabulary.pack(),
            num_sources: vocabulary.num_sources(),
            version: version.into(),
            source_mapping: vocabulary.names().to_vec(),
            epoch,
            val_loss,
            model,
        }
    }

    pub fn vocabulary(&self) -> Result<SourceVocabulary> {
        Ok(SourceVocabulary::from_mapping(
            self.pack,
            self.source_mapping.clone(),
        )?)
    }

    /// Sizes recorded in the manifest must agree with each other.
    pub fn validate(&self) -> Result<()> {
        if self.source_mapping.len() != self.num_sources {
            return Err(Error::Checkpoint(format!(
                "source mapping has {} entries, manifest says {}",
                self.source_mapping.len(),
                self.num_sources
            )));
        }
        if self.model.num_sources != self.num_sources {
            return Err(Error::Checkpoint(format!(
                "model expects {} sources, manifest says {}",
                self.model.num_sources, self.num_sources
            )));
        }
        self.model.validate()
    }
}

/// Write weights and manifest under `stem`.
pub fn save<B: Backend>(
    model: &ComposerModel<B>,
    manifest: &CheckpointManifest,
    stem: &Path,
) -> Result<PathBuf> {
    if let Some(dir) = stem.parent() {
        std::fs::create_dir_all(dir)?;
    }
    model
        .clone()
        .save_file(weights_path(stem), &Recorder::new())?;
    std::fs::write(manifest_path(stem), serde_json::to_vec_pretty(manifest)?)?;

    tracing::debug!("Saved checkpoint {}", stem.display());
    Ok(stem.to_path_buf())
}

pub fn load_manifest(stem: &Path) -> Result<CheckpointManifest> {
    let bytes = std::fs::read(manifest_path(stem))?;
    let manifest: CheckpointManifest = serde_json::from_slice(&bytes)?;
    manifest.validate()?;
    Ok(manifest)
}

/// Rebuild the model described by the manifest and load its weights.
///
/// Weights that do not fit the manifest's architecture are rejected here, so
/// a loaded model can always run a decoding step.
pub fn load<B: Backend>(
    stem: &Path,
    device: &B::Device,
) -> Result<(ComposerModel<B>, CheckpointManifest)> {
    let manifest = load_manifest(stem)?;
    let model = manifest.model.init::<B>(device);
    let expected_params = model.num_params();
    let model = model.load_file(weights_path(stem), &Recorder::new(), device)?;

    if model.num_params() != expected_params {
        return Err(Error::Checkpoint(format!(
            "{} holds {} parameters, manifest architecture has {}",
            weights_path(stem).display(),
            model.num_params(),
            expected_params
        )));
    }
    check_decoding_step(&model, device)?;
    Ok((model, manifest))
}

/// Run one START step against a zero memory.
fn check_decoding_step<B: Backend>(model: &ComposerModel<B>, device: &B::Device) -> Result<()> {
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let tokens = Tensor::<B, 2, Int>::full([1, 1], model.start_index() as i64, device);
        let memory = Tensor::<B, 3>::zeros([1, 1, model.hidden_dim()], device);
        let logits = model.next_source(tokens, memory).source_logits;
        let dims = logits.dims();
        let _ = logits.into_data();
        dims
    }));

    match outcome {
        Ok([1, 1, classes]) if classes == model.num_sources() => Ok(()),
        Ok(dims) => Err(Error::Checkpoint(format!(
            "source head produces {:?}, expected [1, 1, {}]",
            dims,
            model.num_sources()
        ))),
        Err(_) => Err(Error::Checkpoint(
            "weights do not match the manifest architecture".into(),
        )),
    }
}

/// Copy checkpoint `from` over `to`.
pub fn promote(from: &Path, to: &Path) -> Result<()> {
    if !exists(from) {
        return Err(Error::Checkpoint(format!(
            "cannot promote missing checkpoint {}",
            from.display()
        )));
    }
    std::fs::copy(weights_path(from), weights_path(to))?;
    std::fs::copy(manifest_path(from), manifest_path(to))?;
    tracing::info!("Promoted {} -> {}", from.display(), to.display());
    Ok(())
}
