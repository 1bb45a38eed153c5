//! CPU/GPU dispatch for generators and training runs.
//!
//! A generator is placed on either NdArray or wgpu when it is loaded.
//! [`DeviceGenerator`] wraps both instantiations behind one sampling call.

use crate::backend_pool::{
    BackendPool, CpuBackend, CpuTrainBackend, GpuBackend, GpuTrainBackend,
};
use crate::error::Result;
use crate::generator::CompositionGenerator;
use crate::trainer::{Trainer, TrainingConfig, TrainingReport};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use soundscape_core::{Composition, GeneratedComposition, Pack};
use std::path::Path;

/// Where a model should execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlacement {
    /// CPU via NdArray backend (always available).
    #[default]
    Cpu,
    /// GPU via wgpu (requires an adapter).
    Gpu,
}

impl DevicePlacement {
    /// `self`, downgraded to CPU when the pool has no GPU.
    pub fn effective(self, pool: &BackendPool) -> Self {
        match self {
            DevicePlacement::Gpu if pool.has_gpu() => DevicePlacement::Gpu,
            _ => DevicePlacement::Cpu,
        }
    }

    /// Display name of the compute backend.
    pub fn backend_name(self, pool: &BackendPool) -> String {
        match (self.effective(pool), pool.gpu_name()) {
            (DevicePlacement::Gpu, Some(name)) => format!("Burn/wgpu {}", name),
            (DevicePlacement::Gpu, None) => "Burn/wgpu".into(),
            (DevicePlacement::Cpu, _) => "Burn/NdArray".into(),
        }
    }
}

/// A loaded generator on either device.
pub enum DeviceGenerator {
    Cpu(CompositionGenerator<CpuBackend>),
    Gpu(CompositionGenerator<GpuBackend>),
}

impl DeviceGenerator {
    /// Load the checkpoint at `stem` onto the effective device of `placement`.
    pub fn load(stem: &Path, placement: DevicePlacement, pool: &BackendPool) -> Result<Self> {
        match (placement.effective(pool), pool.gpu_device()) {
            (DevicePlacement::Gpu, Some(device)) => Ok(DeviceGenerator::Gpu(
                CompositionGenerator::load(stem, &**device)?,
            )),
            _ => Ok(DeviceGenerator::Cpu(CompositionGenerator::load(
                stem,
                &**pool.cpu_device(),
            )?)),
        }
    }

    pub fn generate(
        &self,
        temperature: f64,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedComposition> {
        match self {
            DeviceGenerator::Cpu(generator) => generator.generate(temperature, rng),
            DeviceGenerator::Gpu(generator) => generator.generate(temperature, rng),
        }
    }

    pub fn placement(&self) -> DevicePlacement {
        match self {
            DeviceGenerator::Cpu(_) => DevicePlacement::Cpu,
            DeviceGenerator::Gpu(_) => DevicePlacement::Gpu,
        }
    }

    pub fn pack(&self) -> Pack {
        match self {
            DeviceGenerator::Cpu(generator) => generator.pack(),
            DeviceGenerator::Gpu(generator) => generator.pack(),
        }
    }

    pub fn version(&self) -> &str {
        match self {
            DeviceGenerator::Cpu(generator) => generator.version(),
            DeviceGenerator::Gpu(generator) => generator.version(),
        }
    }

    pub fn num_params(&self) -> usize {
        match self {
            DeviceGenerator::Cpu(generator) => generator.num_params(),
            DeviceGenerator::Gpu(generator) => generator.num_params(),
        }
    }
}

/// Run a training job on the effective device of `placement`.
pub fn train_on(
    placement: DevicePlacement,
    pool: &BackendPool,
    config: TrainingConfig,
    checkpoint_dir: &Path,
    version: &str,
    pack: Pack,
    compositions: &[Composition],
) -> Result<TrainingReport> {
    match (placement.effective(pool), pool.gpu_device()) {
        (DevicePlacement::Gpu, Some(device)) => {
            Trainer::<GpuTrainBackend>::new(config, checkpoint_dir, (**device).clone())
                .with_version(version)
                .train(pack, compositions)
        }
        _ => Trainer::<CpuTrainBackend>::new(config, checkpoint_dir, (**pool.cpu_device()).clone())
            .with_version(version)
            .train(pack, compositions),
    }
}
