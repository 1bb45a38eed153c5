//! Compute devices with automatic GPU detection.

use crate::error::{Error, Result};
use burn::backend::wgpu::{init_device, RuntimeOptions, WgpuDevice, WgpuSetup};
use burn::backend::{Autodiff, NdArray};
use std::sync::Arc;
use wgpu::{Backends, DeviceDescriptor, Features, Limits, PowerPreference};

pub type GpuBackend = burn::backend::wgpu::Wgpu;
pub type CpuBackend = NdArray;
pub type GpuTrainBackend = Autodiff<GpuBackend>;
pub type CpuTrainBackend = Autodiff<CpuBackend>;
pub type CpuDevice = burn::backend::ndarray::NdArrayDevice;

/// The CPU device and, when an adapter could be opened, a wgpu device.
pub struct BackendPool {
    gpu_device: Option<Arc<WgpuDevice>>,
    gpu_name: Option<String>,
    cpu_device: Arc<CpuDevice>,
}

impl BackendPool {
    /// Probe for a GPU; a missing adapter is not an error.
    pub fn new() -> Self {
        let (gpu_device, gpu_name) = match Self::init_gpu() {
            Ok((device, name)) => (Some(Arc::new(device)), Some(name)),
            Err(e) => {
                tracing::debug!("GPU unavailable, using CPU: {}", e);
                (None, None)
            }
        };

        Self {
            gpu_device,
            gpu_name,
            cpu_device: Arc::new(CpuDevice::default()),
        }
    }

    /// Never touches the GPU.
    pub fn cpu_only() -> Self {
        Self {
            gpu_device: None,
            gpu_name: None,
            cpu_device: Arc::new(CpuDevice::default()),
        }
    }

    fn init_gpu() -> Result<(WgpuDevice, String)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: Self::preferred_backends(),
            ..Default::default()
        });

        let adapter = pollster::block_on(async {
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: PowerPreference::HighPerformance,
                    force_fallback_adapter: false,
                    compatible_surface: None,
                })
                .await
        })
        .map_err(|_| Error::Gpu("No GPU adapter available".into()))?;

        let adapter_info = adapter.get_info();
        tracing::debug!("Selected GPU adapter: {:?}", adapter_info);

        let (device, queue) = pollster::block_on(async {
            adapter
                .request_device(&DeviceDescriptor {
                    label: Some("soundscape-burn GPU"),
                    required_features: Features::empty(),
                    required_limits: Limits::default(),
                    memory_hints: Default::default(),
                    trace: Default::default(),
                })
                .await
        })
        .map_err(|e| Error::Gpu(e.to_string()))?;

        let name = format!("{} ({:?})", adapter_info.name, adapter_info.backend);
        let setup = WgpuSetup {
            instance,
            adapter,
            device,
            queue,
            backend: adapter_info.backend,
        };

        Ok((init_device(setup, RuntimeOptions::default()), name))
    }

    fn preferred_backends() -> Backends {
        #[cfg(target_os = "macos")]
        {
            Backends::METAL
        }
        #[cfg(target_os = "windows")]
        {
            Backends::DX12 | Backends::VULKAN
        }
        #[cfg(target_os = "linux")]
        {
            Backends::VULKAN
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Backends::all()
        }
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_device.is_some()
    }

    pub fn gpu_device(&self) -> Option<&Arc<WgpuDevice>> {
        self.gpu_device.as_ref()
    }

    pub fn gpu_name(&self) -> Option<&str> {
        self.gpu_name.as_deref()
    }

    pub fn cpu_device(&self) -> &Arc<CpuDevice> {
        &self.cpu_device
    }
}

impl Default for BackendPool {
    fn default() -> Self {
        Self::new()
    }
}
