//! Device discovery and the device pool

use crate::backend::LocalDevice;
use crate::config::SimulatorConfig;
use crate::error::{Result, SimulatorError};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// What the host can run on, detected once per process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Number of accelerator devices usable for state buffers
    pub accelerators: usize,
    /// Worker threads available for CPU kernels
    pub cpu_workers: usize,
}

impl Capabilities {
    /// Detect the host once and cache the result
    pub fn detect() -> Self {
        static DETECTED: OnceLock<Capabilities> = OnceLock::new();
        *DETECTED.get_or_init(|| {
            let caps = Capabilities {
                accelerators: 0,
                cpu_workers: rayon::current_num_threads(),
            };
            debug!(
                accelerators = caps.accelerators,
                cpu_workers = caps.cpu_workers,
                "detected compute capabilities"
            );
            caps
        })
    }

    /// Capabilities of a CPU-only host
    pub fn cpu_only(cpu_workers: usize) -> Self {
        Self {
            accelerators: 0,
            cpu_workers: cpu_workers.max(1),
        }
    }

    pub fn has_accelerator(&self) -> bool {
        self.accelerators > 0
    }
}

/// Fixed set of devices the scheduler dispatches chunks onto
#[derive(Debug, Clone)]
pub struct DevicePool<B> {
    devices: Vec<B>,
}

impl<B> DevicePool<B> {
    /// Build a pool from explicit devices
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an empty device list.
    pub fn new(devices: Vec<B>) -> Result<Self> {
        if devices.is_empty() {
            return Err(SimulatorError::InvalidConfig(
                "device pool needs at least one device".to_string(),
            ));
        }
        Ok(Self { devices })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Device that owns the simulator's own state
    pub fn primary(&self) -> &B {
        &self.devices[0]
    }

    pub fn get(&self, index: usize) -> Option<&B> {
        self.devices.get(index)
    }

    pub fn devices(&self) -> &[B] {
        &self.devices
    }
}

impl DevicePool<LocalDevice> {
    /// Build CPU devices from the detected capabilities
    ///
    /// Without an accelerator the pool falls back to logical CPU devices
    /// sharing the rayon pool; `num_devices` in the config overrides the count.
    pub fn from_capabilities(caps: &Capabilities, config: &SimulatorConfig) -> Result<Self> {
        if !caps.has_accelerator() {
            warn!(
                cpu_workers = caps.cpu_workers,
                "no accelerator available, falling back to CPU devices"
            );
        }
        let count = config.num_devices.unwrap_or(caps.accelerators.max(1));
        Self::new(
            (0..count)
                .map(|id| LocalDevice::new(id, config.device_memory_limit))
                .collect(),
        )
    }
}
