//! Simulator configuration

use crate::error::{Result, SimulatorError};
use lumiq_state::PrecisionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Policy for splitting observables across devices in the adjoint pass
///
/// Deserialises from `false`, `true` or a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BatchObsRepr", into = "BatchObsRepr")]
pub enum BatchObs {
    /// All observables in one invocation on one device
    #[default]
    Unbatched,
    /// One contiguous chunk per device, all dispatched at once
    Distributed,
    /// At most `k` observables per device per round
    Capped(NonZeroUsize),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum BatchObsRepr {
    Flag(bool),
    Cap(usize),
}

impl From<BatchObsRepr> for BatchObs {
    fn from(repr: BatchObsRepr) -> Self {
        match repr {
            BatchObsRepr::Flag(flag) => flag.into(),
            BatchObsRepr::Cap(k) => k.into(),
        }
    }
}

impl From<BatchObs> for BatchObsRepr {
    fn from(policy: BatchObs) -> Self {
        match policy {
            BatchObs::Unbatched => BatchObsRepr::Flag(false),
            BatchObs::Distributed => BatchObsRepr::Flag(true),
            BatchObs::Capped(k) => BatchObsRepr::Cap(k.get()),
        }
    }
}

impl From<bool> for BatchObs {
    fn from(flag: bool) -> Self {
        if flag {
            BatchObs::Distributed
        } else {
            BatchObs::Unbatched
        }
    }
}

/// `0` disables batching
impl From<usize> for BatchObs {
    fn from(k: usize) -> Self {
        NonZeroUsize::new(k).map_or(BatchObs::Unbatched, BatchObs::Capped)
    }
}

impl FromStr for BatchObs {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "false" | "False" => Ok(BatchObs::Unbatched),
            "true" | "True" => Ok(BatchObs::Distributed),
            other => other.parse::<usize>().map(BatchObs::from).map_err(|_| {
                SimulatorError::InvalidConfig(format!(
                    "batch_obs must be a bool or a positive integer, got '{}'",
                    other
                ))
            }),
        }
    }
}

impl fmt::Display for BatchObs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchObs::Unbatched => write!(f, "false"),
            BatchObs::Distributed => write!(f, "true"),
            BatchObs::Capped(k) => write!(f, "{}", k),
        }
    }
}

/// Default ceiling for building a dense Hamiltonian matrix (1 GiB)
pub const DEFAULT_DENSE_HAMILTONIAN_LIMIT: usize = 1 << 30;

/// Configuration for the simulator, fixed at construction time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Amplitude precision; must match the simulator's type parameter
    ///
    /// Default: double
    pub precision: PrecisionKind,

    /// Observable batching policy for the adjoint Jacobian
    ///
    /// Default: unbatched
    pub batch_obs: BatchObs,

    /// Number of measurement shots; `None` means analytic results
    ///
    /// Default: None
    pub shots: Option<usize>,

    /// Random number generator seed for reproducibility
    ///
    /// Default: None (random)
    pub seed: Option<u64>,

    /// Largest dense Hamiltonian matrix, in bytes, before falling back to
    /// term-by-term evaluation
    ///
    /// Default: 1 GiB
    pub dense_hamiltonian_memory_limit: usize,

    /// Memory per device in bytes for adjoint replicas; 0 for no limit
    ///
    /// Default: 0
    pub device_memory_limit: usize,

    /// Override of the detected device count
    ///
    /// Default: None
    pub num_devices: Option<usize>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            precision: PrecisionKind::Double,
            batch_obs: BatchObs::Unbatched,
            shots: None,
            seed: None,
            dense_hamiltonian_memory_limit: DEFAULT_DENSE_HAMILTONIAN_LIMIT,
            device_memory_limit: 0,
            num_devices: None,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: PrecisionKind) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_batch_obs(mut self, batch_obs: impl Into<BatchObs>) -> Self {
        self.batch_obs = batch_obs.into();
        self
    }

    /// Set the number of measurement shots
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Set the random seed for deterministic sampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_dense_hamiltonian_memory_limit(mut self, bytes: usize) -> Self {
        self.dense_hamiltonian_memory_limit = bytes;
        self
    }

    /// Set the per-device memory limit in bytes
    pub fn with_device_memory_limit(mut self, bytes: usize) -> Self {
        self.device_memory_limit = bytes;
        self
    }

    pub fn with_num_devices(mut self, devices: usize) -> Self {
        self.num_devices = Some(devices);
        self
    }

    /// Largest wire count whose dense `2^k x 2^k` matrix fits the limit
    pub fn dense_hamiltonian_max_wires(&self) -> usize {
        let bytes = self.precision.amplitude_bytes();
        let mut k = 0;
        let limit = self.dense_hamiltonian_memory_limit;
        while k < 31 && (1usize << (2 * (k + 1))).saturating_mul(bytes) <= limit {
            k += 1;
        }
        k
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.shots == Some(0) {
            return Err(SimulatorError::InvalidConfig(
                "shots must be > 0 when set".to_string(),
            ));
        }

        if self.num_devices == Some(0) {
            return Err(SimulatorError::InvalidConfig(
                "num_devices must be > 0 when set".to_string(),
            ));
        }

        if self.dense_hamiltonian_memory_limit == 0 {
            return Err(SimulatorError::InvalidConfig(
                "dense_hamiltonian_memory_limit must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
