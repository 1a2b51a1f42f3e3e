//! Error types for the simulator

use lumiq_core::QuantumError;
use lumiq_state::StateError;
use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimulatorError>;

/// Errors that can occur during simulation and differentiation
///
/// Validation and unsupported-combination errors are raised before any
/// buffer is mutated. Device errors abort the whole evaluation; no partial
/// result is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    /// Malformed tape, operation or observable
    #[error("Invalid circuit: {0}")]
    Circuit(#[from] QuantumError),

    /// State buffer rejected the request
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Precision not available on this device
    #[error("Data type is not supported for state-vector computation: {0}")]
    UnsupportedPrecision(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation cannot be differentiated with the adjoint method
    #[error("The {name} operation is not supported using the adjoint differentiation method")]
    UnsupportedOperation { name: String },

    /// Observable not supported on this path
    #[error("{name} observables are not supported {context}")]
    UnsupportedObservable { name: String, context: String },

    /// Measurement types that cannot be combined on this path
    #[error("Unsupported measurement combination: {0}")]
    UnsupportedMeasurement(String),

    /// Replica budget larger than device memory
    #[error("Resource exhausted on device {device}: {requested} bytes requested, {limit} available")]
    ResourceExhausted {
        device: usize,
        requested: usize,
        limit: usize,
    },

    /// Backend failure, fatal for the current evaluation
    #[error("Device {device} failed: {reason}")]
    Device { device: usize, reason: String },
}

/// Error classification used for reporting and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input; retry with corrected input
    Validation,
    /// Valid pieces that cannot be combined on the requested path
    UnsupportedCombination,
    /// Backend failure; retry the whole evaluation
    Device,
}

impl SimulatorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SimulatorError::Circuit(_)
            | SimulatorError::State(_)
            | SimulatorError::UnsupportedPrecision(_)
            | SimulatorError::InvalidConfig(_)
            | SimulatorError::UnsupportedOperation { .. }
            | SimulatorError::UnsupportedObservable { .. } => ErrorCategory::Validation,
            SimulatorError::UnsupportedMeasurement(_) => ErrorCategory::UnsupportedCombination,
            SimulatorError::ResourceExhausted { .. } | SimulatorError::Device { .. } => {
                ErrorCategory::Device
            }
        }
    }

    /// Check if the caller can succeed by changing its input
    pub fn is_recoverable(&self) -> bool {
        self.category() != ErrorCategory::Device
    }

    pub(crate) fn unsupported_observable(name: &str, context: &str) -> Self {
        SimulatorError::UnsupportedObservable {
            name: name.to_string(),
            context: context.to_string(),
        }
    }
}
