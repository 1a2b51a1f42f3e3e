//! Error types for tape construction

use thiserror::Error;

/// Errors raised while building operations, observables and tapes
///
/// Every variant is a validation error: it is reported before any state is
/// touched, so the caller can fix the input and retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantumError {
    /// Wire index outside the device register
    #[error("Invalid wire {0}: device has only {1} wires")]
    InvalidWire(usize, usize),

    /// Gate applied to the wrong number of wires
    #[error("Gate '{gate}' requires {expected} wires, but {actual} were provided")]
    InvalidWireCount {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// Same wire listed twice in one operation
    #[error("Duplicate wire {0} in operation")]
    DuplicateWire(usize),

    /// Gate received the wrong number of numeric parameters
    #[error("Gate '{gate}' takes {expected} parameters, but {actual} were provided")]
    InvalidParameterCount {
        gate: String,
        expected: usize,
        actual: usize,
    },

    /// No native kernel is registered under this name
    #[error("Unknown gate '{0}'")]
    UnknownGate(String),

    /// Unknown observable name
    #[error("Unknown observable '{0}'")]
    UnknownObservable(String),

    /// Explicit matrix has the wrong shape for its wires
    #[error("Malformed matrix: {0}")]
    MalformedMatrix(String),

    /// CSR arrays are inconsistent
    #[error("Malformed sparse matrix: {0}")]
    MalformedSparse(String),

    /// State preparation found after a gate
    #[error("Operation {name} at position {position} cannot be used after other operations have already been applied")]
    StatePrepNotFirst { name: String, position: usize },

    /// State preparation payload is invalid
    #[error("Invalid state preparation: {0}")]
    InvalidStatePrep(String),

    /// Trainable index does not address a tape parameter
    #[error("Trainable parameter {index} out of range: tape has {num_params} parameters")]
    InvalidTrainableParam { index: usize, num_params: usize },
}

impl QuantumError {
    /// Create an invalid wire-count error
    pub fn invalid_wire_count(gate: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::InvalidWireCount {
            gate: gate.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid parameter-count error
    pub fn invalid_parameter_count(
        gate: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Self::InvalidParameterCount {
            gate: gate.into(),
            expected,
            actual,
        }
    }
}
