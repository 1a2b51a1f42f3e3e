//! Error types for state vector operations

use thiserror::Error;

/// Errors that can occur during state vector operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// Invalid qubit index
    #[error("Invalid qubit index {index} for {num_qubits}-qubit state")]
    InvalidQubitIndex { index: usize, num_qubits: usize },

    /// Invalid state dimension
    #[error("Invalid state dimension {dimension}, expected power of 2")]
    InvalidDimension { dimension: usize },

    /// State not normalized
    #[error("Sum of amplitudes-squared does not equal one, norm = {norm}")]
    NotNormalized { norm: f64 },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Memory allocation error
    #[error("Failed to allocate {size} bytes for state vector")]
    AllocationError { size: usize },

    /// Sampling from a distribution with no outcomes
    #[error("Cannot sample from an empty distribution")]
    EmptyDistribution,

    /// Precision name not recognised
    #[error("Data type is not supported for state-vector computation: {0}")]
    UnsupportedPrecision(String),
}

/// Result type for state vector operations
pub type Result<T> = std::result::Result<T, StateError>;
