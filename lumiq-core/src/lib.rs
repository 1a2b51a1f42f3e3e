//! Core types for the lumiq state-vector simulator
//!
//! This crate provides the caller-facing description of a computation:
//! - [`Operation`]: a gate on device-local wires, lowered to a [`GateKind`]
//! - [`Observable`]: named, tensor, Hermitian, Hamiltonian and sparse operators
//! - [`Tape`]: operations, measurements and the trainable parameter set
//!
//! # Example
//! ```
//! use lumiq_core::{Measurement, NamedGate, Observable, Operation, Tape};
//!
//! let tape = Tape::new(
//!     vec![
//!         Operation::new(NamedGate::RX, &[0], &[0.3], false).unwrap().into(),
//!         Operation::new(NamedGate::CNOT, &[0, 1], &[], false).unwrap().into(),
//!     ],
//!     vec![Measurement::Expectation(Observable::pauli_z(1))],
//! )
//! .unwrap();
//! assert_eq!(tape.num_params(), 1);
//! ```

pub mod error;
pub mod gate;
pub mod matrix;
pub mod observable;
pub mod tape;

// Re-exports for convenience
pub use error::QuantumError;
pub use gate::{GateKind, NamedGate, Operation, StatePrep, Wires};
pub use matrix::{CsrMatrix, DenseMatrix};
pub use num_complex::Complex64;
pub use observable::{FlatTerms, NamedObservable, Observable};
pub use tape::{LoweredOp, Measurement, ReturnType, Tape, TapeOp};

/// Type alias for results in lumiq
pub type Result<T> = std::result::Result<T, QuantumError>;
