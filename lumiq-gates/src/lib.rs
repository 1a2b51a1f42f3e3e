//! Gate and observable matrices for lumiq
//!
//! This crate turns the symbolic operations of `lumiq-core` into numbers:
//!
//! - [`matrices`]: constant matrices of fixed gates and closed forms of
//!   parametrised ones
//! - [`gate_matrix`]: the matrix an [`Operation`](lumiq_core::Operation)
//!   applies, with its inverse flag resolved
//! - [`generator`]: `(G, scale)` pairs with `U(θ) = exp(i·scale·θ·G)`, used by
//!   the adjoint Jacobian
//! - [`observables`]: observable matrices, wire embedding and the eigenbases
//!   used for sampling
//!
//! # Example
//!
//! ```
//! use lumiq_core::{NamedGate, Operation};
//! use lumiq_gates::{generator, operation_matrix};
//!
//! let rx = Operation::new(NamedGate::RX, &[0], &[0.5], false).unwrap();
//! let u = operation_matrix(&rx).unwrap();
//! assert_eq!(u.dim(), 2);
//!
//! let g = generator(NamedGate::RX, 1).unwrap().unwrap();
//! assert_eq!(g.scale, -0.5);
//! ```

pub mod gate_matrix;
pub mod generator;
pub mod matrices;
pub mod observables;

// Re-export commonly used items
pub use gate_matrix::{named_matrix, operation_matrix};
pub use generator::{generator, Generator};
pub use observables::{eigen_basis, embed, named_observable_matrix, observable_matrix, EigenBasis};
