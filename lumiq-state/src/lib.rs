//! State vector storage and kernels for lumiq
//!
//! This crate owns the amplitude buffers and everything that touches them
//! directly:
//!
//! - [`StateVector`]: aligned `2^n` amplitude buffer, generic over
//!   [`Precision`] (`f32` or `f64`), tagged with its [`Residency`]
//! - [`kernels`]: in-place gate application (single-qubit, diagonal and
//!   general multi-qubit), sparse mat-vec, inner products and probabilities
//! - [`sampling`]: alias-table sampling of basis states
//!
//! # Example
//!
//! ```
//! use lumiq_core::DenseMatrix;
//! use lumiq_state::{kernels, StateVector};
//! use num_complex::Complex64;
//!
//! let mut state = StateVector::<f64>::new(1).unwrap();
//! let x = DenseMatrix::from_row_major(vec![
//!     Complex64::new(0.0, 0.0),
//!     Complex64::new(1.0, 0.0),
//!     Complex64::new(1.0, 0.0),
//!     Complex64::new(0.0, 0.0),
//! ])
//! .unwrap();
//! kernels::apply_dense(&mut state, &x, &[0]).unwrap();
//! assert_eq!(kernels::probabilities(&state), vec![0.0, 1.0]);
//! ```

pub mod error;
pub mod kernels;
pub mod precision;
pub mod sampling;
pub mod state_vector;

pub use error::{Result, StateError};
pub use precision::{Precision, PrecisionKind};
pub use sampling::AliasTable;
pub use state_vector::{Residency, StateVector, NORM_TOLERANCE};
