//! Adjoint-differentiation state-vector simulator
//!
//! This crate runs tapes from `lumiq-core` on the buffers and kernels of
//! `lumiq-state` and differentiates their expectation values with the adjoint
//! method.
//!
//! # Features
//!
//! - **Backend seam**: every amplitude operation goes through [`Backend`];
//!   [`LocalDevice`] runs the CPU kernels
//! - **Observable evaluation**: named, tensor, Hermitian, projector,
//!   Hamiltonian (dense or term by term) and sparse Hamiltonian observables
//! - **Adjoint Jacobian**: one reverse sweep per chunk of observables, with
//!   Hamiltonian terms re-aggregated into one row
//! - **Observable batching**: unbatched, distributed over all devices or
//!   capped per device, selected by [`BatchObs`]
//! - **Sampling**: finite-shot expectation values, variances and
//!   probabilities
//!
//! # Example
//!
//! ```
//! use lumiq_core::{Measurement, NamedGate, Observable, Operation, Tape};
//! use lumiq_sim::{BatchObs, Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::default()
//!     .with_batch_obs(BatchObs::Distributed)
//!     .with_num_devices(2);
//! let sim = Simulator::<f64>::new(2, config).unwrap();
//!
//! let tape = Tape::new(
//!     vec![
//!         Operation::new(NamedGate::RX, &[0], &[0.3], false).unwrap().into(),
//!         Operation::new(NamedGate::CNOT, &[0, 1], &[], false).unwrap().into(),
//!     ],
//!     vec![
//!         Measurement::Expectation(Observable::pauli_z(0)),
//!         Measurement::Expectation(Observable::pauli_z(1)),
//!     ],
//! )
//! .unwrap();
//!
//! let jac = sim.evaluate(&tape, None, false).unwrap();
//! assert_eq!((jac.num_rows(), jac.num_cols()), (2, 1));
//! ```

pub mod adjoint;
pub mod backend;
pub mod batch;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod simulator;

pub use adjoint::{AdjointJacobian, Jacobian};
pub use backend::{Backend, LocalDevice};
pub use batch::{BatchPlan, Chunk, ObservableBatchScheduler};
pub use capabilities::{Capabilities, DevicePool};
pub use config::{BatchObs, SimulatorConfig};
pub use error::{ErrorCategory, Result, SimulatorError};
pub use evaluator::ObservableEvaluator;
pub use simulator::{MeasurementResult, PrecisionWarning, Simulator};
