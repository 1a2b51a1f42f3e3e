//! Adjoint-method Jacobian
//!
//! Starting from the final state `|ψ⟩`, one bra `O_k|ψ⟩` is built per
//! observable term and a single ket is kept. The operation list is walked
//! backwards; at each trainable gate `U = exp(i·s·θ·G)` the column entry is
//!
//! ```text
//! ∂⟨O_k⟩/∂θ = 2·Re⟨bra_k| i·s·G |ket⟩ = -2·s·Im⟨bra_k|G|ket⟩
//! ```
//!
//! and then `U†` is applied to the ket and to every bra. The cost is one
//! matrix-vector product per bra per operation, so bras dominate memory.

use crate::backend::Backend;
use crate::error::{Result, SimulatorError};
use crate::evaluator::ObservableEvaluator;
use lumiq_core::{LoweredOp, Observable, ReturnType, Tape};
use lumiq_gates::generator;
use lumiq_state::{Precision, StateVector};
use rayon::prelude::*;
use std::fmt;

/// Derivatives of expectation values, one row per observable and one column
/// per trainable gate parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Jacobian {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Jacobian {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Copy rows into a `rows.len() x cols` matrix; short rows are zero-padded
    pub fn from_rows(rows: &[Vec<f64>], cols: usize) -> Self {
        let mut jac = Self::zeros(rows.len(), cols);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().take(cols).enumerate() {
                jac.data[r * cols + c] = v;
            }
        }
        jac
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Row-major entries
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }
}

impl fmt::Display for Jacobian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let cells: Vec<String> = row.iter().map(|v| format!("{:+.6}", v)).collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Reject return types and observables the adjoint method cannot handle
///
/// Runs before any buffer is touched.
///
/// # Errors
/// - `UnsupportedMeasurement` for state returns or any non-expectation return
/// - `UnsupportedObservable` for Hermitian and Projector observables
pub fn check_measurements(tape: &Tape) -> Result<()> {
    for measurement in tape.measurements() {
        match measurement.return_type() {
            ReturnType::Expectation => {}
            ReturnType::State => {
                return Err(SimulatorError::UnsupportedMeasurement(
                    "adjoint differentiation does not support State measurements".to_string(),
                ))
            }
            other => {
                return Err(SimulatorError::UnsupportedMeasurement(format!(
                    "adjoint differentiation only supports expectation return types, got {:?}",
                    other
                )))
            }
        }
    }

    for obs in tape.observables() {
        if !obs.supports_adjoint() {
            let name = if obs.any(&|o| matches!(o, Observable::Hermitian { .. })) {
                "Hermitian"
            } else {
                "Projector"
            };
            return Err(SimulatorError::unsupported_observable(
                name,
                "with the adjoint differentiation method",
            ));
        }
    }
    Ok(())
}

/// Reject operations without a generator
///
/// Only consulted once there is something to differentiate, so a tape with
/// no trainable parameters may carry any gate.
///
/// # Errors
/// - `UnsupportedOperation` for multi-parameter gates other than `Rot`
pub fn check_operations(tape: &Tape) -> Result<()> {
    for op in tape.operations() {
        let composite = op.named_gate().map_or(false, |g| g.is_composite_rotation());
        if op.num_params() > 1 && !composite {
            return Err(SimulatorError::UnsupportedOperation {
                name: op.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Reverse sweep for one set of observable terms on one device
#[derive(Debug, Clone, Copy)]
pub struct AdjointJacobian<'a, P, B> {
    evaluator: ObservableEvaluator<'a, P, B>,
}

impl<'a, P: Precision, B: Backend<P>> AdjointJacobian<'a, P, B> {
    pub fn new(evaluator: ObservableEvaluator<'a, P, B>) -> Self {
        Self { evaluator }
    }

    /// State buffers one sweep over `num_observables` terms allocates
    ///
    /// One bra per term, the ket and the generator scratch.
    pub fn replicas(num_observables: usize) -> usize {
        num_observables + 2
    }

    /// Jacobian rows for `observables` against `trainable` columns
    ///
    /// `final_state` is read only. `ops` carry gate-parameter indices and
    /// `trainable` must be sorted in the same numbering.
    pub fn compute(
        &self,
        final_state: &StateVector<P>,
        ops: &[LoweredOp],
        observables: &[&Observable],
        trainable: &[usize],
    ) -> Result<Vec<Vec<f64>>> {
        let cols = trainable.len();
        let mut rows = vec![vec![0.0; cols]; observables.len()];
        if cols == 0 || observables.is_empty() {
            return Ok(rows);
        }

        let backend = self.evaluator.backend();
        let n = final_state.num_qubits();

        let mut ket = backend.allocate(n)?;
        ket.copy_from(final_state)?;
        let mut bras = observables
            .iter()
            .map(|obs| {
                let mut bra = backend.allocate(n)?;
                self.evaluator.apply_observable(obs, final_state, &mut bra)?;
                Ok(bra)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut mu = backend.allocate(n)?;

        let mut remaining = cols;
        for lowered in ops.iter().rev() {
            if remaining == 0 {
                break;
            }
            let op = &lowered.op;

            if let Some(col) = lowered.param.and_then(|p| trainable.binary_search(&p).ok()) {
                let unsupported = || SimulatorError::UnsupportedOperation {
                    name: op.name().to_string(),
                };
                let gate = op.named_gate().ok_or_else(unsupported)?;
                let gen = generator(gate, op.wires().len())?.ok_or_else(unsupported)?;
                let scale = if op.inverse() { -gen.scale } else { gen.scale };

                mu.copy_from(&ket)?;
                backend.apply_matrix(&mut mu, &gen.matrix, op.wires())?;
                rows.par_iter_mut().zip(bras.par_iter()).try_for_each(|(row, bra)| -> Result<()> {
                    row[col] += -2.0 * scale * backend.inner_product(bra, &mu)?.im;
                    Ok(())
                })?;
                remaining -= 1;
            }

            let inverse = op.adjoint();
            backend.apply(&mut ket, &inverse)?;
            bras.par_iter_mut().try_for_each(|bra| backend.apply(bra, &inverse))?;
        }

        Ok(rows)
    }
}
