//! Expectation values and variances of observables
//!
//! The evaluator never mutates the state it is given. Every contraction is
//! `⟨ψ|O|ψ⟩` with `O|ψ⟩` built in a scratch buffer by [`apply_observable`].
//!
//! [`apply_observable`]: ObservableEvaluator::apply_observable

use crate::backend::Backend;
use crate::error::Result;
use lumiq_core::{NamedObservable, Observable};
use lumiq_gates::{named_observable_matrix, observable_matrix};
use lumiq_state::{Precision, StateVector};
use std::marker::PhantomData;

/// Observable contractions on one backend
#[derive(Debug)]
pub struct ObservableEvaluator<'a, P, B> {
    backend: &'a B,
    dense_max_wires: usize,
    _precision: PhantomData<P>,
}

impl<P, B> Clone for ObservableEvaluator<'_, P, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, B> Copy for ObservableEvaluator<'_, P, B> {}

impl<'a, P: Precision, B: Backend<P>> ObservableEvaluator<'a, P, B> {
    /// `dense_max_wires` is the largest Hamiltonian evaluated as one dense
    /// matrix; wider ones are summed term by term
    pub fn new(backend: &'a B, dense_max_wires: usize) -> Self {
        Self {
            backend,
            dense_max_wires,
            _precision: PhantomData,
        }
    }

    pub fn backend(&self) -> &'a B {
        self.backend
    }

    /// True if `obs` is contracted as one dense matrix
    ///
    /// Anything holding a sparse Hamiltonian stays sparse whatever its width.
    pub fn uses_dense_path(&self, obs: &Observable) -> bool {
        obs.wires().len() <= self.dense_max_wires
            && !obs.any(&|o| matches!(o, Observable::SparseHamiltonian { .. }))
    }

    /// `out = O·state`
    pub fn apply_observable(
        &self,
        obs: &Observable,
        state: &StateVector<P>,
        out: &mut StateVector<P>,
    ) -> Result<()> {
        match obs {
            Observable::SparseHamiltonian { matrix, wires } => {
                self.backend.apply_sparse(state, matrix, wires, out)
            }
            Observable::Hamiltonian { terms } => {
                if self.uses_dense_path(obs) {
                    out.copy_from(state)?;
                    return self.backend.apply_matrix(out, &observable_matrix(obs)?, &obs.wires());
                }
                out.fill_zero();
                let mut scratch = self.backend.allocate(state.num_qubits())?;
                for (coeff, term) in terms {
                    self.apply_observable(term, state, &mut scratch)?;
                    self.backend.accumulate(*coeff, &scratch, out)?;
                }
                Ok(())
            }
            Observable::Tensor(factors) => {
                out.copy_from(state)?;
                for factor in factors {
                    self.apply_in_place(factor, out)?;
                }
                Ok(())
            }
            other => {
                out.copy_from(state)?;
                self.apply_in_place(other, out)
            }
        }
    }

    /// Apply a single-block observable to a buffer in place
    fn apply_in_place(&self, obs: &Observable, state: &mut StateVector<P>) -> Result<()> {
        match obs {
            Observable::Named {
                kind: NamedObservable::Identity,
                ..
            } => Ok(()),
            Observable::Named { kind, wire } => {
                self.backend.apply_matrix(state, &named_observable_matrix(*kind)?, &[*wire])
            }
            Observable::Hermitian { matrix, wires } => {
                self.backend.apply_matrix(state, matrix, wires)
            }
            other => {
                let wires = other.wires();
                self.backend.apply_matrix(state, &observable_matrix(other)?, &wires)
            }
        }
    }

    /// ⟨ψ|O|ψ⟩
    pub fn expectation(&self, obs: &Observable, state: &StateVector<P>) -> Result<f64> {
        if let Observable::Hamiltonian { terms } = obs {
            if !self.uses_dense_path(obs) {
                return terms.iter().try_fold(0.0, |acc, (coeff, term)| -> Result<f64> {
                    Ok(acc + coeff * self.expectation(term, state)?)
                });
            }
        }
        let mut bra = self.backend.allocate(state.num_qubits())?;
        self.apply_observable(obs, state, &mut bra)?;
        Ok(self.backend.inner_product(state, &bra)?.re)
    }

    /// ⟨O²⟩ − ⟨O⟩²
    ///
    /// When the observable takes the dense path `O²` is the matrix product of
    /// `O` with itself; otherwise `⟨O²⟩` is `‖O|ψ⟩‖²`, which holds for any
    /// Hermitian `O`. Both lose precision near eigenstates of `O`.
    pub fn variance(&self, obs: &Observable, state: &StateVector<P>) -> Result<f64> {
        let mut bra = self.backend.allocate(state.num_qubits())?;
        self.apply_observable(obs, state, &mut bra)?;
        let mean = self.backend.inner_product(state, &bra)?.re;

        let wires = obs.wires();
        let square = if self.uses_dense_path(obs) {
            let m = observable_matrix(obs)?;
            Some(m.matmul(&m)?)
        } else {
            None
        };

        let mean_of_square = match square {
            Some(m2) => {
                bra.copy_from(state)?;
                self.backend.apply_matrix(&mut bra, &m2, &wires)?;
                self.backend.inner_product(state, &bra)?.re
            }
            None => self.backend.inner_product(&bra, &bra)?.re,
        };
        Ok(mean_of_square - mean * mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalDevice;
    use approx::assert_relative_eq;
    use lumiq_core::{Complex64, CsrMatrix, NamedGate, Operation};

    fn plus_state(device: &LocalDevice) -> StateVector<f64> {
        let mut state = device.allocate(2).unwrap();
        let h = Operation::new(NamedGate::Hadamard, &[0], &[], false).unwrap();
        device.apply(&mut state, &h).unwrap();
        state
    }

    #[test]
    fn test_named_expectations() {
        let device = LocalDevice::new(0, 0);
        let eval = ObservableEvaluator::new(&device, 13);
        let state = plus_state(&device);

        let value = eval.expectation(&Observable::pauli_x(0), &state).unwrap();
        assert_relative_eq!(value, 1.0, epsilon = 1e-12);
        let value = eval.expectation(&Observable::pauli_z(0), &state).unwrap();
        assert_relative_eq!(value, 0.0, epsilon = 1e-12);
        let value = eval.expectation(&Observable::pauli_z(1), &state).unwrap();
        assert_relative_eq!(value, 1.0, epsilon = 1e-12);
        let id = Observable::named(NamedObservable::Identity, 1);
        assert_relative_eq!(eval.expectation(&id, &state).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_state_is_not_mutated() {
        let device = LocalDevice::new(0, 0);
        let eval = ObservableEvaluator::new(&device, 13);
        let state = plus_state(&device);
        let before = state.to_complex64();
        eval.variance(&Observable::pauli_y(0), &state).unwrap();
        assert_eq!(before, state.to_complex64());
    }

    #[test]
    fn test_hamiltonian_paths_agree() {
        let device = LocalDevice::new(0, 0);
        let state = plus_state(&device);
        let ham = Observable::hamiltonian(vec![
            (0.5, Observable::pauli_x(0)),
            (
                -1.5,
                Observable::tensor(vec![Observable::pauli_z(0), Observable::pauli_z(1)]).unwrap(),
            ),
            (2.0, Observable::pauli_z(1)),
        ]);

        let dense = ObservableEvaluator::new(&device, 13);
        let split = ObservableEvaluator::new(&device, 0);
        assert!(dense.uses_dense_path(&ham));
        assert!(!split.uses_dense_path(&ham));

        let a = dense.expectation(&ham, &state).unwrap();
        let b = split.expectation(&ham, &state).unwrap();
        assert_relative_eq!(a, 2.5, epsilon = 1e-12);
        assert_relative_eq!(a, b, epsilon = 1e-12);

        let va = dense.variance(&ham, &state).unwrap();
        let vb = split.variance(&ham, &state).unwrap();
        assert_relative_eq!(va, vb, epsilon = 1e-10);
    }

    #[test]
    fn test_sparse_hamiltonian_matches_dense() {
        let device = LocalDevice::new(0, 0);
        let eval = ObservableEvaluator::new(&device, 13);
        let state = plus_state(&device);

        // X on wire 0 as CSR
        let x = CsrMatrix::new(
            2,
            vec![0, 1, 2],
            vec![1, 0],
            vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)],
        )
        .unwrap();
        let sparse = Observable::sparse_hamiltonian(x, &[0]).unwrap();
        assert_relative_eq!(eval.expectation(&sparse, &state).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(eval.variance(&sparse, &state).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hamiltonian_with_sparse_term_stays_sparse() {
        let device = LocalDevice::new(0, 0);
        let state = plus_state(&device);
        let x = CsrMatrix::new(
            2,
            vec![0, 1, 2],
            vec![1, 0],
            vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)],
        )
        .unwrap();
        let ham = Observable::hamiltonian(vec![
            (0.5, Observable::sparse_hamiltonian(x, &[0]).unwrap()),
            (2.0, Observable::pauli_z(1)),
        ]);

        let dense = ObservableEvaluator::new(&device, 13);
        let split = ObservableEvaluator::new(&device, 0);
        assert!(!dense.uses_dense_path(&ham));

        let a = dense.expectation(&ham, &state).unwrap();
        assert_relative_eq!(a, 2.5, epsilon = 1e-12);
        assert_relative_eq!(a, split.expectation(&ham, &state).unwrap(), epsilon = 1e-12);

        let mut out = device.allocate(2).unwrap();
        dense.apply_observable(&ham, &state, &mut out).unwrap();
        assert_relative_eq!(device.inner_product(&state, &out).unwrap().re, 2.5, epsilon = 1e-12);
        assert_relative_eq!(dense.variance(&ham, &state).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_variance_of_pauli() {
        let device = LocalDevice::new(0, 0);
        let eval = ObservableEvaluator::new(&device, 13);
        let state = plus_state(&device);
        let z = eval.variance(&Observable::pauli_z(0), &state).unwrap();
        let x = eval.variance(&Observable::pauli_x(0), &state).unwrap();
        assert_relative_eq!(z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);

        let proj = Observable::projector(&[1], &[0]).unwrap();
        assert_relative_eq!(eval.expectation(&proj, &state).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(eval.variance(&proj, &state).unwrap(), 0.25, epsilon = 1e-12);
    }
}
