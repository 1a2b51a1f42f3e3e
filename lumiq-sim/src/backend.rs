//! Compute backend seam
//!
//! Everything that touches amplitudes goes through [`Backend`]: gate
//! application, observable contraction, inner products, host/device transfer
//! and sampling. The evaluator, the adjoint engine and the scheduler are
//! written against this trait only.

use crate::error::{Result, SimulatorError};
use lumiq_core::{Complex64, CsrMatrix, DenseMatrix, GateKind, NamedGate, Operation};
use lumiq_gates::operation_matrix;
use lumiq_state::{kernels, sampling, Precision, Residency, StateVector};
use rand::rngs::StdRng;
use std::fmt;

/// Per-device compute primitives
pub trait Backend<P: Precision>: Send + Sync + fmt::Debug {
    /// Index of this device in its pool
    fn id(&self) -> usize;

    /// Bytes available for state buffers; 0 means no limit
    fn memory_limit(&self) -> usize;

    /// Allocate a device-resident buffer in |0...0⟩
    fn allocate(&self, num_qubits: usize) -> Result<StateVector<P>>;

    /// Apply an operation in place, inverse flag included
    fn apply(&self, state: &mut StateVector<P>, op: &Operation) -> Result<()>;

    /// Apply an arbitrary (not necessarily unitary) matrix in place
    fn apply_matrix(&self, state: &mut StateVector<P>, matrix: &DenseMatrix, wires: &[usize])
        -> Result<()>;

    /// `out = M·state` for a CSR operator
    fn apply_sparse(
        &self,
        state: &StateVector<P>,
        matrix: &CsrMatrix,
        wires: &[usize],
        out: &mut StateVector<P>,
    ) -> Result<()>;

    /// `dst += coeff·src`
    fn accumulate(&self, coeff: f64, src: &StateVector<P>, dst: &mut StateVector<P>)
        -> Result<()>;

    /// ⟨a|b⟩
    fn inner_product(&self, a: &StateVector<P>, b: &StateVector<P>) -> Result<Complex64>;

    /// Marginal probabilities over `wires`, `wires[0]` most significant
    fn probabilities(&self, state: &StateVector<P>, wires: &[usize]) -> Result<Vec<f64>>;

    /// Copy host amplitudes into a device buffer
    fn upload(&self, host: &[Complex64], state: &mut StateVector<P>) -> Result<()>;

    /// Copy a device buffer into a host-resident mirror
    fn download(&self, state: &StateVector<P>) -> Result<StateVector<P>>;

    /// `shots` rows of one bit per wire drawn from |amplitude|²
    fn generate_samples(
        &self,
        state: &StateVector<P>,
        shots: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<Vec<u8>>>;
}

/// CPU device running the `lumiq-state` kernels on the rayon pool
#[derive(Debug, Clone)]
pub struct LocalDevice {
    id: usize,
    memory_limit: usize,
}

impl LocalDevice {
    pub fn new(id: usize, memory_limit: usize) -> Self {
        Self { id, memory_limit }
    }
}

impl<P: Precision> Backend<P> for LocalDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    fn allocate(&self, num_qubits: usize) -> Result<StateVector<P>> {
        let requested = StateVector::<P>::bytes_for(num_qubits);
        if self.memory_limit > 0 && requested > self.memory_limit {
            return Err(SimulatorError::ResourceExhausted {
                device: self.id,
                requested,
                limit: self.memory_limit,
            });
        }
        Ok(StateVector::new(num_qubits)?)
    }

    fn apply(&self, state: &mut StateVector<P>, op: &Operation) -> Result<()> {
        // Identity is a no-op on every register
        if let GateKind::Named(NamedGate::Identity) = op.gate() {
            return Ok(());
        }
        let matrix = operation_matrix(op)?;
        kernels::apply_dense(state, &matrix, op.wires())?;
        Ok(())
    }

    fn apply_matrix(
        &self,
        state: &mut StateVector<P>,
        matrix: &DenseMatrix,
        wires: &[usize],
    ) -> Result<()> {
        kernels::apply_dense(state, matrix, wires)?;
        Ok(())
    }

    fn apply_sparse(
        &self,
        state: &StateVector<P>,
        matrix: &CsrMatrix,
        wires: &[usize],
        out: &mut StateVector<P>,
    ) -> Result<()> {
        kernels::apply_csr(state, matrix, wires, out)?;
        Ok(())
    }

    fn accumulate(&self, coeff: f64, src: &StateVector<P>, dst: &mut StateVector<P>) -> Result<()> {
        kernels::axpy(Complex64::new(coeff, 0.0), src, dst)?;
        Ok(())
    }

    fn inner_product(&self, a: &StateVector<P>, b: &StateVector<P>) -> Result<Complex64> {
        Ok(kernels::inner_product(a, b)?)
    }

    fn probabilities(&self, state: &StateVector<P>, wires: &[usize]) -> Result<Vec<f64>> {
        Ok(kernels::marginal_probabilities(state, wires)?)
    }

    fn upload(&self, host: &[Complex64], state: &mut StateVector<P>) -> Result<()> {
        if host.len() != state.dimension() {
            return Err(SimulatorError::Device {
                device: self.id,
                reason: format!(
                    "transfer of {} amplitudes into a buffer of {}",
                    host.len(),
                    state.dimension()
                ),
            });
        }
        for (dst, &src) in state.amplitudes_mut().iter_mut().zip(host) {
            *dst = P::complex(src);
        }
        state.set_residency(Residency::Device);
        Ok(())
    }

    fn download(&self, state: &StateVector<P>) -> Result<StateVector<P>> {
        let mut host = state.clone_state()?;
        host.set_residency(Residency::Host);
        Ok(host)
    }

    fn generate_samples(
        &self,
        state: &StateVector<P>,
        shots: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<Vec<u8>>> {
        Ok(sampling::generate_samples(state, shots, rng)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_is_elided() {
        let device = LocalDevice::new(0, 0);
        let mut state: StateVector<f64> = device.allocate(2).unwrap();
        let id = Operation::new(NamedGate::Identity, &[1], &[], false).unwrap();
        device.apply(&mut state, &id).unwrap();
        assert_relative_eq!(state.amplitudes()[0].re, 1.0);
    }

    #[test]
    fn test_allocate_respects_memory_limit() {
        let device = LocalDevice::new(3, 64);
        let small: Result<StateVector<f64>> = device.allocate(2);
        assert!(small.is_ok());
        let big: Result<StateVector<f64>> = device.allocate(4);
        assert!(matches!(
            big,
            Err(SimulatorError::ResourceExhausted { device: 3, requested: 256, limit: 64 })
        ));
    }

    #[test]
    fn test_download_is_host_resident() {
        let device = LocalDevice::new(0, 0);
        let mut state: StateVector<f32> = device.allocate(1).unwrap();
        let x = Operation::new(NamedGate::PauliX, &[0], &[], false).unwrap();
        device.apply(&mut state, &x).unwrap();

        let host = device.download(&state).unwrap();
        assert_eq!(host.residency(), Residency::Host);
        assert_eq!(state.residency(), Residency::Device);
        assert_relative_eq!(host.amplitudes()[1].re, 1.0f32);
    }

    #[test]
    fn test_upload_rejects_wrong_length() {
        let device = LocalDevice::new(1, 0);
        let mut state: StateVector<f64> = device.allocate(1).unwrap();
        let err = device
            .upload(&[Complex64::new(1.0, 0.0); 4], &mut state)
            .unwrap_err();
        assert!(matches!(err, SimulatorError::Device { device: 1, .. }));
    }
}
