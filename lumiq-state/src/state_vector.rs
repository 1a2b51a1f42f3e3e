//! State vector storage with aligned memory

use crate::error::{Result, StateError};
use crate::precision::Precision;
use num_complex::{Complex, Complex64};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

/// Alignment of the amplitude buffer (64 bytes, one cache line)
const ALIGNMENT: usize = 64;

/// Largest register a single buffer may hold
pub const MAX_QUBITS: usize = 30;

/// Tolerance on the squared norm of an explicitly loaded state
pub const NORM_TOLERANCE: f64 = 1e-6;

/// Which copy of the amplitudes is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// Host mirror, downloaded for inspection
    Host,
    /// Device-resident working copy, mutated by kernels
    Device,
}

/// Quantum state vector of `2^n` amplitudes in little-endian wire order
///
/// Wire `w` is bit `w` of an amplitude's index.
///
/// # Example
///
/// ```
/// use lumiq_state::StateVector;
///
/// let state = StateVector::<f64>::new(2).unwrap();
/// assert_eq!(state.num_qubits(), 2);
/// assert_eq!(state.dimension(), 4);
/// ```
pub struct StateVector<P: Precision> {
    num_qubits: usize,
    dimension: usize,
    data: NonNull<Complex<P>>,
    layout: Layout,
    residency: Residency,
}

impl<P: Precision> StateVector<P> {
    /// Bytes one buffer of `num_qubits` occupies
    pub fn bytes_for(num_qubits: usize) -> usize {
        (1usize << num_qubits) * std::mem::size_of::<Complex<P>>()
    }

    /// Create a device-resident state in |0...0⟩
    ///
    /// # Errors
    /// Returns error if memory allocation fails or num_qubits is too large
    pub fn new(num_qubits: usize) -> Result<Self> {
        let mut state = Self::zeroed(num_qubits)?;
        state.amplitudes_mut()[0] = Complex::new(P::one(), P::zero());
        Ok(state)
    }

    /// Allocate an all-zero buffer
    fn zeroed(num_qubits: usize) -> Result<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(StateError::InvalidDimension {
                dimension: 1usize << num_qubits.min(63),
            });
        }
        let dimension = 1usize << num_qubits;
        let size = Self::bytes_for(num_qubits);
        let layout = Layout::from_size_align(size, ALIGNMENT)
            .map_err(|_| StateError::AllocationError { size })?;

        // Zero bits are a valid Complex<P> for both f32 and f64
        let data = unsafe {
            let ptr = alloc_zeroed(layout) as *mut Complex<P>;
            NonNull::new(ptr).ok_or(StateError::AllocationError { size })?
        };

        Ok(Self {
            num_qubits,
            dimension,
            data,
            layout,
            residency: Residency::Device,
        })
    }

    /// Create a state vector from raw amplitude data
    ///
    /// # Errors
    /// Returns error if the length is not `2^num_qubits` or allocation fails
    pub fn from_amplitudes(num_qubits: usize, amplitudes: &[Complex<P>]) -> Result<Self> {
        let dimension = 1usize << num_qubits.min(63);
        if amplitudes.len() != dimension {
            return Err(StateError::DimensionMismatch {
                expected: dimension,
                actual: amplitudes.len(),
            });
        }
        let mut state = Self::zeroed(num_qubits)?;
        state.amplitudes_mut().copy_from_slice(amplitudes);
        Ok(state)
    }

    /// Create a state vector from double-precision amplitudes
    pub fn from_complex64(amplitudes: &[Complex64]) -> Result<Self> {
        let num_qubits = qubits_for_len(amplitudes.len())?;
        let mut state = Self::zeroed(num_qubits)?;
        for (dst, &src) in state.amplitudes_mut().iter_mut().zip(amplitudes) {
            *dst = P::complex(src);
        }
        Ok(state)
    }

    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of amplitudes (2^num_qubits)
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn residency(&self) -> Residency {
        self.residency
    }

    #[inline]
    pub fn set_residency(&mut self, residency: Residency) {
        self.residency = residency;
    }

    #[inline]
    pub fn amplitudes(&self) -> &[Complex<P>] {
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.dimension) }
    }

    #[inline]
    pub fn amplitudes_mut(&mut self) -> &mut [Complex<P>] {
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.dimension) }
    }

    /// Amplitudes widened to double precision
    pub fn to_complex64(&self) -> Vec<Complex64> {
        self.amplitudes().iter().map(|&z| P::widen(z)).collect()
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        (self.data.as_ptr() as usize) % ALIGNMENT == 0
    }

    /// L2 norm, accumulated in double precision
    pub fn norm(&self) -> f64 {
        self.amplitudes()
            .iter()
            .map(|a| a.norm_sqr().as_f64())
            .sum::<f64>()
            .sqrt()
    }

    /// Check if |norm - 1| < epsilon
    pub fn is_normalized(&self, epsilon: f64) -> bool {
        (self.norm() - 1.0).abs() < epsilon
    }

    /// Reset the state to |0...0⟩
    pub fn reset(&mut self) {
        self.fill_zero();
        self.amplitudes_mut()[0] = Complex::new(P::one(), P::zero());
    }

    /// Set every amplitude to zero
    pub fn fill_zero(&mut self) {
        let zero = Complex::new(P::zero(), P::zero());
        self.amplitudes_mut().iter_mut().for_each(|a| *a = zero);
    }

    /// Overwrite this buffer with another of the same size
    pub fn copy_from(&mut self, other: &StateVector<P>) -> Result<()> {
        if other.dimension != self.dimension {
            return Err(StateError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }
        self.amplitudes_mut().copy_from_slice(other.amplitudes());
        Ok(())
    }

    /// Fallible deep copy, keeping the residency
    pub fn clone_state(&self) -> Result<Self> {
        let mut copy = Self::from_amplitudes(self.num_qubits, self.amplitudes())?;
        copy.residency = self.residency;
        Ok(copy)
    }

    /// Prepare a computational basis state on a subset of wires
    ///
    /// Wires not listed are left in |0⟩.
    pub fn set_basis_state(&mut self, bits: &[u8], wires: &[usize]) -> Result<()> {
        if bits.len() != wires.len() {
            return Err(StateError::DimensionMismatch {
                expected: wires.len(),
                actual: bits.len(),
            });
        }
        self.check_wires(wires)?;
        let index = bits
            .iter()
            .zip(wires)
            .fold(0usize, |acc, (&b, &w)| acc | ((b as usize & 1) << w));

        self.fill_zero();
        self.amplitudes_mut()[index] = Complex::new(P::one(), P::zero());
        Ok(())
    }

    /// Load amplitudes for a subset of wires; the rest start in |0⟩
    ///
    /// `amplitudes[k]` is indexed with `wires[0]` as the most significant bit.
    ///
    /// # Errors
    /// - `DimensionMismatch` if the length is not `2^len(wires)`
    /// - `NotNormalized` if the squared norm is off by more than [`NORM_TOLERANCE`]
    pub fn set_state_vector(&mut self, amplitudes: &[Complex64], wires: &[usize]) -> Result<()> {
        let expected = 1usize << wires.len();
        if amplitudes.len() != expected {
            return Err(StateError::DimensionMismatch {
                expected,
                actual: amplitudes.len(),
            });
        }
        self.check_wires(wires)?;
        let norm_sqr: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
        if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
            return Err(StateError::NotNormalized {
                norm: norm_sqr.sqrt(),
            });
        }

        let offsets = crate::kernels::local_offsets(wires);
        self.fill_zero();
        let amps = self.amplitudes_mut();
        for (k, &a) in amplitudes.iter().enumerate() {
            amps[offsets[k]] = P::complex(a);
        }
        Ok(())
    }

    pub(crate) fn check_wires(&self, wires: &[usize]) -> Result<()> {
        match wires.iter().find(|&&w| w >= self.num_qubits) {
            Some(&index) => Err(StateError::InvalidQubitIndex {
                index,
                num_qubits: self.num_qubits,
            }),
            None => Ok(()),
        }
    }
}

fn qubits_for_len(len: usize) -> Result<usize> {
    if len == 0 || !len.is_power_of_two() {
        return Err(StateError::InvalidDimension { dimension: len });
    }
    Ok(len.trailing_zeros() as usize)
}

impl<P: Precision> Drop for StateVector<P> {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.data.as_ptr() as *mut u8, self.layout);
        }
    }
}

impl<P: Precision> fmt::Debug for StateVector<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateVector")
            .field("num_qubits", &self.num_qubits)
            .field("precision", &P::KIND)
            .field("residency", &self.residency)
            .finish()
    }
}

// Safety: StateVector owns its data and ensures exclusive access
unsafe impl<P: Precision> Send for StateVector<P> {}
unsafe impl<P: Precision> Sync for StateVector<P> {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_new_state_vector() {
        let state = StateVector::<f64>::new(2).unwrap();
        assert_eq!(state.num_qubits(), 2);
        assert_eq!(state.dimension(), 4);
        assert!(state.is_aligned());
        assert_eq!(state.residency(), Residency::Device);
    }

    #[test]
    fn test_initial_state() {
        let state = StateVector::<f32>::new(3).unwrap();
        let amplitudes = state.amplitudes();

        assert_eq!(amplitudes[0], Complex::new(1.0f32, 0.0));
        for amp in &amplitudes[1..] {
            assert_eq!(*amp, Complex::new(0.0f32, 0.0));
        }
    }

    #[test]
    fn test_from_amplitudes() {
        let amplitudes = vec![Complex::new(0.5, 0.0); 4];
        let state = StateVector::<f64>::from_amplitudes(2, &amplitudes).unwrap();
        assert_eq!(state.amplitudes(), amplitudes.as_slice());
        assert_relative_eq!(state.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let amplitudes = vec![Complex::new(1.0, 0.0)];
        let result = StateVector::<f64>::from_amplitudes(2, &amplitudes);
        assert!(result.is_err());
    }

    #[test]
    fn test_reset() {
        let amplitudes = vec![Complex::new(0.5, 0.0); 4];
        let mut state = StateVector::<f64>::from_amplitudes(2, &amplitudes).unwrap();
        state.reset();
        assert_eq!(state.amplitudes()[0], Complex::new(1.0, 0.0));
        assert!(state.is_normalized(1e-12));
    }

    #[test]
    fn test_basis_state_on_subset() {
        let mut state = StateVector::<f64>::new(3).unwrap();
        state.set_basis_state(&[1, 1], &[0, 2]).unwrap();
        assert_eq!(state.amplitudes()[0b101], Complex::new(1.0, 0.0));
        assert_relative_eq!(state.norm(), 1.0);
    }

    #[test]
    fn test_state_vector_scatter() {
        let mut state = StateVector::<f64>::new(3).unwrap();
        // |01⟩ on wires [2, 0]: wire 2 = 0, wire 0 = 1
        state
            .set_state_vector(&[c(0.0, 0.0), c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)], &[2, 0])
            .unwrap();
        assert_eq!(state.amplitudes()[0b001], Complex::new(1.0, 0.0));
    }

    #[test]
    fn test_norm_rejected_outside_tolerance() {
        let mut state = StateVector::<f64>::new(1).unwrap();
        let err = state
            .set_state_vector(&[c(1.0, 0.0), c(0.1, 0.0)], &[0])
            .unwrap_err();
        assert!(matches!(err, StateError::NotNormalized { .. }));

        let tiny: f64 = 1e-7;
        let ok = state.set_state_vector(&[c((1.0 - tiny).sqrt(), 0.0), c(0.0, 0.0)], &[0]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_clone_is_independent() {
        let state = StateVector::<f64>::new(2).unwrap();
        let mut copy = state.clone_state().unwrap();
        copy.amplitudes_mut()[0] = Complex::new(0.0, 0.0);
        assert_eq!(state.amplitudes()[0], Complex::new(1.0, 0.0));
    }
}
