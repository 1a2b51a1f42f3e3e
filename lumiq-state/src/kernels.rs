//! In-place gate kernels and contractions on amplitude buffers
//!
//! A matrix on wires `[w0, w1, …]` reads its local index with `w0` as the
//! most significant bit; in the global amplitude index wire `w` is bit `w`.
//! Large registers are split across the rayon pool.

use crate::error::{Result, StateError};
use crate::precision::Precision;
use crate::state_vector::StateVector;
use lumiq_core::{CsrMatrix, DenseMatrix};
use num_complex::{Complex, Complex64};
use rayon::prelude::*;

/// Registers with at least this many qubits use parallel kernels
const PARALLEL_THRESHOLD: usize = 14;

/// Global offset of every local index of `wires`
pub fn local_offsets(wires: &[usize]) -> Vec<usize> {
    let k = wires.len();
    (0..1usize << k)
        .map(|local| {
            wires
                .iter()
                .enumerate()
                .fold(0, |acc, (j, &w)| acc | (((local >> (k - 1 - j)) & 1) << w))
        })
        .collect()
}

/// Local index of `wires` inside global index `index`
#[inline]
pub fn local_index(index: usize, wires: &[usize]) -> usize {
    let k = wires.len();
    wires
        .iter()
        .enumerate()
        .fold(0, |acc, (j, &w)| acc | (((index >> w) & 1) << (k - 1 - j)))
}

fn wire_mask(wires: &[usize]) -> usize {
    wires.iter().fold(0, |acc, &w| acc | (1 << w))
}

/// Apply a 2x2 matrix to one wire
///
/// Amplitudes are processed in blocks of `2·2^wire`; the low and high halves
/// of each block are the |0⟩ and |1⟩ partners.
pub fn apply_single_qubit<P: Precision>(
    state: &mut StateVector<P>,
    matrix: [Complex<P>; 4],
    wire: usize,
) -> Result<()> {
    state.check_wires(&[wire])?;
    let parallel = state.num_qubits() >= PARALLEL_THRESHOLD;
    let stride = 1usize << wire;
    let [m00, m01, m10, m11] = matrix;

    let kernel = |block: &mut [Complex<P>]| {
        let (lo, hi) = block.split_at_mut(stride);
        for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
            let (x, y) = (*a, *b);
            *a = m00 * x + m01 * y;
            *b = m10 * x + m11 * y;
        }
    };

    let amps = state.amplitudes_mut();
    if parallel {
        amps.par_chunks_mut(2 * stride).for_each(kernel);
    } else {
        amps.chunks_mut(2 * stride).for_each(kernel);
    }
    Ok(())
}

/// Multiply every amplitude by the diagonal entry of its local index
pub fn apply_diagonal<P: Precision>(
    state: &mut StateVector<P>,
    diagonal: &[Complex<P>],
    wires: &[usize],
) -> Result<()> {
    state.check_wires(wires)?;
    check_len(diagonal.len(), 1 << wires.len())?;
    let parallel = state.num_qubits() >= PARALLEL_THRESHOLD;

    let amps = state.amplitudes_mut();
    if parallel {
        amps.par_iter_mut()
            .enumerate()
            .for_each(|(i, a)| *a = *a * diagonal[local_index(i, wires)]);
    } else {
        for (i, a) in amps.iter_mut().enumerate() {
            *a = *a * diagonal[local_index(i, wires)];
        }
    }
    Ok(())
}

/// Apply a dense row-major `2^k x 2^k` matrix to `k` wires
pub fn apply_matrix<P: Precision>(
    state: &mut StateVector<P>,
    matrix: &[Complex<P>],
    wires: &[usize],
) -> Result<()> {
    state.check_wires(wires)?;
    let local_dim = 1usize << wires.len();
    check_len(matrix.len(), local_dim * local_dim)?;

    let offsets = local_offsets(wires);
    let mask = wire_mask(wires);
    let zero = Complex::new(P::zero(), P::zero());
    let mut buf = vec![zero; local_dim];

    let amps = state.amplitudes_mut();
    for base in (0..amps.len()).filter(|b| b & mask == 0) {
        for (slot, &off) in buf.iter_mut().zip(&offsets) {
            *slot = amps[base + off];
        }
        for (row, &off) in offsets.iter().enumerate() {
            let coeffs = &matrix[row * local_dim..(row + 1) * local_dim];
            amps[base + off] = coeffs
                .iter()
                .zip(&buf)
                .fold(zero, |acc, (&m, &v)| acc + m * v);
        }
    }
    Ok(())
}

/// Apply a double-precision matrix, choosing the cheapest kernel
pub fn apply_dense<P: Precision>(
    state: &mut StateVector<P>,
    matrix: &DenseMatrix,
    wires: &[usize],
) -> Result<()> {
    check_len(matrix.dim(), 1 << wires.len())?;
    if matrix.is_diagonal() {
        let diagonal: Vec<_> = matrix.diagonal().into_iter().map(P::complex).collect();
        return apply_diagonal(state, &diagonal, wires);
    }
    let data: Vec<_> = matrix.data().iter().map(|&z| P::complex(z)).collect();
    if wires.len() == 1 {
        apply_single_qubit(state, [data[0], data[1], data[2], data[3]], wires[0])
    } else {
        apply_matrix(state, &data, wires)
    }
}

/// `out = O·state` for a sparse operator on `wires`, identity elsewhere
pub fn apply_csr<P: Precision>(
    state: &StateVector<P>,
    matrix: &CsrMatrix,
    wires: &[usize],
    out: &mut StateVector<P>,
) -> Result<()> {
    state.check_wires(wires)?;
    check_len(matrix.dim(), 1 << wires.len())?;
    check_len(out.dimension(), state.dimension())?;

    let offsets = local_offsets(wires);
    let mask = wire_mask(wires);
    let zero = Complex::new(P::zero(), P::zero());
    let src = state.amplitudes();
    let dst = out.amplitudes_mut();
    dst.iter_mut().for_each(|a| *a = zero);

    for base in (0..src.len()).filter(|b| b & mask == 0) {
        for (row, &off) in offsets.iter().enumerate() {
            dst[base + off] = matrix
                .row(row)
                .fold(zero, |acc, (col, v)| acc + P::complex(v) * src[base + offsets[col]]);
        }
    }
    Ok(())
}

/// ⟨a|b⟩ accumulated in double precision
pub fn inner_product<P: Precision>(a: &StateVector<P>, b: &StateVector<P>) -> Result<Complex64> {
    check_len(b.dimension(), a.dimension())?;
    let term = |(x, y): (&Complex<P>, &Complex<P>)| P::widen(*x).conj() * P::widen(*y);

    if a.num_qubits() >= PARALLEL_THRESHOLD {
        Ok(a.amplitudes()
            .par_iter()
            .zip(b.amplitudes().par_iter())
            .map(term)
            .reduce(|| Complex64::new(0.0, 0.0), |p, q| p + q))
    } else {
        Ok(a.amplitudes()
            .iter()
            .zip(b.amplitudes())
            .map(term)
            .fold(Complex64::new(0.0, 0.0), |p, q| p + q))
    }
}

/// |amplitude|² of every basis state
pub fn probabilities<P: Precision>(state: &StateVector<P>) -> Vec<f64> {
    state
        .amplitudes()
        .iter()
        .map(|a| a.norm_sqr().as_f64())
        .collect()
}

/// Marginal distribution over `wires`, `wires[0]` as the most significant bit
pub fn marginal_probabilities<P: Precision>(
    state: &StateVector<P>,
    wires: &[usize],
) -> Result<Vec<f64>> {
    state.check_wires(wires)?;
    let mut out = vec![0.0; 1 << wires.len()];
    for (i, a) in state.amplitudes().iter().enumerate() {
        out[local_index(i, wires)] += a.norm_sqr().as_f64();
    }
    Ok(out)
}

/// `dst += coeff·src`
pub fn axpy<P: Precision>(
    coeff: Complex64,
    src: &StateVector<P>,
    dst: &mut StateVector<P>,
) -> Result<()> {
    check_len(dst.dimension(), src.dimension())?;
    let c = P::complex(coeff);
    for (d, &s) in dst.amplitudes_mut().iter_mut().zip(src.amplitudes()) {
        *d = *d + c * s;
    }
    Ok(())
}

fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(StateError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
