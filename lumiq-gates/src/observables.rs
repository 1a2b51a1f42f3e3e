//! Matrices and eigenbases of observables

use crate::matrices;
use lumiq_core::{
    Complex64, DenseMatrix, NamedGate, NamedObservable, Observable, Operation, QuantumError,
    Result,
};

/// 2x2 matrix of a named observable
pub fn named_observable_matrix(kind: NamedObservable) -> Result<DenseMatrix> {
    match kind {
        NamedObservable::PauliX => DenseMatrix::from_rows(matrices::PAULI_X),
        NamedObservable::PauliY => DenseMatrix::from_rows(matrices::PAULI_Y),
        NamedObservable::PauliZ => DenseMatrix::from_rows(matrices::PAULI_Z),
        NamedObservable::Hadamard => DenseMatrix::from_rows(matrices::HADAMARD),
        NamedObservable::Identity => DenseMatrix::from_rows(matrices::IDENTITY),
    }
}

/// Dense matrix of an observable over `obs.wires()`, in that order
///
/// Sparse Hamiltonians are expanded here; callers that can work on CSR data
/// directly should do so instead.
pub fn observable_matrix(obs: &Observable) -> Result<DenseMatrix> {
    match obs {
        Observable::Named { kind, .. } => named_observable_matrix(*kind),
        Observable::Tensor(factors) => {
            let mut acc: Option<DenseMatrix> = None;
            for factor in factors {
                let m = observable_matrix(factor)?;
                acc = Some(match acc {
                    Some(prev) => prev.kron(&m),
                    None => m,
                });
            }
            acc.ok_or_else(|| QuantumError::MalformedMatrix("empty tensor product".into()))
        }
        Observable::Hermitian { matrix, .. } => Ok(matrix.clone()),
        Observable::Projector { basis, .. } => {
            let index = basis.iter().fold(0usize, |acc, &b| (acc << 1) | b as usize);
            let mut diagonal = vec![Complex64::new(0.0, 0.0); 1 << basis.len()];
            diagonal[index] = Complex64::new(1.0, 0.0);
            Ok(DenseMatrix::from_diagonal(&diagonal))
        }
        Observable::Hamiltonian { terms } => {
            let wires = obs.wires();
            let mut total = DenseMatrix::from_diagonal(&vec![
                Complex64::new(0.0, 0.0);
                1 << wires.len()
            ]);
            for (coeff, term) in terms {
                let local = embed(&observable_matrix(term)?, &term.wires(), &wires)?;
                total = total.add(&local.scaled(*coeff))?;
            }
            Ok(total)
        }
        Observable::SparseHamiltonian { matrix, .. } => {
            let dim = matrix.dim();
            let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
            for row in 0..dim {
                for (col, value) in matrix.row(row) {
                    data[row * dim + col] += value;
                }
            }
            DenseMatrix::from_row_major(data)
        }
    }
}

/// Extend a matrix on `from` wires to act on the larger ordered set `onto`
///
/// # Errors
/// Returns `MalformedMatrix` if a wire of `from` is missing from `onto`.
pub fn embed(matrix: &DenseMatrix, from: &[usize], onto: &[usize]) -> Result<DenseMatrix> {
    if from == onto {
        return Ok(matrix.clone());
    }
    let k = onto.len();
    let shifts = from
        .iter()
        .map(|w| {
            onto.iter()
                .position(|o| o == w)
                .map(|p| k - 1 - p)
                .ok_or_else(|| {
                    QuantumError::MalformedMatrix(format!("wire {} not in target set", w))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    let covered: usize = shifts.iter().map(|s| 1usize << s).sum();
    let rest = ((1usize << k) - 1) & !covered;
    let m = from.len();

    let sub = |index: usize| -> usize {
        shifts
            .iter()
            .enumerate()
            .fold(0, |acc, (j, &s)| acc | (((index >> s) & 1) << (m - 1 - j)))
    };

    let dim = 1usize << k;
    let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
    for r in 0..dim {
        for c in 0..dim {
            if r & rest == c & rest {
                data[r * dim + c] = matrix.get(sub(r), sub(c));
            }
        }
    }
    DenseMatrix::from_row_major(data)
}

/// Rotation into an observable's eigenbasis plus the wires that carry a ±1
/// eigenvalue after rotation
#[derive(Debug, Clone)]
pub struct EigenBasis {
    pub rotations: Vec<Operation>,
    pub signed_wires: Vec<usize>,
}

impl EigenBasis {
    /// Eigenvalue of one sample row (indexed by wire)
    pub fn eigenvalue(&self, bits: &[u8]) -> f64 {
        self.signed_wires
            .iter()
            .map(|&w| if bits[w] == 0 { 1.0 } else { -1.0 })
            .product()
    }
}

/// Eigenbasis of a product of named single-wire observables
///
/// Returns `Ok(None)` for observables without a product eigenbasis
/// (Hermitian, Projector, Hamiltonian, SparseHamiltonian).
pub fn eigen_basis(obs: &Observable) -> Result<Option<EigenBasis>> {
    let factors: Vec<(NamedObservable, usize)> = match obs {
        Observable::Named { kind, wire } => vec![(*kind, *wire)],
        Observable::Tensor(parts) => {
            let mut out = Vec::with_capacity(parts.len());
            for part in parts {
                match part {
                    Observable::Named { kind, wire } => out.push((*kind, *wire)),
                    _ => return Ok(None),
                }
            }
            out
        }
        _ => return Ok(None),
    };

    let mut rotations = Vec::new();
    let mut signed_wires = Vec::new();
    for (kind, wire) in factors {
        match kind {
            NamedObservable::PauliX => {
                rotations.push(Operation::new(NamedGate::Hadamard, &[wire], &[], false)?);
            }
            NamedObservable::PauliY => {
                rotations.push(Operation::new(NamedGate::S, &[wire], &[], true)?);
                rotations.push(Operation::new(NamedGate::Hadamard, &[wire], &[], false)?);
            }
            NamedObservable::Hadamard => {
                rotations.push(Operation::new(
                    NamedGate::RY,
                    &[wire],
                    &[-std::f64::consts::FRAC_PI_4],
                    false,
                )?);
            }
            NamedObservable::PauliZ | NamedObservable::Identity => {}
        }
        if kind != NamedObservable::Identity {
            signed_wires.push(wire);
        }
    }
    Ok(Some(EigenBasis {
        rotations,
        signed_wires,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_matrix::operation_matrix;
    use approx::assert_abs_diff_eq;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_tensor_matrix_is_kron() {
        let zx = Observable::tensor(vec![Observable::pauli_z(0), Observable::pauli_x(1)]).unwrap();
        let m = observable_matrix(&zx).unwrap();
        assert_eq!(m.dim(), 4);
        // Z on the high bit, X on the low bit
        assert_eq!(m.get(0, 1), c(1.0));
        assert_eq!(m.get(2, 3), c(-1.0));
    }

    #[test]
    fn test_embed_reorders_wires() {
        let z = named_observable_matrix(NamedObservable::PauliZ).unwrap();
        // Z on wire 3 inside [5, 3]: wire 3 is the low bit
        let m = embed(&z, &[3], &[5, 3]).unwrap();
        assert_eq!(m.diagonal(), vec![c(1.0), c(-1.0), c(1.0), c(-1.0)]);
        assert!(embed(&z, &[7], &[5, 3]).is_err());
    }

    #[test]
    fn test_hamiltonian_matrix_sums_terms() {
        let ham = Observable::hamiltonian(vec![
            (0.5, Observable::pauli_z(0)),
            (2.0, Observable::pauli_z(1)),
        ]);
        let m = observable_matrix(&ham).unwrap();
        assert_eq!(m.diagonal(), vec![c(2.5), c(-1.5), c(1.5), c(-2.5)]);
    }

    #[test]
    fn test_projector_matrix() {
        let p = Observable::projector(&[1, 0], &[0, 1]).unwrap();
        let m = observable_matrix(&p).unwrap();
        assert_eq!(m.diagonal(), vec![c(0.0), c(0.0), c(1.0), c(0.0)]);
    }

    #[test]
    fn test_eigen_basis_diagonalizes() {
        // R·O·R† must be diagonal with entries ±1
        for kind in [
            NamedObservable::PauliX,
            NamedObservable::PauliY,
            NamedObservable::Hadamard,
        ] {
            let obs = Observable::named(kind, 0);
            let basis = eigen_basis(&obs).unwrap().unwrap();
            let mut r = DenseMatrix::identity(2);
            for op in &basis.rotations {
                r = operation_matrix(op).unwrap().matmul(&r).unwrap();
            }
            let o = observable_matrix(&obs).unwrap();
            let d = r.matmul(&o).unwrap().matmul(&r.adjoint()).unwrap();
            assert_abs_diff_eq!(d.get(0, 1).norm(), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(d.get(0, 0).re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(d.get(1, 1).re, -1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_eigenvalue_skips_identity() {
        let obs = Observable::tensor(vec![
            Observable::pauli_z(0),
            Observable::named(NamedObservable::Identity, 1),
        ])
        .unwrap();
        let basis = eigen_basis(&obs).unwrap().unwrap();
        assert_eq!(basis.eigenvalue(&[1, 1]), -1.0);
        assert_eq!(basis.eigenvalue(&[0, 1]), 1.0);
        assert!(eigen_basis(&Observable::hamiltonian(vec![])).unwrap().is_none());
    }
}
