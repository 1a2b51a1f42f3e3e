//! Generators of single-parameter gates
//!
//! Every differentiable gate is written `U(θ) = exp(i·scale·θ·G)` with a
//! Hermitian `G`. The adjoint sweep contracts `G` against the ket, so the
//! derivative of `⟨ψ|U†OU|ψ⟩` is `-2·scale·Im⟨bra|G|ket⟩`.

use crate::matrices::{self, ONE, ZERO};
use lumiq_core::{DenseMatrix, NamedGate, Result};
use num_complex::Complex64;

/// Generator matrix and the scale factor in the exponent
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub matrix: DenseMatrix,
    pub scale: f64,
}

impl Generator {
    fn new(matrix: DenseMatrix, scale: f64) -> Self {
        Self { matrix, scale }
    }
}

/// Generator of `gate` acting on `num_wires` wires
///
/// Returns `Ok(None)` for gates with no single-parameter generator: fixed
/// gates, `Rot` and `CRot`.
pub fn generator(gate: NamedGate, num_wires: usize) -> Result<Option<Generator>> {
    let g = match gate {
        NamedGate::RX => Generator::new(DenseMatrix::from_rows(matrices::PAULI_X)?, -0.5),
        NamedGate::RY => Generator::new(DenseMatrix::from_rows(matrices::PAULI_Y)?, -0.5),
        NamedGate::RZ => Generator::new(DenseMatrix::from_rows(matrices::PAULI_Z)?, -0.5),
        NamedGate::PhaseShift => Generator::new(DenseMatrix::from_rows(matrices::PROJ_ONE)?, 1.0),
        NamedGate::CRX => Generator::new(controlled_generator(matrices::PAULI_X)?, -0.5),
        NamedGate::CRY => Generator::new(controlled_generator(matrices::PAULI_Y)?, -0.5),
        NamedGate::CRZ => Generator::new(controlled_generator(matrices::PAULI_Z)?, -0.5),
        NamedGate::ControlledPhaseShift => Generator::new(
            DenseMatrix::from_diagonal(&[ZERO, ZERO, ZERO, ONE]),
            1.0,
        ),
        NamedGate::IsingXX => Generator::new(pauli_pair(matrices::PAULI_X)?, -0.5),
        NamedGate::IsingYY => Generator::new(pauli_pair(matrices::PAULI_Y)?, -0.5),
        NamedGate::IsingZZ => Generator::new(pauli_pair(matrices::PAULI_Z)?, -0.5),
        NamedGate::IsingXY => {
            let xx = pauli_pair(matrices::PAULI_X)?;
            let yy = pauli_pair(matrices::PAULI_Y)?;
            Generator::new(xx.add(&yy)?, 0.25)
        }
        NamedGate::MultiRZ => {
            let diagonal: Vec<Complex64> = (0..1usize << num_wires)
                .map(|b| if b.count_ones() % 2 == 0 { ONE } else { -ONE })
                .collect();
            Generator::new(DenseMatrix::from_diagonal(&diagonal), -0.5)
        }
        NamedGate::SingleExcitation => {
            Generator::new(DenseMatrix::from_rows(excitation_block(ZERO))?, -0.5)
        }
        NamedGate::SingleExcitationPlus => {
            Generator::new(DenseMatrix::from_rows(excitation_block(-ONE))?, -0.5)
        }
        NamedGate::SingleExcitationMinus => {
            Generator::new(DenseMatrix::from_rows(excitation_block(ONE))?, -0.5)
        }
        NamedGate::DoubleExcitation => Generator::new(double_excitation_generator(ZERO)?, -0.5),
        NamedGate::DoubleExcitationPlus => Generator::new(double_excitation_generator(-ONE)?, -0.5),
        NamedGate::DoubleExcitationMinus => Generator::new(double_excitation_generator(ONE)?, -0.5),
        NamedGate::OrbitalRotation => {
            let block = excitation_block(ZERO);
            let mut identity = [[ZERO; 4]; 4];
            for (i, row) in identity.iter_mut().enumerate() {
                row[i] = ONE;
            }
            let mut sum = matrices::kron4(&block, &identity);
            let second = matrices::kron4(&identity, &block);
            for (row, other) in sum.iter_mut().zip(second.iter()) {
                for (cell, &o) in row.iter_mut().zip(other.iter()) {
                    *cell += o;
                }
            }
            Generator::new(DenseMatrix::from_rows(matrices::fermionic_conjugate(&sum))?, -0.5)
        }
        NamedGate::PSWAP => Generator::new(
            DenseMatrix::from_diagonal(&[ZERO, ONE, ONE, ZERO]),
            1.0,
        ),
        _ => return Ok(None),
    };
    Ok(Some(g))
}

/// |1⟩⟨1| ⊗ P
fn controlled_generator(p: [[Complex64; 2]; 2]) -> Result<DenseMatrix> {
    Ok(DenseMatrix::from_rows(matrices::PROJ_ONE)?.kron(&DenseMatrix::from_rows(p)?))
}

/// Y on the {|01⟩, |10⟩} block with `outer` on |00⟩ and |11⟩
fn excitation_block(outer: Complex64) -> [[Complex64; 4]; 4] {
    let mut rows = [[ZERO; 4]; 4];
    rows[0][0] = outer;
    rows[3][3] = outer;
    rows[1][2] = Complex64::new(0.0, -1.0);
    rows[2][1] = Complex64::new(0.0, 1.0);
    rows
}

/// Y on the {|0011⟩, |1100⟩} block with `outer` everywhere else on the diagonal
fn double_excitation_generator(outer: Complex64) -> Result<DenseMatrix> {
    let mut rows = [[ZERO; 16]; 16];
    for (i, row) in rows.iter_mut().enumerate() {
        if i != 3 && i != 12 {
            row[i] = outer;
        }
    }
    rows[3][12] = Complex64::new(0.0, -1.0);
    rows[12][3] = Complex64::new(0.0, 1.0);
    DenseMatrix::from_rows(rows)
}

/// P ⊗ P
fn pauli_pair(p: [[Complex64; 2]; 2]) -> Result<DenseMatrix> {
    let single = DenseMatrix::from_rows(p)?;
    Ok(single.kron(&single))
}
