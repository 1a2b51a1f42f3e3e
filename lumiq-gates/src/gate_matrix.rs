//! Dense matrices for named gates and tape operations

use crate::matrices;
use lumiq_core::{DenseMatrix, GateKind, NamedGate, Operation, QuantumError, Result};

/// Matrix of a named gate in its forward direction
///
/// `num_wires` is only consulted for variadic gates (MultiRZ).
///
/// # Errors
/// Returns `InvalidParameterCount` if `params` does not match the gate.
pub fn named_matrix(gate: NamedGate, params: &[f64], num_wires: usize) -> Result<DenseMatrix> {
    if params.len() != gate.num_params() {
        return Err(QuantumError::invalid_parameter_count(
            gate.name(),
            gate.num_params(),
            params.len(),
        ));
    }

    match gate {
        NamedGate::Identity => DenseMatrix::from_rows(matrices::IDENTITY),
        NamedGate::PauliX => DenseMatrix::from_rows(matrices::PAULI_X),
        NamedGate::PauliY => DenseMatrix::from_rows(matrices::PAULI_Y),
        NamedGate::PauliZ => DenseMatrix::from_rows(matrices::PAULI_Z),
        NamedGate::Hadamard => DenseMatrix::from_rows(matrices::HADAMARD),
        NamedGate::S => DenseMatrix::from_rows(matrices::S_GATE),
        NamedGate::T => DenseMatrix::from_rows(matrices::T_GATE),
        NamedGate::SX => DenseMatrix::from_rows(matrices::SX_GATE),
        NamedGate::CNOT => DenseMatrix::from_rows(matrices::CNOT),
        NamedGate::CY => DenseMatrix::from_rows(matrices::CY),
        NamedGate::CZ => DenseMatrix::from_rows(matrices::CZ),
        NamedGate::SWAP => DenseMatrix::from_rows(matrices::SWAP),
        NamedGate::ISWAP => DenseMatrix::from_rows(matrices::ISWAP),
        NamedGate::CSWAP => DenseMatrix::from_rows(matrices::CSWAP),
        NamedGate::Toffoli => DenseMatrix::from_rows(matrices::TOFFOLI),
        NamedGate::PhaseShift => DenseMatrix::from_rows(matrices::phase_shift(params[0])),
        NamedGate::RX => DenseMatrix::from_rows(matrices::rotation_x(params[0])),
        NamedGate::RY => DenseMatrix::from_rows(matrices::rotation_y(params[0])),
        NamedGate::RZ => DenseMatrix::from_rows(matrices::rotation_z(params[0])),
        NamedGate::Rot => DenseMatrix::from_rows(matrices::rot(params[0], params[1], params[2])),
        NamedGate::CRX => {
            DenseMatrix::from_rows(matrices::controlled(matrices::rotation_x(params[0])))
        }
        NamedGate::CRY => {
            DenseMatrix::from_rows(matrices::controlled(matrices::rotation_y(params[0])))
        }
        NamedGate::CRZ => {
            DenseMatrix::from_rows(matrices::controlled(matrices::rotation_z(params[0])))
        }
        NamedGate::CRot => DenseMatrix::from_rows(matrices::controlled(matrices::rot(
            params[0], params[1], params[2],
        ))),
        NamedGate::ControlledPhaseShift => {
            DenseMatrix::from_rows(matrices::controlled(matrices::phase_shift(params[0])))
        }
        NamedGate::IsingXX => DenseMatrix::from_rows(matrices::ising_xx(params[0])),
        NamedGate::IsingYY => DenseMatrix::from_rows(matrices::ising_yy(params[0])),
        NamedGate::IsingZZ => DenseMatrix::from_rows(matrices::ising_zz(params[0])),
        NamedGate::IsingXY => DenseMatrix::from_rows(matrices::ising_xy(params[0])),
        NamedGate::SingleExcitation => {
            DenseMatrix::from_rows(matrices::single_excitation(params[0]))
        }
        NamedGate::SingleExcitationPlus => {
            DenseMatrix::from_rows(matrices::single_excitation_phased(params[0], 1.0))
        }
        NamedGate::SingleExcitationMinus => {
            DenseMatrix::from_rows(matrices::single_excitation_phased(params[0], -1.0))
        }
        NamedGate::DoubleExcitation => {
            DenseMatrix::from_rows(matrices::double_excitation(params[0]))
        }
        NamedGate::DoubleExcitationPlus => {
            DenseMatrix::from_rows(matrices::double_excitation_phased(params[0], 1.0))
        }
        NamedGate::DoubleExcitationMinus => {
            DenseMatrix::from_rows(matrices::double_excitation_phased(params[0], -1.0))
        }
        NamedGate::OrbitalRotation => DenseMatrix::from_rows(matrices::orbital_rotation(params[0])),
        NamedGate::PSWAP => DenseMatrix::from_rows(matrices::pswap(params[0])),
        NamedGate::SISWAP => DenseMatrix::from_rows(matrices::SISWAP),
        NamedGate::ECR => DenseMatrix::from_rows(matrices::ECR),
        NamedGate::MultiRZ => Ok(DenseMatrix::from_diagonal(&matrices::multi_rz_diagonal(
            params[0], num_wires,
        ))),
    }
}

/// Matrix an operation applies, with its inverse flag resolved
pub fn operation_matrix(op: &Operation) -> Result<DenseMatrix> {
    match op.gate() {
        GateKind::Matrix(m) => Ok(m.clone()),
        GateKind::Named(gate) => {
            let forward = named_matrix(*gate, op.params(), op.wires().len())?;
            Ok(if op.inverse() {
                forward.adjoint()
            } else {
                forward
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_inverse_flag_adjoints_matrix() {
        let s = Operation::named("S", &[0], &[]).unwrap();
        let s_dag = Operation::named("Adjoint(S)", &[0], &[]).unwrap();
        let m = operation_matrix(&s).unwrap();
        let m_dag = operation_matrix(&s_dag).unwrap();
        assert_eq!(m_dag.get(1, 1), Complex64::new(0.0, -1.0));
        let product = m.matmul(&m_dag).unwrap();
        assert_eq!(product, DenseMatrix::identity(2));
    }

    #[test]
    fn test_inverse_rotation_is_negated_angle() {
        let rx = Operation::new(NamedGate::RX, &[0], &[0.7], true).unwrap();
        let m = operation_matrix(&rx).unwrap();
        let expected = named_matrix(NamedGate::RX, &[-0.7], 1).unwrap();
        for (a, b) in m.data().iter().zip(expected.data()) {
            assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
            assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parameter_count_checked() {
        assert!(matches!(
            named_matrix(NamedGate::RZ, &[], 1),
            Err(QuantumError::InvalidParameterCount { .. })
        ));
    }

    #[test]
    fn test_multi_rz_width() {
        let m = named_matrix(NamedGate::MultiRZ, &[0.4], 3).unwrap();
        assert_eq!(m.dim(), 8);
        assert!(m.is_diagonal());
    }
}
