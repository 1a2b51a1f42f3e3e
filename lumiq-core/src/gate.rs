//! Gate identifiers and tape operations
//!
//! Operations are lowered once, when they are placed on the tape, into a
//! tagged [`GateKind`]: either a native named kernel or an explicit matrix.
//! Downstream code dispatches on the tag and never looks names up at run time.

use crate::matrix::DenseMatrix;
use crate::{QuantumError, Result};
use num_complex::Complex64;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Device-local wire indices; most gates touch one or two wires
pub type Wires = SmallVec<[usize; 2]>;

/// Gates with a native kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedGate {
    Identity,
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    S,
    T,
    SX,
    CNOT,
    CY,
    CZ,
    SWAP,
    ISWAP,
    CSWAP,
    Toffoli,
    PhaseShift,
    RX,
    RY,
    RZ,
    /// `RZ(ω)·RY(θ)·RZ(φ)`, lowered to three single-parameter rotations on a tape
    Rot,
    CRX,
    CRY,
    CRZ,
    /// Three-parameter controlled rotation without a single-generator form
    CRot,
    ControlledPhaseShift,
    IsingXX,
    IsingYY,
    IsingZZ,
    IsingXY,
    MultiRZ,
    SingleExcitation,
    SingleExcitationPlus,
    SingleExcitationMinus,
    DoubleExcitation,
    DoubleExcitationPlus,
    DoubleExcitationMinus,
    /// Spin-orbital rotation: SingleExcitation on wires (0, 2) and (1, 3)
    /// with the fermionic sign
    OrbitalRotation,
    PSWAP,
    SISWAP,
    ECR,
}

impl NamedGate {
    /// Every named gate, in declaration order
    pub const ALL: [NamedGate; 40] = [
        NamedGate::Identity,
        NamedGate::PauliX,
        NamedGate::PauliY,
        NamedGate::PauliZ,
        NamedGate::Hadamard,
        NamedGate::S,
        NamedGate::T,
        NamedGate::SX,
        NamedGate::CNOT,
        NamedGate::CY,
        NamedGate::CZ,
        NamedGate::SWAP,
        NamedGate::ISWAP,
        NamedGate::CSWAP,
        NamedGate::Toffoli,
        NamedGate::PhaseShift,
        NamedGate::RX,
        NamedGate::RY,
        NamedGate::RZ,
        NamedGate::Rot,
        NamedGate::CRX,
        NamedGate::CRY,
        NamedGate::CRZ,
        NamedGate::CRot,
        NamedGate::ControlledPhaseShift,
        NamedGate::IsingXX,
        NamedGate::IsingYY,
        NamedGate::IsingZZ,
        NamedGate::IsingXY,
        NamedGate::MultiRZ,
        NamedGate::SingleExcitation,
        NamedGate::SingleExcitationPlus,
        NamedGate::SingleExcitationMinus,
        NamedGate::DoubleExcitation,
        NamedGate::DoubleExcitationPlus,
        NamedGate::DoubleExcitationMinus,
        NamedGate::OrbitalRotation,
        NamedGate::PSWAP,
        NamedGate::SISWAP,
        NamedGate::ECR,
    ];

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            NamedGate::Identity => "Identity",
            NamedGate::PauliX => "PauliX",
            NamedGate::PauliY => "PauliY",
            NamedGate::PauliZ => "PauliZ",
            NamedGate::Hadamard => "Hadamard",
            NamedGate::S => "S",
            NamedGate::T => "T",
            NamedGate::SX => "SX",
            NamedGate::CNOT => "CNOT",
            NamedGate::CY => "CY",
            NamedGate::CZ => "CZ",
            NamedGate::SWAP => "SWAP",
            NamedGate::ISWAP => "ISWAP",
            NamedGate::CSWAP => "CSWAP",
            NamedGate::Toffoli => "Toffoli",
            NamedGate::PhaseShift => "PhaseShift",
            NamedGate::RX => "RX",
            NamedGate::RY => "RY",
            NamedGate::RZ => "RZ",
            NamedGate::Rot => "Rot",
            NamedGate::CRX => "CRX",
            NamedGate::CRY => "CRY",
            NamedGate::CRZ => "CRZ",
            NamedGate::CRot => "CRot",
            NamedGate::ControlledPhaseShift => "ControlledPhaseShift",
            NamedGate::IsingXX => "IsingXX",
            NamedGate::IsingYY => "IsingYY",
            NamedGate::IsingZZ => "IsingZZ",
            NamedGate::IsingXY => "IsingXY",
            NamedGate::MultiRZ => "MultiRZ",
            NamedGate::SingleExcitation => "SingleExcitation",
            NamedGate::SingleExcitationPlus => "SingleExcitationPlus",
            NamedGate::SingleExcitationMinus => "SingleExcitationMinus",
            NamedGate::DoubleExcitation => "DoubleExcitation",
            NamedGate::DoubleExcitationPlus => "DoubleExcitationPlus",
            NamedGate::DoubleExcitationMinus => "DoubleExcitationMinus",
            NamedGate::OrbitalRotation => "OrbitalRotation",
            NamedGate::PSWAP => "PSWAP",
            NamedGate::SISWAP => "SISWAP",
            NamedGate::ECR => "ECR",
        }
    }

    /// Fixed wire count, or `None` for gates that accept any number of wires
    pub fn num_wires(self) -> Option<usize> {
        match self {
            NamedGate::MultiRZ => None,
            NamedGate::DoubleExcitation
            | NamedGate::DoubleExcitationPlus
            | NamedGate::DoubleExcitationMinus
            | NamedGate::OrbitalRotation => Some(4),
            NamedGate::CSWAP | NamedGate::Toffoli => Some(3),
            NamedGate::CNOT
            | NamedGate::CY
            | NamedGate::CZ
            | NamedGate::SWAP
            | NamedGate::ISWAP
            | NamedGate::CRX
            | NamedGate::CRY
            | NamedGate::CRZ
            | NamedGate::CRot
            | NamedGate::ControlledPhaseShift
            | NamedGate::IsingXX
            | NamedGate::IsingYY
            | NamedGate::IsingZZ
            | NamedGate::IsingXY
            | NamedGate::SingleExcitation
            | NamedGate::SingleExcitationPlus
            | NamedGate::SingleExcitationMinus
            | NamedGate::PSWAP
            | NamedGate::SISWAP
            | NamedGate::ECR => Some(2),
            _ => Some(1),
        }
    }

    /// Number of numeric parameters
    pub fn num_params(self) -> usize {
        match self {
            NamedGate::PhaseShift
            | NamedGate::RX
            | NamedGate::RY
            | NamedGate::RZ
            | NamedGate::CRX
            | NamedGate::CRY
            | NamedGate::CRZ
            | NamedGate::ControlledPhaseShift
            | NamedGate::IsingXX
            | NamedGate::IsingYY
            | NamedGate::IsingZZ
            | NamedGate::IsingXY
            | NamedGate::MultiRZ
            | NamedGate::SingleExcitation
            | NamedGate::SingleExcitationPlus
            | NamedGate::SingleExcitationMinus
            | NamedGate::DoubleExcitation
            | NamedGate::DoubleExcitationPlus
            | NamedGate::DoubleExcitationMinus
            | NamedGate::OrbitalRotation
            | NamedGate::PSWAP => 1,
            NamedGate::Rot | NamedGate::CRot => 3,
            _ => 0,
        }
    }

    /// Multi-parameter gate that is lowered into single-parameter rotations
    pub fn is_composite_rotation(self) -> bool {
        matches!(self, NamedGate::Rot)
    }

    /// Look up a gate by name; accepts the `CPhase` alias
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "CPhase" {
            return Some(NamedGate::ControlledPhaseShift);
        }
        NamedGate::ALL.iter().copied().find(|g| g.name() == name)
    }
}

impl fmt::Display for NamedGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NamedGate {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self> {
        NamedGate::from_name(s).ok_or_else(|| QuantumError::UnknownGate(s.to_string()))
    }
}

/// How an operation is applied: decided once at lowering time
#[derive(Debug, Clone, PartialEq)]
pub enum GateKind {
    /// Native kernel selected by name
    Named(NamedGate),
    /// Explicit matrix, already in its final (possibly inverted) form
    Matrix(DenseMatrix),
}

/// A gate placed on a tape: immutable once constructed
#[derive(Clone, PartialEq)]
pub struct Operation {
    gate: GateKind,
    wires: Wires,
    inverse: bool,
    params: SmallVec<[f64; 1]>,
}

impl Operation {
    /// Create a named-gate operation
    ///
    /// # Errors
    /// Returns error if:
    /// - the wire count does not match the gate's arity
    /// - a wire is listed twice
    /// - the parameter count does not match the gate
    pub fn new(gate: NamedGate, wires: &[usize], params: &[f64], inverse: bool) -> Result<Self> {
        match gate.num_wires() {
            Some(expected) if expected != wires.len() => {
                return Err(QuantumError::invalid_wire_count(
                    gate.name(),
                    expected,
                    wires.len(),
                ));
            }
            None if wires.is_empty() => {
                return Err(QuantumError::invalid_wire_count(gate.name(), 1, 0));
            }
            _ => {}
        }
        if params.len() != gate.num_params() {
            return Err(QuantumError::invalid_parameter_count(
                gate.name(),
                gate.num_params(),
                params.len(),
            ));
        }
        check_distinct(wires)?;

        Ok(Self {
            gate: GateKind::Named(gate),
            wires: SmallVec::from_slice(wires),
            inverse,
            params: SmallVec::from_slice(params),
        })
    }

    /// Create a named-gate operation from its string name
    ///
    /// `Adjoint(X)` selects gate `X` with the inverse flag set.
    pub fn named(name: &str, wires: &[usize], params: &[f64]) -> Result<Self> {
        match name
            .strip_prefix("Adjoint(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(base) => Self::new(base.parse()?, wires, params, true),
            None => Self::new(name.parse()?, wires, params, false),
        }
    }

    /// Create an explicit-matrix operation
    ///
    /// The matrix must already be in its final form; explicit matrices carry
    /// no inverse flag and no differentiable parameters.
    pub fn unitary(matrix: DenseMatrix, wires: &[usize]) -> Result<Self> {
        if matrix.num_wires() != wires.len() {
            return Err(QuantumError::MalformedMatrix(format!(
                "{}x{} matrix cannot act on {} wires",
                matrix.dim(),
                matrix.dim(),
                wires.len()
            )));
        }
        check_distinct(wires)?;

        Ok(Self {
            gate: GateKind::Matrix(matrix),
            wires: SmallVec::from_slice(wires),
            inverse: false,
            params: SmallVec::new(),
        })
    }

    /// Create an explicit-matrix operation from column-major data
    pub fn from_column_major(data: &[Complex64], wires: &[usize]) -> Result<Self> {
        Self::unitary(DenseMatrix::from_column_major(data)?, wires)
    }

    #[inline]
    pub fn gate(&self) -> &GateKind {
        &self.gate
    }

    /// Named gate, if this is not an explicit-matrix operation
    #[inline]
    pub fn named_gate(&self) -> Option<NamedGate> {
        match self.gate {
            GateKind::Named(g) => Some(g),
            GateKind::Matrix(_) => None,
        }
    }

    #[inline]
    pub fn wires(&self) -> &[usize] {
        &self.wires
    }

    #[inline]
    pub fn inverse(&self) -> bool {
        self.inverse
    }

    #[inline]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    #[inline]
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    /// Display name, `QubitUnitary` for explicit matrices
    pub fn name(&self) -> &str {
        match &self.gate {
            GateKind::Named(g) => g.name(),
            GateKind::Matrix(_) => "QubitUnitary",
        }
    }

    /// Same gate with the inverse flag toggled
    ///
    /// Explicit matrices are replaced by their adjoint instead.
    pub fn adjoint(&self) -> Self {
        match &self.gate {
            GateKind::Named(_) => Self {
                inverse: !self.inverse,
                ..self.clone()
            },
            GateKind::Matrix(m) => Self {
                gate: GateKind::Matrix(m.adjoint()),
                ..self.clone()
            },
        }
    }

    /// Check all wires against the register size
    pub fn validate_wires(&self, num_wires: usize) -> Result<()> {
        match self.wires.iter().find(|&&w| w >= num_wires) {
            Some(&w) => Err(QuantumError::InvalidWire(w, num_wires)),
            None => Ok(()),
        }
    }
}

pub(crate) fn check_distinct(wires: &[usize]) -> Result<()> {
    for i in 0..wires.len() {
        for j in (i + 1)..wires.len() {
            if wires[i] == wires[j] {
                return Err(QuantumError::DuplicateWire(wires[i]));
            }
        }
    }
    Ok(())
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        if self.inverse {
            write!(f, "†")?;
        }
        if !self.params.is_empty() {
            write!(f, "{:?}", self.params.as_slice())?;
        }
        write!(f, "(")?;
        for (i, w) in self.wires.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "w{}", w)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// State preparation; only ever the first entry of a tape
#[derive(Debug, Clone, PartialEq)]
pub enum StatePrep {
    /// Computational basis state on a subset of wires
    BasisState { bits: Vec<u8>, wires: Wires },
    /// Explicit amplitudes on a subset of wires (others start in |0⟩)
    StateVector {
        amplitudes: Vec<Complex64>,
        wires: Wires,
    },
}

impl StatePrep {
    /// Basis state preparation
    ///
    /// # Errors
    /// Returns `InvalidStatePrep` if a bit is not 0 or 1 or the lengths differ.
    pub fn basis_state(bits: &[u8], wires: &[usize]) -> Result<Self> {
        if bits.iter().any(|&b| b > 1) {
            return Err(QuantumError::InvalidStatePrep(
                "BasisState parameter must consist of 0 or 1 integers".into(),
            ));
        }
        if bits.len() != wires.len() {
            return Err(QuantumError::InvalidStatePrep(
                "BasisState parameter and wires must be of equal length".into(),
            ));
        }
        check_distinct(wires)?;
        Ok(StatePrep::BasisState {
            bits: bits.to_vec(),
            wires: SmallVec::from_slice(wires),
        })
    }

    /// Amplitude preparation; normalization is checked when the state is loaded
    ///
    /// # Errors
    /// Returns `InvalidStatePrep` if the length is not `2^len(wires)`.
    pub fn state_vector(amplitudes: &[Complex64], wires: &[usize]) -> Result<Self> {
        if amplitudes.len() != 1 << wires.len() {
            return Err(QuantumError::InvalidStatePrep(format!(
                "State vector must have shape (2**wires,): got {} amplitudes for {} wires",
                amplitudes.len(),
                wires.len()
            )));
        }
        check_distinct(wires)?;
        Ok(StatePrep::StateVector {
            amplitudes: amplitudes.to_vec(),
            wires: SmallVec::from_slice(wires),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatePrep::BasisState { .. } => "BasisState",
            StatePrep::StateVector { .. } => "QubitStateVector",
        }
    }

    pub fn wires(&self) -> &[usize] {
        match self {
            StatePrep::BasisState { wires, .. } | StatePrep::StateVector { wires, .. } => wires,
        }
    }

    pub fn validate_wires(&self, num_wires: usize) -> Result<()> {
        match self.wires().iter().find(|&&w| w >= num_wires) {
            Some(&w) => Err(QuantumError::InvalidWire(w, num_wires)),
            None => Ok(()),
        }
    }
}
