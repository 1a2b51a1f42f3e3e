//! Observables measured at the end of a tape

use crate::gate::check_distinct;
use crate::matrix::{CsrMatrix, DenseMatrix};
use crate::{QuantumError, Result};
use std::fmt;
use std::str::FromStr;

/// Single-wire named operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedObservable {
    PauliX,
    PauliY,
    PauliZ,
    Hadamard,
    Identity,
}

impl NamedObservable {
    pub fn name(self) -> &'static str {
        match self {
            NamedObservable::PauliX => "PauliX",
            NamedObservable::PauliY => "PauliY",
            NamedObservable::PauliZ => "PauliZ",
            NamedObservable::Hadamard => "Hadamard",
            NamedObservable::Identity => "Identity",
        }
    }

    /// True for X, Y, Z and the identity
    pub fn is_pauli(self) -> bool {
        !matches!(self, NamedObservable::Hadamard)
    }
}

impl FromStr for NamedObservable {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PauliX" => Ok(NamedObservable::PauliX),
            "PauliY" => Ok(NamedObservable::PauliY),
            "PauliZ" => Ok(NamedObservable::PauliZ),
            "Hadamard" => Ok(NamedObservable::Hadamard),
            "Identity" => Ok(NamedObservable::Identity),
            other => Err(QuantumError::UnknownObservable(other.to_string())),
        }
    }
}

/// A measurable operator
#[derive(Debug, Clone, PartialEq)]
pub enum Observable {
    /// Named single-wire operator
    Named { kind: NamedObservable, wire: usize },
    /// Product of factors on disjoint wires
    Tensor(Vec<Observable>),
    /// Dense Hermitian matrix; the first wire is the most significant local bit
    Hermitian { matrix: DenseMatrix, wires: Vec<usize> },
    /// Projector onto a computational basis state of the given wires
    Projector { basis: Vec<u8>, wires: Vec<usize> },
    /// Weighted sum of terms
    Hamiltonian { terms: Vec<(f64, Observable)> },
    /// Sparse operator on the listed wires, applied without densifying
    SparseHamiltonian { matrix: CsrMatrix, wires: Vec<usize> },
}

impl Observable {
    /// Named operator on one wire
    pub fn named(kind: NamedObservable, wire: usize) -> Self {
        Observable::Named { kind, wire }
    }

    pub fn pauli_x(wire: usize) -> Self {
        Self::named(NamedObservable::PauliX, wire)
    }

    pub fn pauli_y(wire: usize) -> Self {
        Self::named(NamedObservable::PauliY, wire)
    }

    pub fn pauli_z(wire: usize) -> Self {
        Self::named(NamedObservable::PauliZ, wire)
    }

    /// Tensor product
    ///
    /// Nested tensors are flattened. Factors must act on disjoint wires and
    /// may not be sums.
    pub fn tensor(factors: Vec<Observable>) -> Result<Self> {
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Observable::Tensor(inner) => flat.extend(inner),
                Observable::Hamiltonian { .. } | Observable::SparseHamiltonian { .. } => {
                    return Err(QuantumError::UnknownObservable(format!(
                        "{} cannot be a tensor factor",
                        factor.name()
                    )));
                }
                other => flat.push(other),
            }
        }
        let wires: Vec<usize> = flat.iter().flat_map(|f| f.wires()).collect();
        check_distinct(&wires)?;
        Ok(Observable::Tensor(flat))
    }

    /// Hermitian matrix on the given wires
    pub fn hermitian(matrix: DenseMatrix, wires: &[usize]) -> Result<Self> {
        if matrix.num_wires() != wires.len() {
            return Err(QuantumError::MalformedMatrix(format!(
                "{}x{} Hermitian cannot act on {} wires",
                matrix.dim(),
                matrix.dim(),
                wires.len()
            )));
        }
        check_distinct(wires)?;
        Ok(Observable::Hermitian {
            matrix,
            wires: wires.to_vec(),
        })
    }

    /// Basis-state projector
    pub fn projector(basis: &[u8], wires: &[usize]) -> Result<Self> {
        if basis.len() != wires.len() || basis.iter().any(|&b| b > 1) {
            return Err(QuantumError::UnknownObservable(
                "Projector basis must be a 0/1 string with one bit per wire".into(),
            ));
        }
        check_distinct(wires)?;
        Ok(Observable::Projector {
            basis: basis.to_vec(),
            wires: wires.to_vec(),
        })
    }

    /// Weighted sum; nested Hamiltonians are expanded into their terms
    pub fn hamiltonian(terms: Vec<(f64, Observable)>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for (coeff, term) in terms {
            match term {
                Observable::Hamiltonian { terms: inner } => {
                    flat.extend(inner.into_iter().map(|(c, t)| (coeff * c, t)));
                }
                other => flat.push((coeff, other)),
            }
        }
        Observable::Hamiltonian { terms: flat }
    }

    /// Sparse operator; the matrix dimension must be `2^len(wires)`
    pub fn sparse_hamiltonian(matrix: CsrMatrix, wires: &[usize]) -> Result<Self> {
        if matrix.num_wires() != wires.len() {
            return Err(QuantumError::MalformedSparse(format!(
                "dimension {} does not match {} wires",
                matrix.dim(),
                wires.len()
            )));
        }
        check_distinct(wires)?;
        Ok(Observable::SparseHamiltonian {
            matrix,
            wires: wires.to_vec(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Observable::Named { kind, .. } => kind.name(),
            Observable::Tensor(_) => "Tensor",
            Observable::Hermitian { .. } => "Hermitian",
            Observable::Projector { .. } => "Projector",
            Observable::Hamiltonian { .. } => "Hamiltonian",
            Observable::SparseHamiltonian { .. } => "SparseHamiltonian",
        }
    }

    /// Wires in first-appearance order, without repeats
    pub fn wires(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_wires(&mut out);
        out
    }

    fn collect_wires(&self, out: &mut Vec<usize>) {
        fn push(out: &mut Vec<usize>, w: usize) {
            if !out.contains(&w) {
                out.push(w);
            }
        }
        match self {
            Observable::Named { wire, .. } => push(out, *wire),
            Observable::Hermitian { wires, .. }
            | Observable::Projector { wires, .. }
            | Observable::SparseHamiltonian { wires, .. } => {
                wires.iter().for_each(|&w| push(out, w))
            }
            Observable::Tensor(factors) => factors.iter().for_each(|f| f.collect_wires(out)),
            Observable::Hamiltonian { terms } => {
                terms.iter().for_each(|(_, t)| t.collect_wires(out))
            }
        }
    }

    /// Check every wire against the register size
    pub fn validate_wires(&self, num_wires: usize) -> Result<()> {
        match self.wires().into_iter().find(|&w| w >= num_wires) {
            Some(w) => Err(QuantumError::InvalidWire(w, num_wires)),
            None => Ok(()),
        }
    }

    /// True if `pred` holds for this observable or any nested factor or term
    pub fn any(&self, pred: &impl Fn(&Observable) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self {
            Observable::Tensor(factors) => factors.iter().any(|f| f.any(pred)),
            Observable::Hamiltonian { terms } => terms.iter().any(|(_, t)| t.any(pred)),
            _ => false,
        }
    }

    /// Hermitian and Projector have no adjoint support anywhere in the tree
    pub fn supports_adjoint(&self) -> bool {
        !self.any(&|o| {
            matches!(
                o,
                Observable::Hermitian { .. } | Observable::Projector { .. }
            )
        })
    }

    /// Pauli-word factors `(operator, wire)` if this is a product of Paulis
    pub fn pauli_word(&self) -> Option<Vec<(NamedObservable, usize)>> {
        match self {
            Observable::Named { kind, wire } if kind.is_pauli() => Some(vec![(*kind, *wire)]),
            Observable::Tensor(factors) => {
                let mut word = Vec::with_capacity(factors.len());
                for f in factors {
                    word.extend(f.pauli_word()?);
                }
                Some(word)
            }
            _ => None,
        }
    }

    /// Weighted terms this observable expands to for row-wise evaluation
    ///
    /// A Hamiltonian yields its own terms; every other observable is a single
    /// term of weight one.
    pub fn terms(&self) -> Vec<(f64, &Observable)> {
        match self {
            Observable::Hamiltonian { terms } => terms.iter().map(|(c, t)| (*c, t)).collect(),
            other => vec![(1.0, other)],
        }
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::Named { kind, wire } => write!(f, "{}(w{})", kind.name(), wire),
            Observable::Tensor(factors) => {
                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, " @ ")?;
                    }
                    write!(f, "{}", factor)?;
                }
                Ok(())
            }
            Observable::Hamiltonian { terms } => {
                for (i, (c, t)) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}*{}", c, t)?;
                }
                Ok(())
            }
            other => write!(f, "{}{:?}", other.name(), other.wires()),
        }
    }
}

/// Flattened weighted terms of an observable list plus per-observable row ranges
///
/// `offsets[i]..offsets[i + 1]` are the rows of `terms` that belong to
/// observable `i`.
#[derive(Debug, Clone)]
pub struct FlatTerms<'a> {
    pub terms: Vec<(f64, &'a Observable)>,
    pub offsets: Vec<usize>,
}

impl<'a> FlatTerms<'a> {
    /// Expand every observable into its weighted terms
    pub fn new<I>(observables: I) -> Self
    where
        I: IntoIterator<Item = &'a Observable>,
    {
        let mut terms = Vec::new();
        let mut offsets = vec![0];
        for obs in observables {
            terms.extend(obs.terms());
            offsets.push(terms.len());
        }
        Self { terms, offsets }
    }

    /// Number of logical observables
    pub fn num_observables(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Sum weighted term rows back into one row per observable
    pub fn aggregate(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let width = rows.first().map_or(0, Vec::len);
        self.offsets
            .windows(2)
            .map(|span| {
                let mut acc = vec![0.0; width];
                for row in span[0]..span[1] {
                    let weight = self.terms[row].0;
                    for (a, v) in acc.iter_mut().zip(&rows[row]) {
                        *a += weight * v;
                    }
                }
                acc
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_flattens_and_checks_wires() {
        let inner =
            Observable::tensor(vec![Observable::pauli_x(0), Observable::pauli_y(1)]).unwrap();
        let outer = Observable::tensor(vec![inner, Observable::pauli_z(2)]).unwrap();
        match &outer {
            Observable::Tensor(f) => assert_eq!(f.len(), 3),
            _ => panic!("expected tensor"),
        }
        assert_eq!(outer.wires(), vec![0, 1, 2]);

        let clash = Observable::tensor(vec![Observable::pauli_x(0), Observable::pauli_z(0)]);
        assert!(matches!(clash, Err(QuantumError::DuplicateWire(0))));
    }

    #[test]
    fn test_adjoint_support_inspects_terms() {
        let herm = Observable::hermitian(DenseMatrix::identity(2), &[0]).unwrap();
        let ham = Observable::hamiltonian(vec![(0.5, Observable::pauli_z(0)), (1.0, herm)]);
        assert!(!ham.supports_adjoint());
        assert!(Observable::pauli_x(1).supports_adjoint());
    }

    #[test]
    fn test_pauli_word() {
        let obs = Observable::tensor(vec![Observable::pauli_x(0), Observable::pauli_z(3)]).unwrap();
        assert_eq!(
            obs.pauli_word(),
            Some(vec![(NamedObservable::PauliX, 0), (NamedObservable::PauliZ, 3)])
        );
        assert_eq!(Observable::named(NamedObservable::Hadamard, 0).pauli_word(), None);
    }

    #[test]
    fn test_flat_terms_offsets_and_aggregate() {
        let ham = Observable::hamiltonian(vec![
            (0.5, Observable::pauli_z(0)),
            (2.0, Observable::pauli_x(1)),
            (-1.0, Observable::pauli_y(0)),
        ]);
        let single = Observable::pauli_z(1);
        let flat = FlatTerms::new([&single, &ham]);
        assert_eq!(flat.offsets, vec![0, 1, 4]);
        assert_eq!(flat.num_observables(), 2);

        let rows = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0]];
        let agg = flat.aggregate(&rows);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0], vec![1.0, 0.0]);
        assert_eq!(agg[1], vec![1.5, 0.5 + 4.0 - 3.0]);
    }

    #[test]
    fn test_nested_hamiltonian_expands() {
        let inner = Observable::hamiltonian(vec![(2.0, Observable::pauli_z(0))]);
        let outer = Observable::hamiltonian(vec![(3.0, inner)]);
        assert_eq!(outer.terms().len(), 1);
        assert_eq!(outer.terms()[0].0, 6.0);
    }
}
