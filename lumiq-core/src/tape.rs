//! Tapes: an operation list, measurements and the trainable parameter set
//!
//! Parameters are addressed by a global index that runs over the tape in
//! order. A leading state preparation owns exactly one (non-differentiable)
//! slot, index 0; every gate parameter follows it.

use crate::gate::{NamedGate, Operation, StatePrep};
use crate::observable::Observable;
use crate::{QuantumError, Result};
use std::collections::BTreeSet;

/// One entry of a tape as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum TapeOp {
    StatePrep(StatePrep),
    Gate(Operation),
}

impl From<Operation> for TapeOp {
    fn from(op: Operation) -> Self {
        TapeOp::Gate(op)
    }
}

impl From<StatePrep> for TapeOp {
    fn from(prep: StatePrep) -> Self {
        TapeOp::StatePrep(prep)
    }
}

/// Kind of value a measurement returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Expectation,
    Variance,
    Sample,
    Probability,
    State,
}

/// A terminal measurement
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Expectation(Observable),
    Variance(Observable),
    Sample(Observable),
    /// Basis-state probabilities over the listed wires (all wires if empty)
    Probability(Vec<usize>),
    State,
}

impl Measurement {
    pub fn return_type(&self) -> ReturnType {
        match self {
            Measurement::Expectation(_) => ReturnType::Expectation,
            Measurement::Variance(_) => ReturnType::Variance,
            Measurement::Sample(_) => ReturnType::Sample,
            Measurement::Probability(_) => ReturnType::Probability,
            Measurement::State => ReturnType::State,
        }
    }

    pub fn observable(&self) -> Option<&Observable> {
        match self {
            Measurement::Expectation(o) | Measurement::Variance(o) | Measurement::Sample(o) => {
                Some(o)
            }
            Measurement::Probability(_) | Measurement::State => None,
        }
    }
}

/// An operation after lowering, tagged with its gate-parameter index
///
/// `param` counts gate parameters only (a leading state preparation is not
/// included) and is set only for single-parameter operations.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredOp {
    pub op: Operation,
    pub param: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    state_prep: Option<StatePrep>,
    operations: Vec<Operation>,
    measurements: Vec<Measurement>,
    trainable_params: BTreeSet<usize>,
}

impl Tape {
    /// Build a tape; every parameter starts out trainable
    ///
    /// # Errors
    /// Returns `StatePrepNotFirst` if a state preparation follows any other
    /// entry.
    pub fn new(ops: Vec<TapeOp>, measurements: Vec<Measurement>) -> Result<Self> {
        let mut state_prep = None;
        let mut operations = Vec::with_capacity(ops.len());

        for (position, op) in ops.into_iter().enumerate() {
            match op {
                TapeOp::StatePrep(prep) if position == 0 => state_prep = Some(prep),
                TapeOp::StatePrep(prep) => {
                    return Err(QuantumError::StatePrepNotFirst {
                        name: prep.name().to_string(),
                        position,
                    });
                }
                TapeOp::Gate(op) => operations.push(op),
            }
        }

        let mut tape = Self {
            state_prep,
            operations,
            measurements,
            trainable_params: BTreeSet::new(),
        };
        tape.trainable_params = (0..tape.num_params()).collect();
        Ok(tape)
    }

    /// Restrict differentiation to the given global parameter indices
    pub fn with_trainable_params<I>(mut self, params: I) -> Result<Self>
    where
        I: IntoIterator<Item = usize>,
    {
        let num_params = self.num_params();
        let mut trainable = BTreeSet::new();
        for index in params {
            if index >= num_params {
                return Err(QuantumError::InvalidTrainableParam { index, num_params });
            }
            trainable.insert(index);
        }
        self.trainable_params = trainable;
        Ok(self)
    }

    /// Same operations and trainable set with different measurements
    pub fn with_measurements(&self, measurements: Vec<Measurement>) -> Self {
        Self {
            state_prep: self.state_prep.clone(),
            operations: self.operations.clone(),
            measurements,
            trainable_params: self.trainable_params.clone(),
        }
    }

    #[inline]
    pub fn state_prep(&self) -> Option<&StatePrep> {
        self.state_prep.as_ref()
    }

    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[inline]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    #[inline]
    pub fn trainable_params(&self) -> &BTreeSet<usize> {
        &self.trainable_params
    }

    /// Observables of all observable-carrying measurements, in order
    pub fn observables(&self) -> impl Iterator<Item = &Observable> {
        self.measurements.iter().filter_map(Measurement::observable)
    }

    /// Total number of global parameter slots
    pub fn num_params(&self) -> usize {
        let prep = usize::from(self.state_prep.is_some());
        prep + self.operations.iter().map(Operation::num_params).sum::<usize>()
    }

    /// Trainable indices translated into gate-parameter numbering
    ///
    /// The state-preparation slot is dropped and, if present, every other
    /// index is shifted down by one. The result is sorted.
    pub fn gate_trainable_params(&self) -> Vec<usize> {
        match self.state_prep {
            Some(_) => self
                .trainable_params
                .iter()
                .filter(|&&i| i != 0)
                .map(|&i| i - 1)
                .collect(),
            None => self.trainable_params.iter().copied().collect(),
        }
    }

    /// Largest wire index referenced anywhere on the tape
    pub fn max_wire(&self) -> Option<usize> {
        let ops = self.operations.iter().flat_map(|op| op.wires().iter().copied());
        let prep = self.state_prep.iter().flat_map(|p| p.wires().iter().copied());
        let meas = self.measurements.iter().flat_map(|m| match m {
            Measurement::Probability(wires) => wires.clone(),
            other => other.observable().map(Observable::wires).unwrap_or_default(),
        });
        ops.chain(prep).chain(meas).max()
    }

    /// Check every wire on the tape against the register size
    pub fn validate_wires(&self, num_wires: usize) -> Result<()> {
        match self.max_wire() {
            Some(w) if w >= num_wires => Err(QuantumError::InvalidWire(w, num_wires)),
            _ => Ok(()),
        }
    }

    /// Gate operations with composite rotations expanded
    ///
    /// `Rot(φ, θ, ω)` becomes `RZ(φ) RY(θ) RZ(ω)` carrying the original three
    /// parameter indices; its inverse is the reversed sequence of inverses.
    /// Other multi-parameter operations are passed through with no index.
    pub fn lowered(&self) -> Result<Vec<LoweredOp>> {
        let mut out = Vec::with_capacity(self.operations.len());
        let mut next_param = 0;

        for op in &self.operations {
            let n = op.num_params();
            match op.named_gate() {
                Some(NamedGate::Rot) => out.extend(lower_rot(op, next_param)?),
                _ if n == 1 => out.push(LoweredOp {
                    op: op.clone(),
                    param: Some(next_param),
                }),
                _ => out.push(LoweredOp {
                    op: op.clone(),
                    param: None,
                }),
            }
            next_param += n;
        }
        Ok(out)
    }
}

fn lower_rot(op: &Operation, first_param: usize) -> Result<Vec<LoweredOp>> {
    let wire = op.wires();
    let p = op.params();
    let inverse = op.inverse();
    let steps = [
        (NamedGate::RZ, p[0], first_param),
        (NamedGate::RY, p[1], first_param + 1),
        (NamedGate::RZ, p[2], first_param + 2),
    ];

    let build = |(gate, angle, index): (NamedGate, f64, usize)| -> Result<LoweredOp> {
        Ok(LoweredOp {
            op: Operation::new(gate, wire, &[angle], inverse)?,
            param: Some(index),
        })
    };

    if inverse {
        steps.into_iter().rev().map(build).collect()
    } else {
        steps.into_iter().map(build).collect()
    }
}
