//! Simulator facade: forward replay, measurements and the adjoint Jacobian

use crate::adjoint::{self, Jacobian};
use crate::backend::{Backend, LocalDevice};
use crate::batch::ObservableBatchScheduler;
use crate::capabilities::{Capabilities, DevicePool};
use crate::config::SimulatorConfig;
use crate::error::{Result, SimulatorError};
use crate::evaluator::ObservableEvaluator;
use lumiq_core::{
    Complex64, FlatTerms, Measurement, Observable, ReturnType, StatePrep, Tape,
};
use lumiq_gates::eigen_basis;
use lumiq_state::{sampling, Precision, StateError, StateVector, NORM_TOLERANCE};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use tracing::{debug, warn};

/// Non-fatal loss of accuracy, reported alongside the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecisionWarning {
    /// Adjoint gradients requested while the simulator samples finite shots;
    /// the Jacobian is analytic but the values it differentiates are not
    FiniteShotAdjoint,
    /// Variance computed as ⟨O²⟩ − ⟨O⟩²
    VarianceSubtraction,
}

impl fmt::Display for PrecisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecisionWarning::FiniteShotAdjoint => write!(
                f,
                "requested adjoint differentiation to be computed with finite shots; \
                 the derivative is always exact"
            ),
            PrecisionWarning::VarianceSubtraction => write!(
                f,
                "variance computed as <O^2> - <O>^2 may lose precision near eigenstates"
            ),
        }
    }
}

/// Value of one tape measurement
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementResult {
    /// Expectation value or variance
    Scalar(f64),
    /// Eigenvalue per shot
    Samples(Vec<f64>),
    /// Probabilities, first listed wire most significant
    Probabilities(Vec<f64>),
    /// Full amplitude vector, wire `w` as bit `w` of the index
    State(Vec<Complex64>),
}

/// State-vector simulator with adjoint differentiation
///
/// The authoritative state lives on the pool's primary device behind a
/// mutex; every public method validates its input before touching it.
///
/// # Example
///
/// ```
/// use lumiq_core::{Measurement, NamedGate, Observable, Operation, Tape};
/// use lumiq_sim::{Simulator, SimulatorConfig};
///
/// let sim = Simulator::<f64>::new(1, SimulatorConfig::default()).unwrap();
/// let tape = Tape::new(
///     vec![Operation::new(NamedGate::RX, &[0], &[0.3], false).unwrap().into()],
///     vec![Measurement::Expectation(Observable::pauli_z(0))],
/// )
/// .unwrap();
///
/// let jac = sim.evaluate(&tape, None, false).unwrap();
/// assert!((jac.get(0, 0) + 0.3f64.sin()).abs() < 1e-10);
/// ```
pub struct Simulator<P: Precision, B = LocalDevice> {
    config: SimulatorConfig,
    pool: DevicePool<B>,
    num_wires: usize,
    state: Mutex<StateVector<P>>,
    rng: Mutex<StdRng>,
    warnings: Mutex<Vec<PrecisionWarning>>,
}

impl<P: Precision> Simulator<P, LocalDevice> {
    /// Simulator on the CPU devices of this host
    pub fn new(num_wires: usize, config: SimulatorConfig) -> Result<Self> {
        let pool = DevicePool::from_capabilities(&Capabilities::detect(), &config)?;
        Self::with_pool(num_wires, config, pool)
    }
}

impl<P: Precision, B: Backend<P>> Simulator<P, B> {
    /// Simulator on an explicit device pool
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration does not validate
    /// - `UnsupportedPrecision` if `config.precision` differs from `P`
    pub fn with_pool(
        num_wires: usize,
        config: SimulatorConfig,
        pool: DevicePool<B>,
    ) -> Result<Self> {
        config.validate()?;
        if config.precision != P::KIND {
            return Err(SimulatorError::UnsupportedPrecision(format!(
                "{} requested for a {} simulator",
                config.precision,
                P::KIND
            )));
        }
        let state = pool.primary().allocate(num_wires)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let precision = P::KIND;
        debug!(
            num_wires,
            devices = pool.len(),
            precision = %precision,
            batch_obs = %config.batch_obs,
            "simulator created"
        );
        Ok(Self {
            config,
            pool,
            num_wires,
            state: Mutex::new(state),
            rng: Mutex::new(rng),
            warnings: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn num_wires(&self) -> usize {
        self.num_wires
    }

    pub fn devices(&self) -> &DevicePool<B> {
        &self.pool
    }

    fn primary(&self) -> &B {
        self.pool.primary()
    }

    fn evaluator(&self) -> ObservableEvaluator<'_, P, B> {
        ObservableEvaluator::new(self.primary(), self.config.dense_hamiltonian_max_wires())
    }

    fn warn(&self, warning: PrecisionWarning) {
        warn!("{}", warning);
        self.warnings.lock().push(warning);
    }

    /// Drain the precision warnings recorded so far
    pub fn take_warnings(&self) -> Vec<PrecisionWarning> {
        std::mem::take(&mut *self.warnings.lock())
    }

    /// Return the state to |0...0⟩
    pub fn reset(&self) {
        self.state.lock().reset();
    }

    /// Host mirror of the current state
    pub fn state(&self) -> Result<StateVector<P>> {
        self.primary().download(&self.state.lock())
    }

    /// Overwrite the device state with host amplitudes
    pub fn sync_host_to_device(&self, host: &[Complex64]) -> Result<()> {
        self.primary().upload(host, &mut self.state.lock())
    }

    /// Apply a tape's state preparation and operations to the current state
    ///
    /// Measurements are ignored.
    pub fn apply(&self, tape: &Tape) -> Result<()> {
        self.check_circuit(tape)?;
        let mut state = self.state.lock();
        self.replay(tape, &mut state)
    }

    /// Reset, run the tape and evaluate every measurement in order
    pub fn execute(&self, tape: &Tape) -> Result<Vec<MeasurementResult>> {
        self.check_circuit(tape)?;
        for m in tape.measurements() {
            self.check_measurement(m)?;
        }

        let mut state = self.state.lock();
        state.reset();
        self.replay(tape, &mut state)?;

        tape.measurements()
            .iter()
            .map(|m| match m {
                Measurement::Expectation(obs) => {
                    self.expectation_on(obs, &state).map(MeasurementResult::Scalar)
                }
                Measurement::Variance(obs) => {
                    self.variance_on(obs, &state).map(MeasurementResult::Scalar)
                }
                Measurement::Sample(obs) => self
                    .samples_on(obs, self.config.shots.unwrap_or(0), &state)
                    .map(MeasurementResult::Samples),
                Measurement::Probability(wires) => {
                    self.probability_on(wires, &state).map(MeasurementResult::Probabilities)
                }
                Measurement::State => Ok(MeasurementResult::State(state.to_complex64())),
            })
            .collect()
    }

    /// ⟨O⟩ on the current state, estimated from samples when shots are set
    pub fn expectation(&self, obs: &Observable) -> Result<f64> {
        self.check_observable(obs, ReturnType::Expectation)?;
        self.expectation_on(obs, &self.state.lock())
    }

    /// Var(O) on the current state, estimated from samples when shots are set
    pub fn variance(&self, obs: &Observable) -> Result<f64> {
        self.check_observable(obs, ReturnType::Variance)?;
        self.variance_on(obs, &self.state.lock())
    }

    /// `shots` eigenvalue samples of a product of named observables
    ///
    /// Works on analytic devices too; the configured shot count only governs
    /// sample measurements on a tape.
    pub fn samples(&self, obs: &Observable, shots: usize) -> Result<Vec<f64>> {
        self.check_observable(obs, ReturnType::Sample)?;
        self.samples_on(obs, shots, &self.state.lock())
    }

    /// `shots` rows of one bit per wire; column `w` is wire `w`
    pub fn generate_samples(&self, shots: usize) -> Result<Vec<Vec<u8>>> {
        let state = self.state.lock();
        self.primary().generate_samples(&state, shots, &mut self.rng.lock())
    }

    /// Probabilities over `wires` (all wires if empty), first wire most
    /// significant
    pub fn probability(&self, wires: &[usize]) -> Result<Vec<f64>> {
        self.check_wires(wires)?;
        self.probability_on(wires, &self.state.lock())
    }

    /// Adjoint Jacobian of the tape's expectation values
    ///
    /// With `starting_state` the given amplitudes are taken as the final state
    /// and no operation is replayed; with `reuse_current_state` the current
    /// device state is. Otherwise the state is reset and the tape replayed.
    /// Rows follow the tape's measurements and columns the trainable gate
    /// parameters in increasing order.
    pub fn evaluate(
        &self,
        tape: &Tape,
        starting_state: Option<&[Complex64]>,
        reuse_current_state: bool,
    ) -> Result<Jacobian> {
        self.check_circuit(tape)?;
        adjoint::check_measurements(tape)?;
        if let Some(amplitudes) = starting_state {
            let expected = 1usize << self.num_wires;
            if amplitudes.len() != expected {
                return Err(StateError::DimensionMismatch {
                    expected,
                    actual: amplitudes.len(),
                }
                .into());
            }
        }
        if self.config.shots.is_some() {
            self.warn(PrecisionWarning::FiniteShotAdjoint);
        }

        let trainable = tape.gate_trainable_params();
        let flat = FlatTerms::new(tape.observables());
        if trainable.is_empty() || flat.num_observables() == 0 {
            return Ok(Jacobian::zeros(flat.num_observables(), trainable.len()));
        }
        adjoint::check_operations(tape)?;
        let ops = tape.lowered()?;

        let mut state = self.state.lock();
        match (starting_state, reuse_current_state) {
            (Some(amplitudes), _) => self.primary().upload(amplitudes, &mut state)?,
            (None, true) => {}
            (None, false) => {
                state.reset();
                self.replay(tape, &mut state)?;
            }
        }

        let terms: Vec<&Observable> = flat.terms.iter().map(|(_, obs)| *obs).collect();
        debug!(
            observables = flat.num_observables(),
            terms = terms.len(),
            params = trainable.len(),
            "computing adjoint jacobian"
        );
        let scheduler = ObservableBatchScheduler::new(
            &self.pool,
            self.config.batch_obs,
            self.config.dense_hamiltonian_max_wires(),
        );
        let rows = scheduler.run(&state, &ops, &terms, &trainable)?;
        Ok(Jacobian::from_rows(&flat.aggregate(&rows), trainable.len()))
    }

    /// Vector-Jacobian product `dyᵀ·J` in one adjoint sweep
    ///
    /// The observables are folded into a single Hamiltonian weighted by `dy`.
    pub fn vjp(&self, tape: &Tape, dy: &[f64]) -> Result<Vec<f64>> {
        self.check_circuit(tape)?;
        adjoint::check_measurements(tape)?;
        let num_cols = tape.gate_trainable_params().len();
        let observables: Vec<&Observable> = tape.observables().collect();
        if observables.is_empty() || dy.iter().all(|&v| v == 0.0) {
            return Ok(vec![0.0; num_cols]);
        }
        if dy.len() != observables.len() {
            return Err(StateError::DimensionMismatch {
                expected: observables.len(),
                actual: dy.len(),
            }
            .into());
        }

        let folded = Observable::hamiltonian(
            dy.iter()
                .zip(observables)
                .filter(|(c, _)| **c != 0.0)
                .map(|(&c, obs)| (c, obs.clone()))
                .collect(),
        );
        let jac = self.evaluate(
            &tape.with_measurements(vec![Measurement::Expectation(folded)]),
            None,
            false,
        )?;
        Ok(jac.row(0).to_vec())
    }

    fn check_wires(&self, wires: &[usize]) -> Result<()> {
        match wires.iter().find(|&&w| w >= self.num_wires) {
            Some(&w) => Err(lumiq_core::QuantumError::InvalidWire(w, self.num_wires).into()),
            None => Ok(()),
        }
    }

    /// Wires and state preparation, before anything is mutated
    fn check_circuit(&self, tape: &Tape) -> Result<()> {
        tape.validate_wires(self.num_wires)?;
        if let Some(StatePrep::StateVector { amplitudes, .. }) = tape.state_prep() {
            let norm_sqr: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
            if (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
                return Err(StateError::NotNormalized {
                    norm: norm_sqr.sqrt(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_measurement(&self, m: &Measurement) -> Result<()> {
        match m {
            Measurement::Probability(wires) => self.check_wires(wires),
            Measurement::State => Ok(()),
            Measurement::Sample(_) if self.config.shots.is_none() => {
                Err(SimulatorError::UnsupportedMeasurement(
                    "sample measurements need a finite shot count".to_string(),
                ))
            }
            other => match other.observable() {
                Some(obs) => self.check_observable(obs, other.return_type()),
                None => Ok(()),
            },
        }
    }

    fn check_observable(&self, obs: &Observable, kind: ReturnType) -> Result<()> {
        obs.validate_wires(self.num_wires)?;
        let sampled = kind == ReturnType::Sample || self.config.shots.is_some();
        if sampled && eigen_basis(obs)?.is_none() {
            return Err(SimulatorError::unsupported_observable(
                obs.name(),
                "for finite-shot sampling",
            ));
        }
        Ok(())
    }

    fn replay(&self, tape: &Tape, state: &mut StateVector<P>) -> Result<()> {
        match tape.state_prep() {
            Some(StatePrep::BasisState { bits, wires }) => state.set_basis_state(bits, wires)?,
            Some(StatePrep::StateVector { amplitudes, wires }) => {
                state.set_state_vector(amplitudes, wires)?
            }
            None => {}
        }
        let device = self.primary();
        for op in tape.operations() {
            device.apply(state, op)?;
        }
        Ok(())
    }

    fn expectation_on(&self, obs: &Observable, state: &StateVector<P>) -> Result<f64> {
        match self.config.shots {
            Some(shots) => {
                let samples = self.samples_on(obs, shots, state)?;
                Ok(mean(&samples))
            }
            None => self.evaluator().expectation(obs, state),
        }
    }

    fn variance_on(&self, obs: &Observable, state: &StateVector<P>) -> Result<f64> {
        match self.config.shots {
            Some(shots) => {
                let samples = self.samples_on(obs, shots, state)?;
                let mu = mean(&samples);
                Ok(mean(&samples.iter().map(|s| (s - mu) * (s - mu)).collect::<Vec<_>>()))
            }
            None => {
                self.warn(PrecisionWarning::VarianceSubtraction);
                self.evaluator().variance(obs, state)
            }
        }
    }

    /// Rotate a copy into the eigenbasis, sample bits, map to eigenvalues
    fn samples_on(
        &self,
        obs: &Observable,
        shots: usize,
        state: &StateVector<P>,
    ) -> Result<Vec<f64>> {
        let basis = eigen_basis(obs)?.ok_or_else(|| {
            SimulatorError::unsupported_observable(obs.name(), "for finite-shot sampling")
        })?;
        let device = self.primary();
        let mut rotated = device.allocate(state.num_qubits())?;
        rotated.copy_from(state)?;
        for op in &basis.rotations {
            device.apply(&mut rotated, op)?;
        }
        let rows = device.generate_samples(&rotated, shots, &mut self.rng.lock())?;
        Ok(rows.iter().map(|bits| basis.eigenvalue(bits)).collect())
    }

    fn probability_on(&self, wires: &[usize], state: &StateVector<P>) -> Result<Vec<f64>> {
        let all: Vec<usize>;
        let wires = if wires.is_empty() {
            all = (0..self.num_wires).collect();
            &all
        } else {
            wires
        };
        match self.config.shots {
            Some(shots) => {
                let rows = self.primary().generate_samples(state, shots, &mut self.rng.lock())?;
                Ok(sampling::estimate_probabilities(&rows, wires))
            }
            None => self.primary().probabilities(state, wires),
        }
    }
}

impl<P: Precision, B> fmt::Debug for Simulator<P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("num_wires", &self.num_wires)
            .field("precision", &P::KIND)
            .field("config", &self.config)
            .finish()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
