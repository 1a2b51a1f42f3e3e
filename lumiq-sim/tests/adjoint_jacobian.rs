use approx::assert_abs_diff_eq;
use lumiq_core::{Measurement, NamedGate, Observable, Operation, StatePrep, Tape, TapeOp};
use lumiq_sim::{
    BatchObs, Jacobian, MeasurementResult, PrecisionWarning, Simulator, SimulatorConfig,
    SimulatorError,
};
use std::num::NonZeroUsize;

fn op(gate: NamedGate, wires: &[usize], params: &[f64]) -> TapeOp {
    Operation::new(gate, wires, params, false).unwrap().into()
}

fn op_inv(gate: NamedGate, wires: &[usize], params: &[f64]) -> TapeOp {
    Operation::new(gate, wires, params, true).unwrap().into()
}

/// Ten parameters over three wires, touching every generator family
fn layered_ops(p: &[f64]) -> Vec<TapeOp> {
    vec![
        op(NamedGate::RX, &[0], &[p[0]]),
        op(NamedGate::RY, &[1], &[p[1]]),
        op(NamedGate::CNOT, &[0, 1], &[]),
        op(NamedGate::IsingXX, &[1, 2], &[p[2]]),
        op_inv(NamedGate::CRY, &[2, 0], &[p[3]]),
        op(NamedGate::Rot, &[1], &[p[4], p[5], p[6]]),
        op(NamedGate::MultiRZ, &[0, 1, 2], &[p[7]]),
        op(NamedGate::SingleExcitation, &[0, 2], &[p[8]]),
        op(NamedGate::PhaseShift, &[2], &[p[9]]),
        op(NamedGate::Hadamard, &[2], &[]),
    ]
}

const PARAMS: [f64; 10] = [0.3, -0.4, 1.1, 0.25, 0.6, -1.2, 0.9, 0.45, -0.7, 1.3];

fn observables() -> Vec<Observable> {
    vec![
        Observable::pauli_z(0),
        Observable::tensor(vec![Observable::pauli_x(1), Observable::pauli_z(2)]).unwrap(),
        Observable::pauli_y(2),
        Observable::hamiltonian(vec![
            (
                0.3,
                Observable::tensor(vec![Observable::pauli_z(0), Observable::pauli_z(1)]).unwrap(),
            ),
            (-0.7, Observable::pauli_x(2)),
            (1.1, Observable::pauli_y(0)),
        ]),
        Observable::pauli_x(1),
    ]
}

fn expval_tape(params: &[f64]) -> Tape {
    Tape::new(
        layered_ops(params),
        observables().into_iter().map(Measurement::Expectation).collect(),
    )
    .unwrap()
}

fn scalars(results: Vec<MeasurementResult>) -> Vec<f64> {
    results
        .into_iter()
        .map(|r| match r {
            MeasurementResult::Scalar(v) => v,
            other => panic!("expected a scalar, got {:?}", other),
        })
        .collect()
}

fn central_difference(sim: &Simulator<f64>, params: &[f64], index: usize) -> Vec<f64> {
    let h = 1e-6;
    let mut plus = params.to_vec();
    let mut minus = params.to_vec();
    plus[index] += h;
    minus[index] -= h;
    let up = scalars(sim.execute(&expval_tape(&plus)).unwrap());
    let down = scalars(sim.execute(&expval_tape(&minus)).unwrap());
    up.iter().zip(&down).map(|(u, d)| (u - d) / (2.0 * h)).collect()
}

fn assert_jacobians_eq(a: &Jacobian, b: &Jacobian) {
    assert_eq!(a.num_rows(), b.num_rows());
    assert_eq!(a.num_cols(), b.num_cols());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-10);
    }
}

#[test]
fn test_reference_tape_matches_finite_differences() {
    let sim = Simulator::<f64>::new(2, SimulatorConfig::default()).unwrap();
    let build = |t0: f64, t1: f64| {
        Tape::new(
            vec![
                op(NamedGate::RX, &[0], &[t0]),
                op(NamedGate::RZ, &[0], &[t1]),
                op(NamedGate::CNOT, &[0, 1], &[]),
            ],
            vec![Measurement::Expectation(Observable::pauli_z(0))],
        )
        .unwrap()
    };

    let (t0, t1, h) = (0.3, 1.1, 1e-6);
    let jac = sim.evaluate(&build(t0, t1), None, false).unwrap();
    assert_eq!((jac.num_rows(), jac.num_cols()), (1, 2));

    let fd = |a: &Tape, b: &Tape| {
        let up = scalars(sim.execute(a).unwrap())[0];
        let down = scalars(sim.execute(b).unwrap())[0];
        (up - down) / (2.0 * h)
    };
    let d0 = fd(&build(t0 + h, t1), &build(t0 - h, t1));
    let d1 = fd(&build(t0, t1 + h), &build(t0, t1 - h));

    assert_abs_diff_eq!(jac.get(0, 0), d0, epsilon = 1e-5);
    assert_abs_diff_eq!(jac.get(0, 1), d1, epsilon = 1e-5);
    assert_abs_diff_eq!(jac.get(0, 0), -t0.sin(), epsilon = 1e-8);
}

#[test]
fn test_layered_tape_matches_finite_differences() {
    let sim = Simulator::<f64>::new(3, SimulatorConfig::default()).unwrap();
    let jac = sim.evaluate(&expval_tape(&PARAMS), None, false).unwrap();
    assert_eq!((jac.num_rows(), jac.num_cols()), (5, 10));

    for col in 0..PARAMS.len() {
        let fd = central_difference(&sim, &PARAMS, col);
        for (row, expected) in fd.iter().enumerate() {
            assert_abs_diff_eq!(jac.get(row, col), *expected, epsilon = 1e-5);
        }
    }
}

/// Four-wire tape over the excitation family
fn excitation_tape(p: &[f64]) -> Tape {
    let ops = vec![
        op(NamedGate::PauliX, &[0], &[]),
        op(NamedGate::Hadamard, &[1], &[]),
        op(NamedGate::Hadamard, &[2], &[]),
        op(NamedGate::DoubleExcitation, &[0, 1, 2, 3], &[p[0]]),
        op(NamedGate::SingleExcitationPlus, &[1, 2], &[p[1]]),
        op_inv(NamedGate::DoubleExcitationPlus, &[3, 2, 1, 0], &[p[2]]),
        op(NamedGate::SingleExcitationMinus, &[0, 3], &[p[3]]),
        op(NamedGate::OrbitalRotation, &[0, 1, 2, 3], &[p[4]]),
        op(NamedGate::DoubleExcitationMinus, &[1, 0, 3, 2], &[p[5]]),
        op(NamedGate::PSWAP, &[2, 0], &[p[6]]),
        op(NamedGate::Hadamard, &[3], &[]),
    ];
    let measurements = vec![
        Measurement::Expectation(Observable::pauli_z(0)),
        Measurement::Expectation(
            Observable::tensor(vec![Observable::pauli_x(1), Observable::pauli_y(2)]).unwrap(),
        ),
        Measurement::Expectation(Observable::pauli_x(3)),
    ];
    Tape::new(ops, measurements).unwrap()
}

#[test]
fn test_excitation_gates_match_finite_differences() {
    let params = [0.7, -0.35, 1.2, 0.55, -0.9, 0.3, 0.8];
    let sim = Simulator::<f64>::new(4, SimulatorConfig::default()).unwrap();
    let jac = sim.evaluate(&excitation_tape(&params), None, false).unwrap();
    assert_eq!((jac.num_rows(), jac.num_cols()), (3, 7));

    let h = 1e-6;
    for col in 0..params.len() {
        let mut plus = params;
        let mut minus = params;
        plus[col] += h;
        minus[col] -= h;
        let up = scalars(sim.execute(&excitation_tape(&plus)).unwrap());
        let down = scalars(sim.execute(&excitation_tape(&minus)).unwrap());
        for row in 0..up.len() {
            let expected = (up[row] - down[row]) / (2.0 * h);
            assert_abs_diff_eq!(jac.get(row, col), expected, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_batch_policies_agree() {
    let tape = expval_tape(&PARAMS);
    let one = NonZeroUsize::new(1).unwrap();

    let unbatched = Simulator::<f64>::new(3, SimulatorConfig::default())
        .unwrap()
        .evaluate(&tape, None, false)
        .unwrap();
    let distributed = Simulator::<f64>::new(
        3,
        SimulatorConfig::default()
            .with_batch_obs(BatchObs::Distributed)
            .with_num_devices(3),
    )
    .unwrap()
    .evaluate(&tape, None, false)
    .unwrap();
    let capped = Simulator::<f64>::new(
        3,
        SimulatorConfig::default()
            .with_batch_obs(BatchObs::Capped(one))
            .with_num_devices(2),
    )
    .unwrap()
    .evaluate(&tape, None, false)
    .unwrap();

    assert_jacobians_eq(&unbatched, &distributed);
    assert_jacobians_eq(&unbatched, &capped);
}

#[test]
fn test_hamiltonian_rows_are_weighted_sums() {
    let sim = Simulator::<f64>::new(3, SimulatorConfig::default()).unwrap();
    let zz = Observable::tensor(vec![Observable::pauli_z(0), Observable::pauli_z(1)]).unwrap();
    let terms = vec![(0.3, zz), (-0.7, Observable::pauli_x(2)), (1.1, Observable::pauli_y(0))];

    let ham_tape = Tape::new(
        layered_ops(&PARAMS),
        vec![Measurement::Expectation(Observable::hamiltonian(terms.clone()))],
    )
    .unwrap();
    let term_tape = Tape::new(
        layered_ops(&PARAMS),
        terms
            .iter()
            .map(|(_, obs)| Measurement::Expectation(obs.clone()))
            .collect(),
    )
    .unwrap();

    let ham = sim.evaluate(&ham_tape, None, false).unwrap();
    let parts = sim.evaluate(&term_tape, None, false).unwrap();
    assert_eq!(ham.num_rows(), 1);
    assert_eq!(parts.num_rows(), 3);

    for col in 0..ham.num_cols() {
        let expected: f64 = terms
            .iter()
            .enumerate()
            .map(|(row, (coeff, _))| coeff * parts.get(row, col))
            .sum();
        assert_abs_diff_eq!(ham.get(0, col), expected, epsilon = 1e-10);
    }
}

#[test]
fn test_state_prep_parameters_are_not_columns() {
    let sim = Simulator::<f64>::new(2, SimulatorConfig::default()).unwrap();
    let ops = || {
        vec![
            StatePrep::basis_state(&[1, 0], &[0, 1]).unwrap().into(),
            op(NamedGate::RX, &[0], &[0.5]),
            op(NamedGate::RY, &[1], &[-0.2]),
        ]
    };
    let measurements = || vec![Measurement::Expectation(Observable::pauli_z(0))];

    let all = Tape::new(ops(), measurements()).unwrap();
    assert_eq!(all.trainable_params().len(), 3);
    let jac = sim.evaluate(&all, None, false).unwrap();
    assert_eq!(jac.num_cols(), 2);
    // ⟨Z0⟩ = -cos θ starting from |1⟩
    assert_abs_diff_eq!(jac.get(0, 0), 0.5f64.sin(), epsilon = 1e-10);
    assert_abs_diff_eq!(jac.get(0, 1), 0.0, epsilon = 1e-10);

    let second_only = Tape::new(ops(), measurements())
        .unwrap()
        .with_trainable_params([0, 2])
        .unwrap();
    let jac = sim.evaluate(&second_only, None, false).unwrap();
    assert_eq!(jac.num_cols(), 1);
    assert_abs_diff_eq!(jac.get(0, 0), 0.0, epsilon = 1e-10);
}

#[test]
fn test_empty_trainable_set_is_all_zero() {
    let sim = Simulator::<f64>::new(3, SimulatorConfig::default()).unwrap();
    let tape = expval_tape(&PARAMS).with_trainable_params([]).unwrap();
    let jac = sim.evaluate(&tape, None, false).unwrap();
    assert_eq!((jac.num_rows(), jac.num_cols()), (5, 0));
}

#[test]
fn test_untrainable_gate_without_generator_is_accepted() {
    let sim = Simulator::<f64>::new(2, SimulatorConfig::default()).unwrap();
    let tape = Tape::new(
        vec![op(NamedGate::CRot, &[0, 1], &[0.1, 0.2, 0.3])],
        vec![Measurement::Expectation(Observable::pauli_z(1))],
    )
    .unwrap()
    .with_trainable_params([])
    .unwrap();
    let jac = sim.evaluate(&tape, None, false).unwrap();
    assert_eq!((jac.num_rows(), jac.num_cols()), (1, 0));
    assert_eq!(sim.vjp(&tape, &[1.0]).unwrap(), Vec::<f64>::new());
}

#[test]
fn test_starting_state_and_reused_state() {
    let sim = Simulator::<f64>::new(3, SimulatorConfig::default()).unwrap();
    let tape = expval_tape(&PARAMS);
    let fresh = sim.evaluate(&tape, None, false).unwrap();

    let final_state = sim.state().unwrap().to_complex64();
    sim.reset();
    let from_start = sim.evaluate(&tape, Some(final_state.as_slice()), false).unwrap();
    assert_jacobians_eq(&fresh, &from_start);

    sim.execute(&tape).unwrap();
    let reused = sim.evaluate(&tape, None, true).unwrap();
    assert_jacobians_eq(&fresh, &reused);

    let err = sim.evaluate(&tape, Some(&final_state[..4]), false).unwrap_err();
    assert!(matches!(err, SimulatorError::State(_)));
}

#[test]
fn test_unsupported_inputs_fail_before_the_sweep() {
    let sim = Simulator::<f64>::new(2, SimulatorConfig::default()).unwrap();
    let before = sim.state().unwrap().to_complex64();

    let hermitian = Observable::hermitian(lumiq_core::DenseMatrix::identity(2), &[0]).unwrap();
    let tape = Tape::new(
        vec![op(NamedGate::RX, &[0], &[0.1])],
        vec![Measurement::Expectation(hermitian)],
    )
    .unwrap();
    let err = sim.evaluate(&tape, None, false).unwrap_err();
    assert!(matches!(err, SimulatorError::UnsupportedObservable { .. }));

    let crot = Tape::new(
        vec![op(NamedGate::CRot, &[0, 1], &[0.1, 0.2, 0.3])],
        vec![Measurement::Expectation(Observable::pauli_z(1))],
    )
    .unwrap();
    let err = sim.evaluate(&crot, None, false).unwrap_err();
    assert!(matches!(err, SimulatorError::UnsupportedOperation { .. }));
    assert!(err.is_recoverable());

    assert_eq!(sim.state().unwrap().to_complex64(), before);
}

#[test]
fn test_finite_shots_warn_but_differentiate() {
    let sim = Simulator::<f64>::new(
        2,
        SimulatorConfig::default().with_shots(100).with_seed(11),
    )
    .unwrap();
    let tape = Tape::new(
        vec![op(NamedGate::RY, &[0], &[0.7])],
        vec![Measurement::Expectation(Observable::pauli_z(0))],
    )
    .unwrap();
    let jac = sim.evaluate(&tape, None, false).unwrap();
    assert_abs_diff_eq!(jac.get(0, 0), -0.7f64.sin(), epsilon = 1e-10);
    assert_eq!(sim.take_warnings(), vec![PrecisionWarning::FiniteShotAdjoint]);
}

#[test]
fn test_replica_budget_is_checked_before_dispatch() {
    // 2 qubits at double precision is 64 bytes per buffer
    let tape = Tape::new(
        vec![op(NamedGate::RX, &[0], &[0.2]), op(NamedGate::RY, &[1], &[0.4])],
        (0..4)
            .map(|i| Measurement::Expectation(Observable::pauli_z(i % 2)))
            .collect(),
    )
    .unwrap();

    let tight = SimulatorConfig::default().with_device_memory_limit(256);
    let sim = Simulator::<f64>::new(2, tight.clone()).unwrap();
    match sim.evaluate(&tape, None, false) {
        Err(SimulatorError::ResourceExhausted { requested, limit, .. }) => {
            assert_eq!(requested, 6 * 64);
            assert_eq!(limit, 256);
        }
        other => panic!("unexpected {:?}", other),
    }

    let capped = tight.with_batch_obs(1usize).with_num_devices(2);
    let sim = Simulator::<f64>::new(2, capped).unwrap();
    let jac = sim.evaluate(&tape, None, false).unwrap();
    assert_eq!(jac.num_rows(), 4);
    assert_abs_diff_eq!(jac.get(0, 0), -0.2f64.sin(), epsilon = 1e-10);
}

#[test]
fn test_single_precision_gradient() {
    let config = SimulatorConfig::default().with_precision(lumiq_state::PrecisionKind::Single);
    let sim = Simulator::<f32>::new(3, config).unwrap();
    let reference = Simulator::<f64>::new(3, SimulatorConfig::default()).unwrap();
    let tape = expval_tape(&PARAMS);

    let single = sim.evaluate(&tape, None, false).unwrap();
    let double = reference.evaluate(&tape, None, false).unwrap();
    for (x, y) in single.as_slice().iter().zip(double.as_slice()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-4);
    }
}
