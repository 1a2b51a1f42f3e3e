use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lumiq_core::{Measurement, NamedGate, Observable, Operation, Tape, TapeOp};
use lumiq_sim::{BatchObs, Simulator, SimulatorConfig};

// RX/RY layers with a CNOT ladder in between
fn layered_tape(num_qubits: usize, depth: usize, num_observables: usize) -> Tape {
    let mut ops: Vec<TapeOp> = Vec::with_capacity(num_qubits * depth * 3);
    let mut param = 0.0;
    for d in 0..depth {
        for q in 0..num_qubits {
            param += 0.1;
            let gate = if d % 2 == 0 { NamedGate::RX } else { NamedGate::RY };
            ops.push(Operation::new(gate, &[q], &[param], false).unwrap().into());
        }
        for q in 0..num_qubits - 1 {
            ops.push(Operation::new(NamedGate::CNOT, &[q, q + 1], &[], false).unwrap().into());
        }
    }

    let measurements = (0..num_observables)
        .map(|i| Measurement::Expectation(Observable::pauli_z(i % num_qubits)))
        .collect();
    Tape::new(ops, measurements).unwrap()
}

fn bench_adjoint_jacobian(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjoint_jacobian");

    for num_qubits in [4, 8, 12].iter() {
        let depth = 3;
        let tape = layered_tape(*num_qubits, depth, *num_qubits);
        let sim = Simulator::<f64>::new(*num_qubits, SimulatorConfig::default()).unwrap();

        group.bench_with_input(
            BenchmarkId::new("unbatched", format!("{}q_d{}", num_qubits, depth)),
            &tape,
            |b, tape| b.iter(|| black_box(sim.evaluate(black_box(tape), None, false).unwrap())),
        );
    }

    group.finish();
}

fn bench_batch_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_policies");
    let num_qubits = 10;
    let tape = layered_tape(num_qubits, 4, 16);

    let policies = [
        ("unbatched", BatchObs::Unbatched),
        ("distributed", BatchObs::Distributed),
        ("capped_2", BatchObs::from(2usize)),
    ];
    for (name, policy) in policies.iter() {
        let config = SimulatorConfig::default()
            .with_batch_obs(*policy)
            .with_num_devices(4);
        let sim = Simulator::<f64>::new(num_qubits, config).unwrap();

        group.bench_function(*name, |b| {
            b.iter(|| black_box(sim.evaluate(black_box(&tape), None, false).unwrap()))
        });
    }

    group.finish();
}

fn bench_single_vs_double(c: &mut Criterion) {
    let mut group = c.benchmark_group("precision");
    let num_qubits = 12;
    let tape = layered_tape(num_qubits, 3, 4);

    let double = Simulator::<f64>::new(num_qubits, SimulatorConfig::default()).unwrap();
    group.bench_function("f64", |b| {
        b.iter(|| black_box(double.evaluate(black_box(&tape), None, false).unwrap()))
    });

    let config = SimulatorConfig::default().with_precision(lumiq_state::PrecisionKind::Single);
    let single = Simulator::<f32>::new(num_qubits, config).unwrap();
    group.bench_function("f32", |b| {
        b.iter(|| black_box(single.evaluate(black_box(&tape), None, false).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_adjoint_jacobian,
    bench_batch_policies,
    bench_single_vs_double
);
criterion_main!(benches);
