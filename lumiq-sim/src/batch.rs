//! Observable batching across devices
//!
//! A [`BatchPlan`] cuts the observable list into contiguous chunks, each bound
//! to one device, and groups them into windows. Chunks of a window run
//! concurrently; windows run one after another. Every chunk owns its bra, ket
//! and scratch buffers and only reads the shared final state.

use crate::adjoint::AdjointJacobian;
use crate::backend::Backend;
use crate::capabilities::DevicePool;
use crate::config::BatchObs;
use crate::error::{Result, SimulatorError};
use crate::evaluator::ObservableEvaluator;
use lumiq_core::{LoweredOp, Observable};
use lumiq_state::{Precision, StateVector};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::ops::Range;
use tracing::debug;

/// Contiguous range of observables assigned to one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub device: usize,
    pub range: Range<usize>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Deterministic split of `num_observables` over `num_devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    windows: Vec<Vec<Chunk>>,
}

impl BatchPlan {
    pub fn new(policy: BatchObs, num_observables: usize, num_devices: usize) -> Self {
        let num_devices = num_devices.max(1);
        if num_observables == 0 {
            return Self { windows: Vec::new() };
        }

        let windows = match policy {
            BatchObs::Unbatched => vec![vec![Chunk {
                device: 0,
                range: 0..num_observables,
            }]],
            BatchObs::Distributed => vec![split_even(0..num_observables, num_devices)],
            BatchObs::Capped(k) => {
                let per_window = k.get().saturating_mul(num_devices);
                (0..num_observables)
                    .step_by(per_window)
                    .map(|start| {
                        let end = (start + per_window).min(num_observables);
                        (start..end)
                            .step_by(k.get())
                            .enumerate()
                            .map(|(device, lo)| Chunk {
                                device,
                                range: lo..(lo + k.get()).min(end),
                            })
                            .collect()
                    })
                    .collect()
            }
        };
        Self { windows }
    }

    pub fn windows(&self) -> &[Vec<Chunk>] {
        &self.windows
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.windows.iter().flatten()
    }

    /// Largest number of observables any single chunk holds
    pub fn max_chunk_len(&self) -> usize {
        self.chunks().map(Chunk::len).max().unwrap_or(0)
    }
}

/// Split a range into at most `parts` non-empty pieces whose sizes differ by
/// at most one, larger pieces first
fn split_even(range: Range<usize>, parts: usize) -> Vec<Chunk> {
    let len = range.len();
    let base = len / parts;
    let extra = len % parts;
    let mut start = range.start;
    (0..parts)
        .filter_map(|device| {
            let size = base + usize::from(device < extra);
            let chunk = Chunk {
                device,
                range: start..start + size,
            };
            start += size;
            (size > 0).then_some(chunk)
        })
        .collect()
}

/// Drives adjoint sweeps for every chunk of a plan and reassembles the rows
#[derive(Debug)]
pub struct ObservableBatchScheduler<'a, P, B> {
    pool: &'a DevicePool<B>,
    policy: BatchObs,
    dense_max_wires: usize,
    _precision: PhantomData<P>,
}

impl<'a, P: Precision, B: Backend<P>> ObservableBatchScheduler<'a, P, B> {
    pub fn new(pool: &'a DevicePool<B>, policy: BatchObs, dense_max_wires: usize) -> Self {
        Self {
            pool,
            policy,
            dense_max_wires,
            _precision: PhantomData,
        }
    }

    pub fn plan(&self, num_observables: usize) -> BatchPlan {
        BatchPlan::new(self.policy, num_observables, self.pool.len())
    }

    /// Compare every chunk's replica budget with its device's memory
    ///
    /// # Errors
    /// Returns `ResourceExhausted` for the first chunk that does not fit.
    pub fn check_budget(&self, plan: &BatchPlan, num_qubits: usize) -> Result<()> {
        let bytes = StateVector::<P>::bytes_for(num_qubits);
        for chunk in plan.chunks() {
            let limit = self.device(chunk.device)?.memory_limit();
            if limit == 0 {
                continue;
            }
            let requested = AdjointJacobian::<P, B>::replicas(chunk.len()).saturating_mul(bytes);
            if requested > limit {
                return Err(SimulatorError::ResourceExhausted {
                    device: chunk.device,
                    requested,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Jacobian rows for `observables` in their original order
    ///
    /// The first failing chunk aborts the whole run.
    pub fn run(
        &self,
        final_state: &StateVector<P>,
        ops: &[LoweredOp],
        observables: &[&Observable],
        trainable: &[usize],
    ) -> Result<Vec<Vec<f64>>> {
        let plan = self.plan(observables.len());
        self.check_budget(&plan, final_state.num_qubits())?;

        let mut rows = Vec::with_capacity(observables.len());
        for (index, window) in plan.windows().iter().enumerate() {
            debug!(
                window = index,
                chunks = window.len(),
                policy = %self.policy,
                "dispatching adjoint window"
            );
            let blocks = window
                .par_iter()
                .map(|chunk| {
                    let device = self.device(chunk.device)?;
                    let evaluator = ObservableEvaluator::new(device, self.dense_max_wires);
                    let engine = AdjointJacobian::new(evaluator);
                    engine.compute(final_state, ops, &observables[chunk.range.clone()], trainable)
                })
                .collect::<Result<Vec<_>>>()?;
            rows.extend(blocks.into_iter().flatten());
        }
        Ok(rows)
    }

    fn device(&self, index: usize) -> Result<&'a B> {
        self.pool.get(index).ok_or_else(|| SimulatorError::Device {
            device: index,
            reason: format!("device pool holds only {} devices", self.pool.len()),
        })
    }
}
