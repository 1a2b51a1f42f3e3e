//! Basis-state sampling with the alias method
//!
//! The table is built once in O(2^n) and every shot then costs O(1).

use crate::error::{Result, StateError};
use crate::kernels::probabilities;
use crate::precision::Precision;
use crate::state_vector::StateVector;
use rand::Rng;

/// Walker alias table over a discrete distribution
#[derive(Debug, Clone)]
pub struct AliasTable {
    /// Probability threshold for each index
    prob: Vec<f64>,
    /// Alias index for each index
    alias: Vec<usize>,
}

impl AliasTable {
    /// Build from probabilities that sum to ~1
    pub fn new(probabilities: &[f64]) -> Result<Self> {
        let n = probabilities.len();
        if n == 0 {
            return Err(StateError::EmptyDistribution);
        }

        let total: f64 = probabilities.iter().sum();
        if total <= 0.0 {
            return Err(StateError::EmptyDistribution);
        }

        let mut prob = vec![0.0; n];
        let mut alias = vec![0; n];
        let mut scaled: Vec<f64> = probabilities.iter().map(|&p| p * n as f64 / total).collect();

        let (mut small, mut large): (Vec<usize>, Vec<usize>) =
            (0..n).partition(|&i| scaled[i] < 1.0);

        while !small.is_empty() && !large.is_empty() {
            let (Some(s), Some(l)) = (small.pop(), large.pop()) else {
                break;
            };
            prob[s] = scaled[s];
            alias[s] = l;
            scaled[l] = (scaled[l] + scaled[s]) - 1.0;

            if scaled[l] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }

        // Leftovers are 1 up to rounding
        for i in small.into_iter().chain(large) {
            prob[i] = 1.0;
        }

        Ok(Self { prob, alias })
    }

    /// Draw one index
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let i = rng.gen_range(0..self.prob.len());
        if rng.gen::<f64>() < self.prob[i] {
            i
        } else {
            self.alias[i]
        }
    }
}

/// Draw `shots` basis-state indices from |amplitude|²
pub fn sample_indices<P, R>(state: &StateVector<P>, shots: usize, rng: &mut R) -> Result<Vec<usize>>
where
    P: Precision,
    R: Rng,
{
    let table = AliasTable::new(&probabilities(state))?;
    Ok((0..shots).map(|_| table.sample(rng)).collect())
}

/// Draw `shots` rows of one bit per wire; column `w` is the bit of wire `w`
pub fn generate_samples<P, R>(
    state: &StateVector<P>,
    shots: usize,
    rng: &mut R,
) -> Result<Vec<Vec<u8>>>
where
    P: Precision,
    R: Rng,
{
    let n = state.num_qubits();
    Ok(sample_indices(state, shots, rng)?
        .into_iter()
        .map(|index| (0..n).map(|w| ((index >> w) & 1) as u8).collect())
        .collect())
}

/// Empirical distribution over `wires` from sample rows
pub fn estimate_probabilities(samples: &[Vec<u8>], wires: &[usize]) -> Vec<f64> {
    let k = wires.len();
    let mut counts = vec![0usize; 1 << k];
    for row in samples {
        let local = wires
            .iter()
            .enumerate()
            .fold(0, |acc, (j, &w)| acc | ((row[w] as usize) << (k - 1 - j)));
        counts[local] += 1;
    }
    let shots = samples.len().max(1) as f64;
    counts.into_iter().map(|c| c as f64 / shots).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::apply_dense;
    use lumiq_core::{Complex64, DenseMatrix};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_alias_table_deterministic_outcome() {
        let table = AliasTable::new(&[0.0, 0.0, 1.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(table.sample(&mut rng), 2);
        }
    }

    #[test]
    fn test_alias_table_frequencies() {
        let probs = [0.1, 0.2, 0.3, 0.4];
        let table = AliasTable::new(&probs).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let shots = 100_000;
        let mut counts = [0usize; 4];
        for _ in 0..shots {
            counts[table.sample(&mut rng)] += 1;
        }
        for (count, p) in counts.iter().zip(probs) {
            let freq = *count as f64 / shots as f64;
            assert!((freq - p).abs() < 0.01, "freq {} vs p {}", freq, p);
        }
    }

    #[test]
    fn test_empty_distribution() {
        assert!(matches!(AliasTable::new(&[]), Err(StateError::EmptyDistribution)));
    }

    #[test]
    fn test_sample_rows_are_little_endian() {
        let mut state = StateVector::<f64>::new(3).unwrap();
        state.set_basis_state(&[1], &[2]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let rows = generate_samples(&state, 5, &mut rng).unwrap();
        assert_eq!(rows.len(), 5);
        for row in rows {
            assert_eq!(row, vec![0, 0, 1]);
        }
    }

    #[test]
    fn test_estimated_probabilities() {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let hadamard = DenseMatrix::from_row_major(vec![
            Complex64::new(h, 0.0),
            Complex64::new(h, 0.0),
            Complex64::new(h, 0.0),
            Complex64::new(-h, 0.0),
        ])
        .unwrap();
        let mut state = StateVector::<f64>::new(2).unwrap();
        apply_dense(&mut state, &hadamard, &[0]).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let rows = generate_samples(&state, 20_000, &mut rng).unwrap();
        let probs = estimate_probabilities(&rows, &[1, 0]);
        assert!((probs[0] - 0.5).abs() < 0.02);
        assert!((probs[1] - 0.5).abs() < 0.02);
        assert_eq!(probs[2], 0.0);
    }
}
