//! Square row-stochastic transition matrices.

use rand_distr::{Distribution, Exp1};

use crate::error::ChainError;

/// Absolute tolerance applied to row sums during validation.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// An `n x n` row-stochastic transition matrix, stored row-major.
///
/// Row `i` holds the probabilities of moving from state `i` to each state
/// `0..n`. Matrices built through [`from_rows`](Self::from_rows) or
/// [`random`](Self::random) are valid on construction; [`set`](Self::set)
/// writes without checking, and callers re-establish the invariant
/// themselves (see [`validate`](Self::validate)).
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    dimension: usize,
    probs: Vec<f64>,
}

impl TransitionMatrix {
    /// Builds a matrix from rows, rejecting anything that is not square and
    /// row-stochastic.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidDimension`] for an empty input and
    /// [`ChainError::InvalidMatrix`] for ragged rows, negative or non-finite
    /// entries, or rows that do not sum to 1 within [`ROW_SUM_TOLERANCE`].
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ChainError> {
        let dimension = rows.len();
        if dimension == 0 {
            return Err(ChainError::InvalidDimension { dimension });
        }
        let mut probs = Vec::with_capacity(dimension * dimension);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dimension {
                return Err(ChainError::InvalidMatrix {
                    reason: format!(
                        "row {i} has {} entries, expected {dimension} (matrix must be square)",
                        row.len()
                    ),
                });
            }
            probs.extend_from_slice(row);
        }
        let matrix = Self { dimension, probs };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Draws a random matrix whose rows are uniform on the probability simplex.
    ///
    /// Each row is a vector of unit-exponential draws divided by its sum,
    /// i.e. a sample from a flat Dirichlet distribution.
    pub fn random(dimension: usize, rng: &mut impl rand::Rng) -> Result<Self, ChainError> {
        if dimension == 0 {
            return Err(ChainError::InvalidDimension { dimension });
        }
        let mut probs = Vec::with_capacity(dimension * dimension);
        for _ in 0..dimension {
            probs.extend(simplex_draw(dimension, rng));
        }
        Ok(Self { dimension, probs })
    }

    /// Constructs a matrix from row-major probabilities without validation.
    pub(crate) fn from_flat(dimension: usize, probs: Vec<f64>) -> Self {
        debug_assert_eq!(probs.len(), dimension * dimension);
        Self { dimension, probs }
    }

    /// Returns the number of states.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the transition probabilities out of state `from`.
    ///
    /// # Panics
    ///
    /// Panics if `from >= dimension`.
    pub fn row(&self, from: usize) -> &[f64] {
        let start = from * self.dimension;
        &self.probs[start..start + self.dimension]
    }

    /// Returns the probability of moving from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn prob(&self, from: usize, to: usize) -> f64 {
        self.row(from)[to]
    }

    /// Overwrites a single entry without re-validating the matrix.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn set(&mut self, from: usize, to: usize, p: f64) {
        assert!(
            from < self.dimension && to < self.dimension,
            "index ({from}, {to}) out of range for dimension {}",
            self.dimension
        );
        self.probs[from * self.dimension + to] = p;
    }

    /// Iterates over the rows in state order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.probs.chunks_exact(self.dimension)
    }

    /// Copies the matrix into nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Validates that the matrix is row-stochastic.
    ///
    /// Checks that all values are finite, in `[0, 1]`, and that each row
    /// sums to 1.0 within [`ROW_SUM_TOLERANCE`].
    pub fn validate(&self) -> Result<(), ChainError> {
        for (i, row) in self.rows().enumerate() {
            let mut sum = 0.0;
            for (j, &p) in row.iter().enumerate() {
                if !p.is_finite() {
                    return Err(ChainError::InvalidMatrix {
                        reason: format!("probs[{i}][{j}] is not finite: {p}"),
                    });
                }
                if !(0.0..=1.0).contains(&p) {
                    return Err(ChainError::InvalidMatrix {
                        reason: format!("probs[{i}][{j}] = {p} is outside [0, 1]"),
                    });
                }
                sum += p;
            }
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ChainError::InvalidMatrix {
                    reason: format!("row {i} sums to {sum}, expected ~1.0"),
                });
            }
        }
        Ok(())
    }

    /// Samples the state following `from`.
    ///
    /// # Panics
    ///
    /// Panics if `from >= dimension`.
    pub fn sample(&self, from: usize, rng: &mut impl rand::Rng) -> usize {
        sample_index(self.row(from), rng.random())
    }
}

/// Draws a point uniformly from the probability simplex of the given size.
pub(crate) fn simplex_draw(n: usize, rng: &mut impl rand::Rng) -> Vec<f64> {
    let mut draws: Vec<f64> = (0..n).map(|_| Exp1.sample(rng)).collect();
    let sum: f64 = draws.iter().sum();
    if sum > 0.0 {
        for d in &mut draws {
            *d /= sum;
        }
    } else {
        // All draws underflowed to zero; fall back to the uniform vector.
        draws.fill(1.0 / n as f64);
    }
    draws
}

/// Maps a uniform draw `u` in `[0, 1)` onto an index of `probs` by walking
/// the cumulative distribution.
///
/// The comparison is strict so zero-probability entries are never chosen,
/// even for `u == 0.0`. If rounding leaves `u` above the final cumulative
/// sum, the last entry with positive probability is returned.
pub(crate) fn sample_index(probs: &[f64], u: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return i;
        }
    }
    probs
        .iter()
        .rposition(|&p| p > 0.0)
        .unwrap_or(probs.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_matrix() -> TransitionMatrix {
        TransitionMatrix::from_rows(&[[0.5, 0.3, 0.2], [0.1, 0.7, 0.2], [0.2, 0.3, 0.5]]).unwrap()
    }

    #[test]
    fn row_and_prob_access() {
        let tm = sample_matrix();
        assert_eq!(tm.dimension(), 3);
        assert_eq!(tm.row(0), &[0.5, 0.3, 0.2]);
        assert_eq!(tm.row(2), &[0.2, 0.3, 0.5]);
        assert_abs_diff_eq!(tm.prob(1, 2), 0.2);
        assert_eq!(tm.to_rows()[1], vec![0.1, 0.7, 0.2]);
    }

    #[test]
    fn from_rows_rejects_empty() {
        let rows: Vec<Vec<f64>> = Vec::new();
        assert_eq!(
            TransitionMatrix::from_rows(&rows),
            Err(ChainError::InvalidDimension { dimension: 0 })
        );
    }

    #[test]
    fn from_rows_rejects_non_square() {
        let result = TransitionMatrix::from_rows(&[vec![0.5, 0.5], vec![0.2, 0.3, 0.5]]);
        assert!(matches!(result, Err(ChainError::InvalidMatrix { .. })));
    }

    #[test]
    fn from_rows_rejects_bad_sum() {
        let result = TransitionMatrix::from_rows(&[
            [0.5, 0.3, 0.3], // sums to 1.1
            [0.1, 0.7, 0.2],
            [0.2, 0.3, 0.5],
        ]);
        assert!(matches!(result, Err(ChainError::InvalidMatrix { .. })));
    }

    #[test]
    fn from_rows_rejects_negative_entry() {
        let result = TransitionMatrix::from_rows(&[[1.2, -0.2], [0.5, 0.5]]);
        assert!(matches!(result, Err(ChainError::InvalidMatrix { .. })));
    }

    #[test]
    fn from_rows_rejects_nan() {
        let result = TransitionMatrix::from_rows(&[[f64::NAN, 1.0], [0.5, 0.5]]);
        assert!(matches!(result, Err(ChainError::InvalidMatrix { .. })));
    }

    #[test]
    fn from_rows_accepts_within_tolerance() {
        assert!(TransitionMatrix::from_rows(&[[0.3333333, 0.6666667], [1.0, 0.0]]).is_ok());
    }

    #[test]
    fn set_bypasses_validation() {
        let mut tm = sample_matrix();
        tm.set(0, 0, 0.9);
        assert_abs_diff_eq!(tm.prob(0, 0), 0.9);
        assert!(tm.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn set_out_of_range_panics() {
        let mut tm = sample_matrix();
        tm.set(3, 0, 0.1);
    }

    #[test]
    fn random_is_row_stochastic() {
        let mut rng = StdRng::seed_from_u64(7);
        for dimension in 1..=8 {
            let tm = TransitionMatrix::random(dimension, &mut rng).unwrap();
            assert!(tm.validate().is_ok(), "dimension {dimension}");
            for row in tm.rows() {
                assert!(row.iter().all(|&p| p >= 0.0));
                assert_abs_diff_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn random_rejects_zero_dimension() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            TransitionMatrix::random(0, &mut rng),
            Err(ChainError::InvalidDimension { dimension: 0 })
        );
    }

    #[test]
    fn random_is_reproducible() {
        let a = TransitionMatrix::random(4, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = TransitionMatrix::random(4, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sample_index_walks_cdf() {
        let probs = [0.2, 0.5, 0.3];
        assert_eq!(sample_index(&probs, 0.0), 0);
        assert_eq!(sample_index(&probs, 0.19), 0);
        assert_eq!(sample_index(&probs, 0.2), 1);
        assert_eq!(sample_index(&probs, 0.69), 1);
        assert_eq!(sample_index(&probs, 0.7), 2);
        assert_eq!(sample_index(&probs, 0.999), 2);
    }

    #[test]
    fn sample_index_skips_zero_probability() {
        assert_eq!(sample_index(&[0.0, 1.0], 0.0), 1);
        assert_eq!(sample_index(&[0.0, 0.5, 0.0, 0.5], 0.5), 3);
    }

    #[test]
    fn sample_index_rounding_fallback() {
        // Sum slightly below 1; a draw above it lands on the last positive entry.
        assert_eq!(sample_index(&[0.4999999, 0.4999999, 0.0], 0.9999999), 1);
    }

    #[test]
    fn sample_distribution() {
        let tm = TransitionMatrix::from_rows(&[[0.5, 0.3, 0.2], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 10_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[tm.sample(0, &mut rng)] += 1;
        }
        let freq: Vec<f64> = counts.iter().map(|&c| c as f64 / n as f64).collect();
        assert_abs_diff_eq!(freq[0], 0.5, epsilon = 0.03);
        assert_abs_diff_eq!(freq[1], 0.3, epsilon = 0.03);
        assert_abs_diff_eq!(freq[2], 0.2, epsilon = 0.03);
    }

    #[test]
    fn identity_is_absorbing() {
        let tm = TransitionMatrix::from_rows(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(tm.sample(1, &mut rng), 1);
        }
    }
}
