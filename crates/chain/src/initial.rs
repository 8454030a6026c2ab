//! Policies for choosing the first state of a trajectory.

use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::matrix::{ROW_SUM_TOLERANCE, sample_index};

/// How a trajectory picks its first state.
///
/// Serialized untagged: `null` is [`Uniform`](Self::Uniform), an integer is
/// [`Fixed`](Self::Fixed) and an array is [`Distribution`](Self::Distribution).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialState {
    /// Every state is equally likely.
    #[default]
    Uniform,
    /// Always start in the given state.
    Fixed(usize),
    /// Sample the first state from a probability vector.
    Distribution(Vec<f64>),
}

impl InitialState {
    /// Validates this policy against a chain of `dimension` states.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidState`] for an out-of-range fixed state,
    /// and [`ChainError::DimensionMismatch`] or
    /// [`ChainError::InvalidDistribution`] for a malformed vector. Vectors
    /// are never renormalized.
    pub fn validate(&self, dimension: usize) -> Result<(), ChainError> {
        match self {
            Self::Uniform => Ok(()),
            Self::Fixed(state) => {
                if *state < dimension {
                    Ok(())
                } else {
                    Err(ChainError::InvalidState {
                        state: *state,
                        dimension,
                    })
                }
            }
            Self::Distribution(probs) => {
                if probs.len() != dimension {
                    return Err(ChainError::DimensionMismatch {
                        expected: dimension,
                        got: probs.len(),
                    });
                }
                if let Some((i, p)) = probs
                    .iter()
                    .enumerate()
                    .find(|(_, p)| !p.is_finite() || **p < 0.0)
                {
                    return Err(ChainError::InvalidDistribution {
                        reason: format!("probs[{i}] = {p} must be finite and non-negative"),
                    });
                }
                let sum: f64 = probs.iter().sum();
                if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                    return Err(ChainError::InvalidDistribution {
                        reason: format!("probabilities sum to {sum}, expected ~1.0"),
                    });
                }
                Ok(())
            }
        }
    }

    /// Draws a first state for a chain of `dimension` states.
    ///
    /// Assumes the policy has been validated for `dimension`.
    pub fn sample(&self, dimension: usize, rng: &mut impl rand::Rng) -> usize {
        match self {
            Self::Uniform => rng.random_range(0..dimension),
            Self::Fixed(state) => *state,
            Self::Distribution(probs) => sample_index(probs, rng.random()),
        }
    }
}
