//! Transition matrix estimation from an observed state sequence.

use crate::config::FitConfig;
use crate::description::ChainDescription;
use crate::error::ChainError;
use crate::initial::InitialState;
use crate::matrix::TransitionMatrix;

/// Estimates a transition matrix from consecutive observations.
///
/// Transitions `states[t-1] -> states[t]` are counted and smoothed with an
/// effective Dirichlet prior `alpha / sqrt(n)`, where `n` is the total number
/// of transitions. A row with no observed transitions and no smoothing
/// becomes a self-loop.
///
/// # Errors
///
/// Returns [`ChainError::InvalidDimension`] for `dimension == 0`,
/// [`ChainError::InsufficientData`] for fewer than two observations,
/// [`ChainError::InvalidState`] for observations outside `0..dimension`,
/// and [`ChainError::InvalidConfig`] for a bad config.
#[tracing::instrument(skip(states, config), fields(n = states.len()))]
pub fn estimate_transitions(
    states: &[usize],
    dimension: usize,
    config: &FitConfig,
) -> Result<TransitionMatrix, ChainError> {
    config.validate()?;
    if dimension == 0 {
        return Err(ChainError::InvalidDimension { dimension });
    }
    if states.len() < 2 {
        return Err(ChainError::InsufficientData {
            n: states.len(),
            min: 2,
        });
    }
    if let Some(&state) = states.iter().find(|&&s| s >= dimension) {
        return Err(ChainError::InvalidState { state, dimension });
    }

    let mut counts = vec![0.0_f64; dimension * dimension];
    for pair in states.windows(2) {
        counts[pair[0] * dimension + pair[1]] += 1.0;
    }

    let n = (states.len() - 1) as f64;
    let alpha_eff = config.dirichlet_alpha() / n.sqrt();

    let mut probs = vec![0.0_f64; dimension * dimension];
    for i in 0..dimension {
        let row = &counts[i * dimension..(i + 1) * dimension];
        let denom = row.iter().sum::<f64>() + dimension as f64 * alpha_eff;
        let out = &mut probs[i * dimension..(i + 1) * dimension];
        if denom > 0.0 {
            for (p, &c) in out.iter_mut().zip(row) {
                *p = (c + alpha_eff) / denom;
            }
        } else {
            out[i] = 1.0;
        }
    }

    Ok(TransitionMatrix::from_flat(dimension, probs))
}

impl ChainDescription {
    /// Builds a description whose matrix is estimated from `states`.
    ///
    /// See [`estimate_transitions`] for the estimator. The seed comes from
    /// `config`; the initial state is uniform unless
    /// [`FitConfig::with_initial_from_data`] is set.
    pub fn fit(
        states: &[usize],
        dimension: usize,
        config: &FitConfig,
    ) -> Result<Self, ChainError> {
        let matrix = estimate_transitions(states, dimension, config)?;
        let initial = if config.initial_from_data() {
            InitialState::Fixed(states[0])
        } else {
            InitialState::Uniform
        };
        Self::new(dimension)?
            .with_matrix(matrix)?
            .with_initial_state(initial)
            .map(|d| d.with_seed(config.seed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn known_sequence() {
        // Transitions: 0->0, 0->1, 1->1, 1->0, 0->1, 1->2, 2->0
        // Counts: row0 = [1, 2, 0], row1 = [1, 1, 1], row2 = [1, 0, 0]
        let states = [0, 0, 1, 1, 0, 1, 2, 0];
        let tm = estimate_transitions(&states, 3, &FitConfig::new()).unwrap();

        let alpha_eff = 1.0 / 7.0_f64.sqrt();
        let denom = 3.0 + 3.0 * alpha_eff;
        assert_abs_diff_eq!(tm.prob(0, 0), (1.0 + alpha_eff) / denom, epsilon = 1e-12);
        assert_abs_diff_eq!(tm.prob(0, 1), (2.0 + alpha_eff) / denom, epsilon = 1e-12);
        assert_abs_diff_eq!(tm.prob(0, 2), alpha_eff / denom, epsilon = 1e-12);
        assert!(tm.validate().is_ok());
    }

    #[test]
    fn unsmoothed_counts_are_frequencies() {
        let states = [0, 1, 0, 1, 1, 0];
        let config = FitConfig::new().with_dirichlet_alpha(0.0);
        let tm = estimate_transitions(&states, 2, &config).unwrap();
        // row0: 0->1 twice; row1: 1->0 twice, 1->1 once
        assert_abs_diff_eq!(tm.prob(0, 1), 1.0);
        assert_abs_diff_eq!(tm.prob(1, 0), 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tm.prob(1, 1), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn unobserved_row_without_smoothing_self_loops() {
        let states = [0, 0, 0];
        let config = FitConfig::new().with_dirichlet_alpha(0.0);
        let tm = estimate_transitions(&states, 3, &config).unwrap();
        assert_eq!(tm.row(1), &[0.0, 1.0, 0.0]);
        assert_eq!(tm.row(2), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn unobserved_row_with_smoothing_is_uniform() {
        let tm = estimate_transitions(&[0, 0, 0], 2, &FitConfig::new()).unwrap();
        assert_abs_diff_eq!(tm.prob(1, 0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(tm.prob(1, 1), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn insufficient_data() {
        let result = estimate_transitions(&[1], 2, &FitConfig::new());
        assert_eq!(result, Err(ChainError::InsufficientData { n: 1, min: 2 }));
    }

    #[test]
    fn out_of_range_observation() {
        let result = estimate_transitions(&[0, 4, 1], 3, &FitConfig::new());
        assert_eq!(
            result,
            Err(ChainError::InvalidState {
                state: 4,
                dimension: 3
            })
        );
    }

    #[test]
    fn fit_carries_seed_and_initial_state() {
        let config = FitConfig::new().with_seed(Some(5)).with_initial_from_data(true);
        let desc = ChainDescription::fit(&[2, 0, 1, 2], 3, &config).unwrap();
        assert_eq!(desc.my_seed(), Some(5));
        assert_eq!(desc.initial_state(), &InitialState::Fixed(2));
        assert!(desc.matrix().is_some());
    }
}
