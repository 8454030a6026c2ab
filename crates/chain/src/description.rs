//! Immutable-by-convention chain descriptions.

use markovtool_rng::derive;

use crate::error::ChainError;
use crate::initial::InitialState;
use crate::matrix::TransitionMatrix;

/// A Markov chain: state count, transition matrix, initial-state policy and
/// seed policy.
///
/// Descriptions are plain values. [`Endless`](crate::Endless) instances
/// share one through an `Arc`, which freezes it; edit a description before
/// handing it out, or derive a new one with [`variant`](Self::variant).
///
/// # Example
///
/// ```
/// use markovtool_chain::{ChainDescription, InitialState};
///
/// let chain = ChainDescription::from_array(&[[0.9, 0.1], [0.5, 0.5]])
///     .unwrap()
///     .with_seed(Some(0))
///     .with_initial_state(InitialState::Fixed(1))
///     .unwrap();
/// assert_eq!(chain.dimension(), 2);
/// assert_eq!(chain.initial_state(), &InitialState::Fixed(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDescription {
    dimension: usize,
    matrix: Option<TransitionMatrix>,
    initial_state: InitialState,
    my_seed: Option<u64>,
}

impl ChainDescription {
    /// Creates a description with no matrix yet.
    ///
    /// Advancing a trajectory over it fails with
    /// [`ChainError::UninitializedChain`] until a matrix is set.
    pub fn new(dimension: usize) -> Result<Self, ChainError> {
        if dimension == 0 {
            return Err(ChainError::InvalidDimension { dimension });
        }
        Ok(Self {
            dimension,
            matrix: None,
            initial_state: InitialState::Uniform,
            my_seed: None,
        })
    }

    /// Draws a random chain of `dimension` states.
    ///
    /// The matrix comes from a generator derived from `seed`, so equal seeds
    /// give equal matrices. The seed also becomes the description's
    /// [`my_seed`](Self::my_seed); the initial state is uniform.
    pub fn random(dimension: usize, seed: Option<u64>) -> Result<Self, ChainError> {
        let mut rng = derive(seed);
        let matrix = TransitionMatrix::random(dimension, &mut rng)?;
        Ok(Self {
            dimension,
            matrix: Some(matrix),
            initial_state: InitialState::Uniform,
            my_seed: seed,
        })
    }

    /// Builds an unseeded description from explicit rows.
    ///
    /// # Errors
    ///
    /// See [`TransitionMatrix::from_rows`].
    pub fn from_array<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ChainError> {
        let matrix = TransitionMatrix::from_rows(rows)?;
        Ok(Self {
            dimension: matrix.dimension(),
            matrix: Some(matrix),
            initial_state: InitialState::Uniform,
            my_seed: None,
        })
    }

    /// Replaces the seed policy.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.my_seed = seed;
        self
    }

    /// Replaces the initial-state policy after validating it.
    pub fn with_initial_state(mut self, initial: InitialState) -> Result<Self, ChainError> {
        self.set_initial_state(initial)?;
        Ok(self)
    }

    /// Replaces the matrix after validating it.
    pub fn with_matrix(mut self, matrix: TransitionMatrix) -> Result<Self, ChainError> {
        self.set_matrix(matrix)?;
        Ok(self)
    }

    /// Returns an independent copy with the given fields replaced.
    ///
    /// `self` is left untouched and shares no storage with the result.
    pub fn variant(&self, overrides: Overrides) -> Result<Self, ChainError> {
        let mut out = self.clone();
        if let Some(matrix) = overrides.matrix {
            out.set_matrix(matrix)?;
        }
        if let Some(initial) = overrides.initial_state {
            out.set_initial_state(initial)?;
        }
        if let Some(seed) = overrides.my_seed {
            out.my_seed = seed;
        }
        Ok(out)
    }

    /// Returns the number of states.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the seed policy; `None` means fresh entropy per trajectory.
    pub fn my_seed(&self) -> Option<u64> {
        self.my_seed
    }

    /// Sets the seed policy for trajectories created from now on.
    pub fn set_my_seed(&mut self, seed: Option<u64>) {
        self.my_seed = seed;
    }

    /// Returns the initial-state policy.
    pub fn initial_state(&self) -> &InitialState {
        &self.initial_state
    }

    /// Sets the initial-state policy.
    ///
    /// # Errors
    ///
    /// See [`InitialState::validate`].
    pub fn set_initial_state(&mut self, initial: InitialState) -> Result<(), ChainError> {
        initial.validate(self.dimension)?;
        self.initial_state = initial;
        Ok(())
    }

    /// Returns the transition matrix, if one has been set.
    pub fn matrix(&self) -> Option<&TransitionMatrix> {
        self.matrix.as_ref()
    }

    /// Sets the transition matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::DimensionMismatch`] if the matrix size differs
    /// from the description's dimension, or the matrix's own validation error.
    pub fn set_matrix(&mut self, matrix: TransitionMatrix) -> Result<(), ChainError> {
        if matrix.dimension() != self.dimension {
            return Err(ChainError::DimensionMismatch {
                expected: self.dimension,
                got: matrix.dimension(),
            });
        }
        matrix.validate()?;
        self.matrix = Some(matrix);
        Ok(())
    }

    /// Gives direct write access to the matrix.
    ///
    /// Row-stochasticity is the caller's responsibility; trajectories refuse
    /// to advance over a matrix that no longer validates.
    pub fn matrix_mut(&mut self) -> Option<&mut TransitionMatrix> {
        self.matrix.as_mut()
    }

    /// Returns the matrix if it is present and valid.
    pub(crate) fn ready_matrix(&self) -> Result<&TransitionMatrix, ChainError> {
        match &self.matrix {
            Some(m) if m.validate().is_ok() => Ok(m),
            _ => Err(ChainError::UninitializedChain),
        }
    }
}

/// Field replacements for [`ChainDescription::variant`].
///
/// # Example
///
/// ```
/// use markovtool_chain::{ChainDescription, InitialState, Overrides};
///
/// let base = ChainDescription::random(3, Some(1)).unwrap();
/// let pinned = base
///     .variant(Overrides::new().with_initial_state(InitialState::Fixed(0)))
///     .unwrap();
/// assert_eq!(pinned.matrix(), base.matrix());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    matrix: Option<TransitionMatrix>,
    initial_state: Option<InitialState>,
    my_seed: Option<Option<u64>>,
}

impl Overrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the matrix.
    pub fn with_matrix(mut self, matrix: TransitionMatrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    /// Replaces the initial-state policy.
    pub fn with_initial_state(mut self, initial: InitialState) -> Self {
        self.initial_state = Some(initial);
        self
    }

    /// Replaces the seed policy, including clearing it with `None`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.my_seed = Some(seed);
        self
    }
}
