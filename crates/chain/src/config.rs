//! Configuration for fitting a chain to observed data.

use crate::error::ChainError;

/// Configuration for [`ChainDescription::fit`](crate::ChainDescription::fit).
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use markovtool_chain::FitConfig;
///
/// let config = FitConfig::new()
///     .with_dirichlet_alpha(0.5)
///     .with_seed(Some(3));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct FitConfig {
    dirichlet_alpha: f64,
    seed: Option<u64>,
    initial_from_data: bool,
}

impl FitConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: `dirichlet_alpha = 1.0`, no seed, initial state uniform.
    pub fn new() -> Self {
        Self {
            dirichlet_alpha: 1.0,
            seed: None,
            initial_from_data: false,
        }
    }

    /// Sets the Dirichlet smoothing parameter. Zero disables smoothing.
    pub fn with_dirichlet_alpha(mut self, alpha: f64) -> Self {
        self.dirichlet_alpha = alpha;
        self
    }

    /// Sets the seed carried by the fitted description.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// When set, the fitted description starts in the first observed state.
    pub fn with_initial_from_data(mut self, enabled: bool) -> Self {
        self.initial_from_data = enabled;
        self
    }

    /// Returns the Dirichlet smoothing parameter.
    pub fn dirichlet_alpha(&self) -> f64 {
        self.dirichlet_alpha
    }

    /// Returns the seed carried by the fitted description.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns whether the first observation becomes the initial state.
    pub fn initial_from_data(&self) -> bool {
        self.initial_from_data
    }

    /// Validates this configuration.
    ///
    /// Alpha must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ChainError> {
        if !self.dirichlet_alpha.is_finite() || self.dirichlet_alpha < 0.0 {
            return Err(ChainError::InvalidConfig {
                reason: format!(
                    "dirichlet_alpha must be finite and non-negative, got {}",
                    self.dirichlet_alpha
                ),
            });
        }
        Ok(())
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self::new()
    }
}
