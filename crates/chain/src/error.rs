//! Error types for the markovtool-chain crate.

/// Error type for all fallible operations in the markovtool-chain crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// Returned when a chain is requested with fewer than one state.
    #[error("invalid dimension: {dimension} (must be at least 1)")]
    InvalidDimension {
        /// The invalid dimension.
        dimension: usize,
    },

    /// Returned when a transition matrix is not square or not row-stochastic.
    #[error("invalid matrix: {reason}")]
    InvalidMatrix {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when an initial-state probability vector is malformed.
    #[error("invalid distribution: {reason}")]
    InvalidDistribution {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a state index lies outside `[0, dimension)`.
    #[error("invalid state: {state} (must be in 0..{dimension})")]
    InvalidState {
        /// The offending state index.
        state: usize,
        /// Number of states in the chain.
        dimension: usize,
    },

    /// Returned when advancing a chain whose matrix is missing or invalid.
    #[error("chain has no valid transition matrix")]
    UninitializedChain,

    /// Returned when two sizes that must agree do not.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// Returned when there are too few observations to fit a chain.
    #[error("insufficient data: got {n} observations, need at least {min}")]
    InsufficientData {
        /// Number of observations provided.
        n: usize,
        /// Minimum required.
        min: usize,
    },

    /// Returned when a configuration value is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a model node is given an empty firing pattern.
    #[error("firing pattern is empty")]
    EmptyPattern,

    /// Returned when a dependent node fires before its input has a state.
    #[error("input of node {node} has not produced a state yet")]
    UnstartedInput {
        /// Index of the dependent node.
        node: usize,
    },

    /// Returned when a persisted description cannot be parsed.
    #[error("parse error: {reason}")]
    Parse {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when reading or writing a file fails.
    #[error("i/o error on {path}: {reason}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error message.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_dimension() {
        let e = ChainError::InvalidDimension { dimension: 0 };
        assert_eq!(e.to_string(), "invalid dimension: 0 (must be at least 1)");
    }

    #[test]
    fn error_invalid_matrix() {
        let e = ChainError::InvalidMatrix {
            reason: "row 1 sums to 0.5, expected ~1.0".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid matrix: row 1 sums to 0.5, expected ~1.0"
        );
    }

    #[test]
    fn error_invalid_state() {
        let e = ChainError::InvalidState {
            state: 5,
            dimension: 3,
        };
        assert_eq!(e.to_string(), "invalid state: 5 (must be in 0..3)");
    }

    #[test]
    fn error_uninitialized_chain() {
        let e = ChainError::UninitializedChain;
        assert_eq!(e.to_string(), "chain has no valid transition matrix");
    }

    #[test]
    fn error_dimension_mismatch() {
        let e = ChainError::DimensionMismatch {
            expected: 4,
            got: 3,
        };
        assert_eq!(e.to_string(), "dimension mismatch: expected 4, got 3");
    }

    #[test]
    fn error_insufficient_data() {
        let e = ChainError::InsufficientData { n: 1, min: 2 };
        assert_eq!(
            e.to_string(),
            "insufficient data: got 1 observations, need at least 2"
        );
    }

    #[test]
    fn error_unstarted_input() {
        let e = ChainError::UnstartedInput { node: 2 };
        assert_eq!(e.to_string(), "input of node 2 has not produced a state yet");
    }

    #[test]
    fn error_io() {
        let e = ChainError::Io {
            path: "chain.json".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(e.to_string(), "i/o error on chain.json: not found");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<ChainError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<ChainError>();
    }
}
