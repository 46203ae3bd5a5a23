use thiserror::Error;

/// Errors raised by [`BernoulliNb`](crate::bayes::BernoulliNb).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BayesError {
    /// Malformed training or prediction data, or a bad hyperparameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Column count differs from the one seen at fit time.
    #[error("dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// `predict` called before `fit`.
    #[error("model has not been fitted")]
    Untrained,
}

pub type Result<T> = std::result::Result<T, BayesError>;
