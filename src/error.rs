//! Error types for discrimination statistics
//!
//! Every fallible operation in the library returns [`DiscriminationError`].
//! Nothing is retried internally: the numerical routines are deterministic.

use thiserror::Error;

/// Errors for protocol construction, curve evaluation and hypothesis testing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscriminationError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("Root finding did not converge: {0}")]
    NoConvergence(String),

    #[error("d = {value} is outside the interpolated range [{lower}, {upper}]")]
    DomainError { value: f64, lower: f64, upper: f64 },
}

pub type Result<T> = std::result::Result<T, DiscriminationError>;

impl DiscriminationError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub(crate) fn no_convergence(msg: impl Into<String>) -> Self {
        Self::NoConvergence(msg.into())
    }
}
