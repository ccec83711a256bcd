use thiserror::Error;

/// Error taxonomy shared by the whole engine.
///
/// Empty results are never errors: operators whose outcome is "no time in
/// common" return `None` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Malformed operands: unordered or overlapping components with
    /// normalization disabled, bad span bounds, mismatched SRID or
    /// dimensionality, and the like.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The denominator of a lifted division is zero somewhere on the
    /// synchronized domain.
    #[error("division by zero")]
    DivisionByZero,

    /// The operation is ill-defined for these operands, e.g. the sum of
    /// temporal floats with linear interpolation.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// A cooperative cancellation token was observed mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// An internal invariant did not hold.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
