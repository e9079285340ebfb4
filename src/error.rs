use std::result::Result as StdResult;

use thiserror::Error;

/// Errors returned by `CardinalityEstimator` operations.
///
/// Every error is raised before any register is touched, so a rejected call
/// leaves the estimator unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("precision {0} is outside of supported range [4..16]")]
    InvalidPrecision(u8),
    #[error("cannot merge estimators with different precision: {lhs} != {rhs}")]
    PrecisionMismatch { lhs: u8, rhs: u8 },
    #[error("expected {expected} registers for precision {precision}, found {found}")]
    RegisterCountMismatch {
        precision: u8,
        expected: usize,
        found: usize,
    },
    #[error("register {index} holds rank {rank}, maximum for this precision is {max}")]
    RankOutOfRange { index: usize, rank: u8, max: u8 },
}

/// Broad category of an [`Error`]
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition on an argument was violated
    InvalidArgument,
}

impl Error {
    /// Return the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPrecision(_)
            | Error::PrecisionMismatch { .. }
            | Error::RegisterCountMismatch { .. }
            | Error::RankOutOfRange { .. } => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T> = StdResult<T, Error>;
