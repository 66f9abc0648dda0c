//! Checker and orchestrator error types
//!
//! A `CheckError::Precondition` is contained at the batch boundary and turned
//! into a failure of every check the batch owns. An `EngineError` aborts the
//! whole run: it signals a defect in a checker module or the registry, not a
//! problem with the package under validation.

use thiserror::Error;

use crate::manifest::ManifestError;
use crate::package::PackageError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The checker cannot run at all; the message is reported verbatim
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    Contract(#[from] EngineError),
}

impl CheckError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }
}

impl From<ManifestError> for CheckError {
    fn from(err: ManifestError) -> Self {
        Self::Precondition(err.to_string())
    }
}

impl From<PackageError> for CheckError {
    fn from(err: PackageError) -> Self {
        Self::Precondition(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("checker {checker} violated the reporting contract: {message}")]
    ContractViolation { checker: String, message: String },

    #[error("invalid checker registry: {message}")]
    InvalidRegistry { message: String },

    #[error("invalid check identifier {id:?}: expected PREFIX-NNN-V")]
    InvalidCheckId { id: String },
}
