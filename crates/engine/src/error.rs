//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAllocation`] thrown when an amount cannot be divided among the
//!   available slots (no proportional slot left to absorb a remainder).
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`Validation`] thrown when a structural precondition of the input is
//!   violated (negative totals, inverted date ranges, ...).
//! - [`Database`] thrown when any persistence step fails. The whole
//!   operation is rolled back.
//!
//!  [`InvalidAllocation`]: EngineError::InvalidAllocation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Validation`]: EngineError::Validation
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Fieldless view of [`EngineError`], handy for mapping errors to response
/// codes without matching on the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidAllocation,
    NotFound,
    ValidationFailure,
    PersistenceFailure,
}

impl EngineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAllocation(_) => ErrorKind::InvalidAllocation,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Database(_) => ErrorKind::PersistenceFailure,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAllocation(a), Self::InvalidAllocation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_every_variant() {
        assert_eq!(
            EngineError::InvalidAllocation("x".to_string()).kind(),
            ErrorKind::InvalidAllocation
        );
        assert_eq!(
            EngineError::KeyNotFound("bill".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::Validation("x".to_string()).kind(),
            ErrorKind::ValidationFailure
        );
        assert_eq!(
            EngineError::Database(DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::PersistenceFailure
        );
    }

    #[test]
    fn display_keeps_cause() {
        let err = EngineError::KeyNotFound("bill 7".to_string());
        assert_eq!(err.to_string(), "\"bill 7\" key not found!");
    }
}
