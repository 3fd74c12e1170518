//! Shared validation error for domain entities.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Invariant violation detected by an entity `validate()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    /// A required text field is empty after trimming.
    EmptyField {
        entity: &'static str,
        field: &'static str,
        id: Uuid,
    },
    /// An interval ends before it starts.
    ReversedRange {
        entity: &'static str,
        field: &'static str,
        id: Uuid,
    },
    /// A numeric field is outside its accepted range.
    OutOfRange {
        entity: &'static str,
        field: &'static str,
        id: Uuid,
        value: f64,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field, id } => {
                write!(f, "{entity} {id}: `{field}` must not be empty")
            }
            Self::ReversedRange { entity, field, id } => {
                write!(f, "{entity} {id}: `{field}` ends before it starts")
            }
            Self::OutOfRange {
                entity,
                field,
                id,
                value,
            } => write!(f, "{entity} {id}: `{field}` value {value} is out of range"),
        }
    }
}

impl Error for ModelValidationError {}
