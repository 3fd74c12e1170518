//! Strategic priority model.
//!
//! # Responsibility
//! - Describe one life/work area that triaged commitments are filed under.
//! - Carry the pinned flag that splits "active focus" from "backlog".
//!
//! # Invariants
//! - `name` is never blank.
//! - `is_pinned` is a display partition only; it gates no behavior except the
//!   alignment score computed in review.

use super::validation::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PriorityId = Uuid;

/// Default weight assigned to user-created priorities.
pub const DEFAULT_PRIORITY_WEIGHT: u32 = 50;

/// Description used when the user leaves it empty.
pub const DEFAULT_PRIORITY_DESCRIPTION: &str = "Define what this priority means to you.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicPriority {
    pub id: PriorityId,
    pub name: String,
    pub weight: u32,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub anti_examples: Vec<String>,
    /// Older payloads omit the flag entirely.
    #[serde(default)]
    pub is_pinned: bool,
}

impl StrategicPriority {
    /// Creates a pinned priority with default weight and description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            weight: DEFAULT_PRIORITY_WEIGHT,
            description: DEFAULT_PRIORITY_DESCRIPTION.to_string(),
            examples: Vec::new(),
            anti_examples: Vec::new(),
            is_pinned: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.trim().is_empty() {
            self.description = description;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::EmptyField {
                entity: "priority",
                field: "name",
                id: self.id,
            });
        }
        Ok(())
    }
}
