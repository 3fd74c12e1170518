//! Finalized planning-cycle snapshot.

use super::block::CalendarBlock;
use super::capture::CaptureItem;
use super::commitment::Commitment;
use super::validation::ModelValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Read-only historical record. `alignment_score` is stored verbatim and never
/// recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSession {
    pub id: SessionId,
    #[serde(rename = "timestampISO")]
    pub timestamp: DateTime<Utc>,
    pub items: Vec<CaptureItem>,
    pub commitments: Vec<Commitment>,
    pub blocks: Vec<CalendarBlock>,
    pub alignment_score: f64,
}

impl ExecutionSession {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if !self.alignment_score.is_finite() || !(0.0..=100.0).contains(&self.alignment_score) {
            return Err(ModelValidationError::OutOfRange {
                entity: "execution_session",
                field: "alignmentScore",
                id: self.id,
                value: self.alignment_score,
            });
        }
        for item in &self.items {
            item.validate()?;
        }
        for commitment in &self.commitments {
            commitment.validate()?;
        }
        for block in &self.blocks {
            block.validate()?;
        }
        Ok(())
    }
}
