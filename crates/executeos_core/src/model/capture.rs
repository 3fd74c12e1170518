//! Capture item model (one brain-dump line).
//!
//! # Invariants
//! - `status` only moves forward along `ItemStatus::can_transition_to`.
//! - `confidence`, when present, lies in `[0, 1]`.

use super::commitment::CommitmentType;
use super::priority::PriorityId;
use super::validation::ModelValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CaptureItemId = Uuid;

/// Lifecycle of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Inbox,
    Triaged,
    Scheduled,
    Done,
    Discarded,
}

impl ItemStatus {
    /// Returns whether `self -> next` is an allowed edge.
    ///
    /// `Triaged -> Triaged` is a reassignment to a different priority and
    /// `Triaged -> Discarded` re-files an item as noise. Nothing returns to
    /// `Inbox`; `Done` and `Discarded` are terminal.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (Self::Inbox, Self::Triaged)
                | (Self::Inbox, Self::Discarded)
                | (Self::Triaged, Self::Triaged)
                | (Self::Triaged, Self::Discarded)
                | (Self::Triaged, Self::Scheduled)
                | (Self::Scheduled, Self::Done)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Triaged => "triaged",
            Self::Scheduled => "scheduled",
            Self::Done => "done",
            Self::Discarded => "discarded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureItem {
    pub id: CaptureItemId,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_type: Option<CommitmentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_priority_id: Option<PriorityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discard_suggestion_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarifying_question: Option<String>,
}

impl CaptureItem {
    /// Creates an `inbox` item stamped with `created_at`.
    pub fn new(raw_text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            raw_text: raw_text.into(),
            created_at,
            status: ItemStatus::Inbox,
            suggested_type: None,
            suggested_priority_id: None,
            discard_suggestion_reason: None,
            confidence: None,
            clarifying_question: None,
        }
    }

    pub fn is_inbox(&self) -> bool {
        self.status == ItemStatus::Inbox
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.raw_text.trim().is_empty() {
            return Err(ModelValidationError::EmptyField {
                entity: "capture_item",
                field: "rawText",
                id: self.id,
            });
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ModelValidationError::OutOfRange {
                    entity: "capture_item",
                    field: "confidence",
                    id: self.id,
                    value: confidence,
                });
            }
        }
        Ok(())
    }
}
