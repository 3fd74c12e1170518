//! Commitment model: a triaged capture item with effort metadata.
//!
//! # Invariants
//! - Exactly one commitment per triaged capture item.
//! - `title` is never blank.
//! - `duration_minutes == 0` is storable (fresh import) but blocks scheduling.

use super::capture::CaptureItemId;
use super::priority::PriorityId;
use super::validation::ModelValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CommitmentId = Uuid;

/// Duration assigned by manual triage.
pub const DEFAULT_COMMITMENT_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentType {
    Task,
    Event,
    Idea,
    Note,
    WaitingOn,
}

impl CommitmentType {
    /// Lenient parse used for externally suggested values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Self::Task),
            "event" => Some(Self::Event),
            "idea" => Some(Self::Idea),
            "note" => Some(Self::Note),
            "waiting_on" | "waiting on" | "waitingon" => Some(Self::WaitingOn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub id: CommitmentId,
    pub capture_item_id: CaptureItemId,
    #[serde(rename = "type")]
    pub kind: CommitmentType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Not foreign-key checked in storage; see `IntegrityReport`.
    pub priority_id: PriorityId,
    pub duration_minutes: u32,
    pub energy: EnergyLevel,
    #[serde(
        rename = "deadlineISO",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(
        rename = "timeWindowStartISO",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub time_window_start: Option<DateTime<Utc>>,
    #[serde(
        rename = "timeWindowEndISO",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub time_window_end: Option<DateTime<Utc>>,
}

impl Commitment {
    /// Creates the default commitment produced by manual triage.
    pub fn from_capture(
        capture_item_id: CaptureItemId,
        title: impl Into<String>,
        priority_id: PriorityId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            capture_item_id,
            kind: CommitmentType::Task,
            title: title.into(),
            description: None,
            priority_id,
            duration_minutes: DEFAULT_COMMITMENT_MINUTES,
            energy: EnergyLevel::Medium,
            deadline: None,
            time_window_start: None,
            time_window_end: None,
        }
    }

    pub fn has_positive_duration(&self) -> bool {
        self.duration_minutes > 0
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::EmptyField {
                entity: "commitment",
                field: "title",
                id: self.id,
            });
        }
        if let (Some(start), Some(end)) = (self.time_window_start, self.time_window_end) {
            if end < start {
                return Err(ModelValidationError::ReversedRange {
                    entity: "commitment",
                    field: "timeWindow",
                    id: self.id,
                });
            }
        }
        Ok(())
    }
}
