//! Calendar block model: a commitment placed on the schedule grid.
//!
//! # Invariants
//! - `end >= start`; task-list placements use `end == start`.
//! - `google_event_id` is empty for local-only blocks.

use super::commitment::CommitmentId;
use super::validation::ModelValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BlockId = Uuid;

/// Calendar id used when no remote provider is connected.
pub const LOCAL_CALENDAR_ID: &str = "local";
/// Remote calendar id used for connected placements.
pub const PRIMARY_CALENDAR_ID: &str = "primary";
/// Pseudo calendar id for commitments sent to a task list.
pub const TASKS_CALENDAR_ID: &str = "tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Planned,
    Confirmed,
    Moved,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarBlock {
    pub id: BlockId,
    pub commitment_id: CommitmentId,
    #[serde(default)]
    pub google_event_id: String,
    pub calendar_id: String,
    #[serde(rename = "startISO")]
    pub start: DateTime<Utc>,
    #[serde(rename = "endISO")]
    pub end: DateTime<Utc>,
    pub status: BlockStatus,
    #[serde(rename = "lastSyncedAtISO")]
    pub last_synced_at: DateTime<Utc>,
}

impl CalendarBlock {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whole minutes covered by this block.
    pub fn minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Half-open containment: `start <= at < end`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    pub fn is_local(&self) -> bool {
        self.google_event_id.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.status == BlockStatus::Completed
    }

    /// Zero-length marker left behind by a send-to-tasks placement.
    pub fn is_task_placeholder(&self) -> bool {
        self.calendar_id == TASKS_CALENDAR_ID
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.end < self.start {
            return Err(ModelValidationError::ReversedRange {
                entity: "calendar_block",
                field: "startISO..endISO",
                id: self.id,
            });
        }
        if self.calendar_id.trim().is_empty() {
            return Err(ModelValidationError::EmptyField {
                entity: "calendar_block",
                field: "calendarId",
                id: self.id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockStatus, CalendarBlock, LOCAL_CALENDAR_ID};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn block(start_hour: u32, minutes: i64) -> CalendarBlock {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, start_hour, 0, 0).unwrap();
        CalendarBlock {
            id: Uuid::new_v4(),
            commitment_id: Uuid::new_v4(),
            google_event_id: String::new(),
            calendar_id: LOCAL_CALENDAR_ID.to_string(),
            start,
            end: start + Duration::minutes(minutes),
            status: BlockStatus::Planned,
            last_synced_at: start,
        }
    }

    #[test]
    fn contains_is_half_open() {
        let b = block(9, 60);
        assert!(b.contains(b.start));
        assert!(b.contains(b.start + Duration::minutes(59)));
        assert!(!b.contains(b.end));
    }

    #[test]
    fn reversed_range_fails_validation() {
        let mut b = block(9, 30);
        b.end = b.start - Duration::minutes(1);
        assert!(b.validate().is_err());
    }

    #[test]
    fn serializes_iso_field_names() {
        let b = block(14, 60);
        let value = serde_json::to_value(&b).expect("serialize block");
        assert!(value["startISO"].as_str().unwrap().starts_with("2025-03-03T14:00:00"));
        assert!(value["endISO"].as_str().unwrap().starts_with("2025-03-03T15:00:00"));
        assert_eq!(value["status"], "planned");
        assert_eq!(value["googleEventId"], "");
    }
}
