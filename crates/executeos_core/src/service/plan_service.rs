//! Scheduling grid: coordinate math and block placement.
//!
//! # Responsibility
//! - Convert between grid pixel offsets and wall-clock slots.
//! - Build day/week/month date ranges for the grid.
//! - Create and reposition `CalendarBlock`s.
//!
//! # Invariants
//! - `end = start + commitment.duration_minutes` on placement.
//! - Moving a block preserves `end - start` exactly.
//! - Overlapping blocks are allowed; no conflict detection happens here.

use crate::model::block::{BlockStatus, CalendarBlock, LOCAL_CALENDAR_ID};
use crate::model::commitment::{Commitment, CommitmentId};
use crate::service::error::{WorkflowError, WorkflowResult};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Pixel height of one grid hour.
pub const DEFAULT_HOUR_HEIGHT_PX: f64 = 120.0;
const MINUTES_PER_DAY: u32 = 24 * 60;
const MONTH_GRID_CELLS: i64 = 42;

/// Grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridInterval {
    Quarter,
    #[default]
    Half,
    Hour,
}

impl GridInterval {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            15 => Some(Self::Quarter),
            30 => Some(Self::Half),
            60 => Some(Self::Hour),
            _ => None,
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::Quarter => 15,
            Self::Half => 30,
            Self::Hour => 60,
        }
    }

    pub fn slots_per_hour(self) -> u32 {
        60 / self.minutes()
    }

    /// Rounds `minute` down to the slot boundary.
    pub fn snap(self, minute: u32) -> u32 {
        minute - minute % self.minutes()
    }
}

/// Vertical geometry of the day columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub hour_height_px: f64,
    pub interval: GridInterval,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            hour_height_px: DEFAULT_HOUR_HEIGHT_PX,
            interval: GridInterval::default(),
        }
    }
}

impl GridGeometry {
    /// Top offset of a wall-clock time: `(hour + minute / 60) * hour_height`.
    pub fn offset_px(&self, hour: u32, minute: u32) -> f64 {
        (f64::from(hour) + f64::from(minute) / 60.0) * self.hour_height_px
    }

    /// Rendered height of a block lasting `minutes`.
    pub fn height_px(&self, minutes: i64) -> f64 {
        minutes as f64 / 60.0 * self.hour_height_px
    }

    /// Slot under a cursor offset, snapped down to the interval and clamped to
    /// the day.
    pub fn slot_at_offset(&self, offset_px: f64) -> (u32, u32) {
        let day_px = 24.0 * self.hour_height_px;
        let clamped = if offset_px.is_finite() {
            offset_px.clamp(0.0, day_px)
        } else {
            0.0
        };
        let raw = (clamped / self.hour_height_px * 60.0).floor() as u32;
        let total = self.interval.snap(raw.min(MINUTES_PER_DAY - 1));
        (total / 60, total % 60)
    }

    /// Slot start minutes within one hour, e.g. `[0, 15, 30, 45]`.
    pub fn slot_minutes(&self) -> Vec<u32> {
        let step = self.interval.minutes();
        (0..self.interval.slots_per_hour()).map(|i| i * step).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewType {
    Day,
    #[default]
    Week,
    Month,
}

impl ViewType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

/// One column (day/week) or cell (month) of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    pub in_anchor_month: bool,
}

/// Dates shown for `view` around `anchor`.
///
/// Weeks start on Sunday; the month view is always 42 cells.
pub fn visible_days(view: ViewType, anchor: NaiveDate) -> Vec<GridDay> {
    let (first, count) = match view {
        ViewType::Day => (anchor, 1),
        ViewType::Week => {
            let back = i64::from(anchor.weekday().num_days_from_sunday());
            (anchor - Duration::days(back), 7)
        }
        ViewType::Month => {
            let first_of_month = anchor.with_day(1).unwrap_or(anchor);
            let back = i64::from(first_of_month.weekday().num_days_from_sunday());
            (first_of_month - Duration::days(back), MONTH_GRID_CELLS)
        }
    };
    (0..count)
        .map(|i| {
            let date = first + Duration::days(i);
            GridDay {
                date,
                in_anchor_month: date.year() == anchor.year() && date.month() == anchor.month(),
            }
        })
        .collect()
}

/// Moves the anchor by `offset` days, weeks or months.
pub fn shift_anchor(view: ViewType, anchor: NaiveDate, offset: i32) -> NaiveDate {
    match view {
        ViewType::Day => anchor + Duration::days(i64::from(offset)),
        ViewType::Week => anchor + Duration::days(7 * i64::from(offset)),
        ViewType::Month => {
            let months = Months::new(offset.unsigned_abs());
            let shifted = if offset >= 0 {
                anchor.checked_add_months(months)
            } else {
                anchor.checked_sub_months(months)
            };
            shifted.unwrap_or(anchor)
        }
    }
}

/// Converts a drop on `date` at `hour:minute` local time into an instant.
///
/// Ambiguous times (DST fold) resolve to the earlier instant.
pub fn drop_start<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> WorkflowResult<DateTime<Utc>> {
    let time =
        NaiveTime::from_hms_opt(hour, minute, 0).ok_or(WorkflowError::InvalidSlot { hour, minute })?;
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or(WorkflowError::NonexistentLocalTime { date, hour, minute })
}

/// Where a block lives: local grid, remote calendar or task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlacement {
    pub calendar_id: String,
    pub external_id: String,
}

impl BlockPlacement {
    pub fn local() -> Self {
        Self {
            calendar_id: LOCAL_CALENDAR_ID.to_string(),
            external_id: String::new(),
        }
    }

    pub fn remote(calendar_id: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            external_id: external_id.into(),
        }
    }
}

/// Commitments without any block, in list order.
pub fn unscheduled<'a>(
    commitments: &'a [Commitment],
    blocks: &[CalendarBlock],
) -> Vec<&'a Commitment> {
    let scheduled: HashSet<CommitmentId> = blocks.iter().map(|b| b.commitment_id).collect();
    commitments
        .iter()
        .filter(|c| !scheduled.contains(&c.id))
        .collect()
}

/// Rejects a second placement of the same commitment.
pub fn ensure_not_scheduled(
    blocks: &[CalendarBlock],
    commitment_id: CommitmentId,
) -> WorkflowResult<()> {
    match blocks.iter().find(|b| b.commitment_id == commitment_id) {
        Some(block) => Err(WorkflowError::AlreadyScheduled {
            commitment_id,
            block_id: block.id,
        }),
        None => Ok(()),
    }
}

/// Builds the block for dropping `commitment` at `start`.
pub fn new_block(
    commitment: &Commitment,
    start: DateTime<Utc>,
    placement: BlockPlacement,
    now: DateTime<Utc>,
) -> WorkflowResult<CalendarBlock> {
    if !commitment.has_positive_duration() {
        return Err(WorkflowError::InvalidDuration(commitment.id));
    }
    Ok(CalendarBlock {
        id: Uuid::new_v4(),
        commitment_id: commitment.id,
        google_event_id: placement.external_id,
        calendar_id: placement.calendar_id,
        start,
        end: start + Duration::minutes(i64::from(commitment.duration_minutes)),
        status: BlockStatus::Planned,
        last_synced_at: now,
    })
}

/// Zero-length completed block recording a hand-off to a task list.
pub fn task_list_block(
    commitment: &Commitment,
    placement: BlockPlacement,
    now: DateTime<Utc>,
) -> CalendarBlock {
    CalendarBlock {
        id: Uuid::new_v4(),
        commitment_id: commitment.id,
        google_event_id: placement.external_id,
        calendar_id: placement.calendar_id,
        start: now,
        end: now,
        status: BlockStatus::Completed,
        last_synced_at: now,
    }
}

/// Copy of `block` starting at `new_start` with the same duration.
pub fn moved_block(
    block: &CalendarBlock,
    new_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CalendarBlock {
    let duration = block.duration();
    CalendarBlock {
        start: new_start,
        end: new_start + duration,
        status: BlockStatus::Moved,
        last_synced_at: now,
        ..block.clone()
    }
}

/// Blocks starting on `date` in `tz`, ordered by start.
pub fn blocks_on_day<'a, Tz: TimeZone>(
    blocks: &'a [CalendarBlock],
    tz: &Tz,
    date: NaiveDate,
) -> Vec<&'a CalendarBlock> {
    let mut day: Vec<&CalendarBlock> = blocks
        .iter()
        .filter(|b| b.start.with_timezone(tz).date_naive() == date)
        .collect();
    day.sort_by_key(|b| (b.start, b.id));
    day
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    #[test]
    fn offset_and_slot_round_trip_on_interval() {
        let geometry = GridGeometry {
            hour_height_px: 120.0,
            interval: GridInterval::Quarter,
        };
        assert_eq!(geometry.offset_px(14, 30), 1740.0);
        assert_eq!(geometry.slot_at_offset(1740.0), (14, 30));
        assert_eq!(geometry.slot_at_offset(1769.0), (14, 30));
        assert_eq!(geometry.slot_at_offset(1770.0), (14, 45));
        assert_eq!(geometry.height_px(45), 90.0);
    }

    #[test]
    fn slot_at_offset_clamps_to_day() {
        let geometry = GridGeometry::default();
        assert_eq!(geometry.slot_at_offset(-50.0), (0, 0));
        assert_eq!(geometry.slot_at_offset(1.0e9), (23, 30));
        assert_eq!(geometry.slot_at_offset(f64::NAN), (0, 0));
    }

    #[test]
    fn slot_minutes_follow_interval() {
        let mut geometry = GridGeometry::default();
        assert_eq!(geometry.slot_minutes(), [0, 30]);
        geometry.interval = GridInterval::Quarter;
        assert_eq!(geometry.slot_minutes(), [0, 15, 30, 45]);
        assert_eq!(GridInterval::from_minutes(45), None);
    }

    #[test]
    fn week_starts_on_sunday_and_month_has_42_cells() {
        let wednesday = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let week = visible_days(ViewType::Week, wednesday);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());

        let month = visible_days(ViewType::Month, wednesday);
        assert_eq!(month.len(), 42);
        // March 2025 starts on a Saturday.
        assert_eq!(month[0].date, NaiveDate::from_ymd_opt(2025, 2, 23).unwrap());
        assert!(!month[5].in_anchor_month);
        assert!(month[6].in_anchor_month);
        assert_eq!(month.iter().filter(|d| d.in_anchor_month).count(), 31);
    }

    #[test]
    fn shift_anchor_by_view() {
        let anchor = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            shift_anchor(ViewType::Day, anchor, -1),
            NaiveDate::from_ymd_opt(2025, 1, 30).unwrap()
        );
        assert_eq!(
            shift_anchor(ViewType::Week, anchor, 1),
            NaiveDate::from_ymd_opt(2025, 2, 7).unwrap()
        );
        assert_eq!(
            shift_anchor(ViewType::Month, anchor, 1),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn drop_start_uses_local_wall_clock() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let start = drop_start(&tz, date, 14, 0).expect("valid slot");
        assert_eq!(start.hour(), 12);
        assert_eq!(start.with_timezone(&tz).hour(), 14);

        assert!(matches!(
            drop_start(&tz, date, 24, 0),
            Err(WorkflowError::InvalidSlot { hour: 24, minute: 0 })
        ));
    }

    #[test]
    fn moved_block_preserves_duration() {
        let commitment = Commitment::from_capture(Uuid::new_v4(), "Write", Uuid::new_v4());
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let block = new_block(&commitment, start, BlockPlacement::local(), start).expect("block");
        let later = Utc.with_ymd_and_hms(2025, 3, 4, 16, 45, 0).unwrap();

        let moved = moved_block(&block, later, later);
        assert_eq!(moved.id, block.id);
        assert_eq!(moved.duration(), block.duration());
        assert_eq!(moved.start, later);
        assert_eq!(moved.status, BlockStatus::Moved);
    }

    #[test]
    fn zero_duration_commitment_cannot_be_placed() {
        let mut commitment = Commitment::from_capture(Uuid::new_v4(), "Write", Uuid::new_v4());
        commitment.duration_minutes = 0;
        let err = new_block(&commitment, Utc::now(), BlockPlacement::local(), Utc::now())
            .expect_err("zero duration");
        assert!(matches!(err, WorkflowError::InvalidDuration(_)));
    }
}
