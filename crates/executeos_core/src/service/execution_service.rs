//! Execution use-cases: what is happening now and what comes next.
//!
//! Blocks are ordered by `(start, id)`; a block is current while
//! `start <= now < end`. The first match in that order wins on overlap.

use crate::model::block::CalendarBlock;
use chrono::{DateTime, Duration, Utc};

pub fn sorted_blocks(blocks: &[CalendarBlock]) -> Vec<&CalendarBlock> {
    let mut sorted: Vec<&CalendarBlock> = blocks.iter().collect();
    sorted.sort_by_key(|b| (b.start, b.id));
    sorted
}

pub fn current_block(blocks: &[CalendarBlock], now: DateTime<Utc>) -> Option<&CalendarBlock> {
    sorted_blocks(blocks).into_iter().find(|b| b.contains(now))
}

/// First block starting strictly after `now`.
pub fn next_block(blocks: &[CalendarBlock], now: DateTime<Utc>) -> Option<&CalendarBlock> {
    sorted_blocks(blocks).into_iter().find(|b| b.start > now)
}

/// Time left in `block`, never negative.
pub fn remaining(block: &CalendarBlock, now: DateTime<Utc>) -> Duration {
    (block.end - now).max(Duration::zero())
}

/// `MM:SS`, minutes unbounded; `00:00` once elapsed.
pub fn format_remaining(remaining: Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Share of grid blocks marked completed, 0 for an empty day.
/// Task-list placeholders are not work on the grid and are skipped.
pub fn progress_percent(blocks: &[CalendarBlock]) -> f64 {
    let grid: Vec<&CalendarBlock> = blocks
        .iter()
        .filter(|b| !b.is_task_placeholder())
        .collect();
    if grid.is_empty() {
        return 0.0;
    }
    let done = grid.iter().filter(|b| b.is_completed()).count();
    done as f64 / grid.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{BlockStatus, LOCAL_CALENDAR_ID, TASKS_CALENDAR_ID};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn block(hour: u32, minutes: i64) -> CalendarBlock {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, hour, 0, 0).unwrap();
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
    fn current_block_uses_half_open_interval() {
        let blocks = vec![block(10, 60), block(9, 60)];
        let at_ten = Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap();
        let current = current_block(&blocks, at_ten).expect("10:00 block");
        assert_eq!(current.id, blocks[0].id);
        assert_eq!(next_block(&blocks, at_ten), None);

        let early = Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap();
        assert!(current_block(&blocks, early).is_none());
        assert_eq!(next_block(&blocks, early).map(|b| b.id), Some(blocks[1].id));
    }

    #[test]
    fn format_remaining_pads_and_floors_at_zero() {
        assert_eq!(format_remaining(Duration::seconds(125)), "02:05");
        assert_eq!(format_remaining(Duration::minutes(90)), "90:00");
        assert_eq!(format_remaining(Duration::seconds(-5)), "00:00");

        let b = block(9, 30);
        let after = Utc.with_ymd_and_hms(2025, 3, 3, 11, 0, 0).unwrap();
        assert_eq!(remaining(&b, after), Duration::zero());
    }

    #[test]
    fn progress_counts_completed_blocks() {
        assert_eq!(progress_percent(&[]), 0.0);
        let mut blocks = vec![block(9, 30), block(10, 30)];
        blocks[0].status = BlockStatus::Completed;
        assert_eq!(progress_percent(&blocks), 50.0);
    }

    #[test]
    fn progress_skips_task_list_placeholders() {
        let mut placeholder = block(11, 0);
        placeholder.calendar_id = TASKS_CALENDAR_ID.to_string();
        placeholder.status = BlockStatus::Completed;
        assert_eq!(progress_percent(&[placeholder.clone()]), 0.0);

        let blocks = vec![block(9, 30), placeholder];
        assert_eq!(progress_percent(&blocks), 0.0);
    }
}
