//! Review use-cases: cycle statistics, integrity checks, session snapshot.

use crate::model::block::{BlockId, CalendarBlock};
use crate::model::capture::{CaptureItem, ItemStatus};
use crate::model::commitment::{Commitment, CommitmentId};
use crate::model::priority::{PriorityId, StrategicPriority};
use crate::model::session::ExecutionSession;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Scheduled minutes attributed to one priority.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityMinutes {
    pub priority_id: PriorityId,
    pub name: String,
    pub is_pinned: bool,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewStats {
    pub captured: usize,
    pub discarded: usize,
    /// Number of blocks, not distinct commitments.
    pub scheduled: usize,
    /// Minutes attributed to existing priorities; blocks whose commitment or
    /// priority is gone are left out.
    pub total_minutes: i64,
    /// Priorities with scheduled time; pinned first, rank order within groups.
    pub by_priority: Vec<PriorityMinutes>,
    /// Percent of scheduled minutes spent on pinned priorities, 0 when nothing
    /// is scheduled.
    pub alignment_score: f64,
}

/// Referential problems that storage does not enforce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub dangling_priority_refs: Vec<CommitmentId>,
    pub duplicate_blocks: Vec<(CommitmentId, Vec<BlockId>)>,
    pub orphan_blocks: Vec<BlockId>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_priority_refs.is_empty()
            && self.duplicate_blocks.is_empty()
            && self.orphan_blocks.is_empty()
    }
}

pub fn review_stats(
    priorities: &[StrategicPriority],
    items: &[CaptureItem],
    commitments: &[Commitment],
    blocks: &[CalendarBlock],
) -> ReviewStats {
    let commitment_priority: HashMap<CommitmentId, PriorityId> =
        commitments.iter().map(|c| (c.id, c.priority_id)).collect();

    let mut minutes_by_priority: HashMap<PriorityId, i64> = HashMap::new();
    for block in blocks {
        if let Some(priority_id) = commitment_priority.get(&block.commitment_id) {
            *minutes_by_priority.entry(*priority_id).or_default() += block.minutes();
        }
    }

    let mut by_priority: Vec<PriorityMinutes> = priorities
        .iter()
        .filter_map(|priority| {
            let minutes = minutes_by_priority.get(&priority.id).copied().unwrap_or(0);
            (minutes > 0).then(|| PriorityMinutes {
                priority_id: priority.id,
                name: priority.name.clone(),
                is_pinned: priority.is_pinned,
                minutes,
            })
        })
        .collect();
    // Stable sort keeps rank order inside the pinned and backlog groups.
    by_priority.sort_by_key(|entry| !entry.is_pinned);

    let total_minutes: i64 = by_priority.iter().map(|entry| entry.minutes).sum();
    let pinned_minutes: i64 = by_priority
        .iter()
        .filter(|entry| entry.is_pinned)
        .map(|entry| entry.minutes)
        .sum();

    ReviewStats {
        captured: items.len(),
        discarded: items
            .iter()
            .filter(|item| item.status == ItemStatus::Discarded)
            .count(),
        scheduled: blocks.len(),
        total_minutes,
        by_priority,
        alignment_score: alignment_score(pinned_minutes, total_minutes),
    }
}

fn alignment_score(pinned_minutes: i64, total_minutes: i64) -> f64 {
    if total_minutes <= 0 {
        return 0.0;
    }
    (pinned_minutes as f64 / total_minutes as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn integrity_report(
    priorities: &[StrategicPriority],
    commitments: &[Commitment],
    blocks: &[CalendarBlock],
) -> IntegrityReport {
    let priority_ids: HashSet<PriorityId> = priorities.iter().map(|p| p.id).collect();
    let commitment_ids: HashSet<CommitmentId> = commitments.iter().map(|c| c.id).collect();

    let dangling_priority_refs = commitments
        .iter()
        .filter(|c| !priority_ids.contains(&c.priority_id))
        .map(|c| c.id)
        .collect();

    let mut per_commitment: BTreeMap<CommitmentId, Vec<BlockId>> = BTreeMap::new();
    let mut orphan_blocks = Vec::new();
    for block in blocks {
        if commitment_ids.contains(&block.commitment_id) {
            per_commitment
                .entry(block.commitment_id)
                .or_default()
                .push(block.id);
        } else {
            orphan_blocks.push(block.id);
        }
    }
    let duplicate_blocks = per_commitment
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .collect();

    IntegrityReport {
        dangling_priority_refs,
        duplicate_blocks,
        orphan_blocks,
    }
}

/// Snapshot of the current buffers with the score frozen at `now`.
pub fn build_session(
    items: &[CaptureItem],
    commitments: &[Commitment],
    blocks: &[CalendarBlock],
    alignment_score: f64,
    now: DateTime<Utc>,
) -> ExecutionSession {
    ExecutionSession {
        id: Uuid::new_v4(),
        timestamp: now,
        items: items.to_vec(),
        commitments: commitments.to_vec(),
        blocks: blocks.to_vec(),
        alignment_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{BlockStatus, LOCAL_CALENDAR_ID};
    use chrono::{Duration, TimeZone};

    fn block_for(commitment: &Commitment, minutes: i64) -> CalendarBlock {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        CalendarBlock {
            id: Uuid::new_v4(),
            commitment_id: commitment.id,
            google_event_id: String::new(),
            calendar_id: LOCAL_CALENDAR_ID.to_string(),
            start,
            end: start + Duration::minutes(minutes),
            status: BlockStatus::Planned,
            last_synced_at: start,
        }
    }

    #[test]
    fn alignment_is_zero_without_scheduled_minutes() {
        let stats = review_stats(&[], &[], &[], &[]);
        assert_eq!(stats.total_minutes, 0);
        assert_eq!(stats.alignment_score, 0.0);
    }

    #[test]
    fn alignment_counts_pinned_share() {
        let pinned = StrategicPriority::new("Business");
        let mut backlog = StrategicPriority::new("Home");
        backlog.is_pinned = false;
        let work = Commitment::from_capture(Uuid::new_v4(), "Report", pinned.id);
        let chores = Commitment::from_capture(Uuid::new_v4(), "Dishes", backlog.id);
        let blocks = vec![block_for(&chores, 30), block_for(&work, 90)];
        let priorities = vec![backlog, pinned];

        let stats = review_stats(&priorities, &[], &[work, chores], &blocks);
        assert_eq!(stats.total_minutes, 120);
        assert_eq!(stats.alignment_score, 75.0);
        let names: Vec<&str> = stats.by_priority.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Business", "Home"]);
    }

    #[test]
    fn minutes_without_a_live_priority_stay_out_of_the_total() {
        let pinned = StrategicPriority::new("Business");
        let work = Commitment::from_capture(Uuid::new_v4(), "Report", pinned.id);
        let stale = Commitment::from_capture(Uuid::new_v4(), "Old plan", Uuid::new_v4());
        let orphan = Commitment::from_capture(Uuid::new_v4(), "Gone", pinned.id);
        let blocks = vec![
            block_for(&work, 30),
            block_for(&stale, 30),
            block_for(&orphan, 45),
        ];

        let stats = review_stats(&[pinned], &[], &[work, stale], &blocks);
        assert_eq!(stats.scheduled, 3);
        assert_eq!(stats.total_minutes, 30);
        assert_eq!(stats.alignment_score, 100.0);
    }

    #[test]
    fn integrity_report_flags_broken_references() {
        let priority = StrategicPriority::new("Health");
        let ok = Commitment::from_capture(Uuid::new_v4(), "Gym", priority.id);
        let dangling = Commitment::from_capture(Uuid::new_v4(), "Lost", Uuid::new_v4());
        let gone = Commitment::from_capture(Uuid::new_v4(), "Gone", priority.id);
        let blocks = vec![block_for(&ok, 30), block_for(&ok, 30), block_for(&gone, 15)];

        let report = integrity_report(&[priority], &[ok.clone(), dangling.clone()], &blocks);
        assert_eq!(report.dangling_priority_refs, vec![dangling.id]);
        assert_eq!(report.duplicate_blocks.len(), 1);
        assert_eq!(report.duplicate_blocks[0].0, ok.id);
        assert_eq!(report.orphan_blocks, vec![blocks[2].id]);
        assert!(!report.is_clean());
    }
}
