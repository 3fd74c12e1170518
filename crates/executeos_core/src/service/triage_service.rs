//! Triage: file each inbox item under a priority or discard it.
//!
//! # Invariants
//! - An item has a commitment once triaged and loses it only on discard.
//! - Re-filing a triaged item updates its commitment instead of adding one.
//! - Discarding removes every commitment keyed by the item.

use crate::model::capture::{CaptureItem, CaptureItemId, ItemStatus};
use crate::model::commitment::{Commitment, CommitmentId};
use crate::model::priority::{PriorityId, StrategicPriority};
use crate::service::error::{WorkflowError, WorkflowResult};

/// Where a triaged item goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageTarget {
    Priority(PriorityId),
    Discard,
}

/// Effect of one triage decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageEffect {
    Created(CommitmentId),
    Reassigned(CommitmentId),
    Discarded { removed_commitments: usize },
}

/// Applies `target` to the item, mutating both collections.
///
/// `commitment` overrides the default commitment created for a first-time
/// triage; its ids are rewritten to point at `item_id` and the target.
pub fn triage_item(
    items: &mut [CaptureItem],
    commitments: &mut Vec<Commitment>,
    priorities: &[StrategicPriority],
    item_id: CaptureItemId,
    target: TriageTarget,
    commitment: Option<Commitment>,
) -> WorkflowResult<TriageEffect> {
    let index = items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or(WorkflowError::CaptureItemNotFound(item_id))?;

    let next = match target {
        TriageTarget::Priority(_) => ItemStatus::Triaged,
        TriageTarget::Discard => ItemStatus::Discarded,
    };
    let current = items[index].status;
    if !current.can_transition_to(next) {
        return Err(WorkflowError::InvalidTransition {
            item_id,
            from: current,
            to: next,
        });
    }

    let effect = match target {
        TriageTarget::Priority(priority_id) => {
            if !priorities.iter().any(|p| p.id == priority_id) {
                return Err(WorkflowError::PriorityNotFound(priority_id));
            }
            match commitments.iter().position(|c| c.capture_item_id == item_id) {
                Some(existing) => {
                    commitments[existing].priority_id = priority_id;
                    TriageEffect::Reassigned(commitments[existing].id)
                }
                None => {
                    let mut created = commitment.unwrap_or_else(|| {
                        Commitment::from_capture(item_id, items[index].raw_text.clone(), priority_id)
                    });
                    created.capture_item_id = item_id;
                    created.priority_id = priority_id;
                    let id = created.id;
                    commitments.push(created);
                    TriageEffect::Created(id)
                }
            }
        }
        TriageTarget::Discard => {
            let before = commitments.len();
            commitments.retain(|c| c.capture_item_id != item_id);
            TriageEffect::Discarded {
                removed_commitments: before - commitments.len(),
            }
        }
    };

    items[index].status = next;
    Ok(effect)
}

pub fn inbox(items: &[CaptureItem]) -> Vec<&CaptureItem> {
    items.iter().filter(|i| i.is_inbox()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setup() -> (Vec<CaptureItem>, Vec<StrategicPriority>) {
        let now = Utc::now();
        let items = vec![
            CaptureItem::new("Buy milk", now),
            CaptureItem::new("Finish report", now),
        ];
        let priorities = vec![StrategicPriority::new("Business"), StrategicPriority::new("Home")];
        (items, priorities)
    }

    #[test]
    fn reassigning_updates_instead_of_duplicating() {
        let (mut items, priorities) = setup();
        let mut commitments = Vec::new();
        let item_id = items[1].id;

        let first = triage_item(
            &mut items,
            &mut commitments,
            &priorities,
            item_id,
            TriageTarget::Priority(priorities[0].id),
            None,
        )
        .expect("first triage");
        let second = triage_item(
            &mut items,
            &mut commitments,
            &priorities,
            item_id,
            TriageTarget::Priority(priorities[1].id),
            None,
        )
        .expect("reassign");

        let TriageEffect::Created(created_id) = first else {
            panic!("expected created effect, got {first:?}");
        };
        assert_eq!(second, TriageEffect::Reassigned(created_id));
        assert_eq!(commitments.len(), 1);
        assert_eq!(commitments[0].priority_id, priorities[1].id);
    }

    #[test]
    fn discarding_triaged_item_removes_commitment() {
        let (mut items, priorities) = setup();
        let mut commitments = Vec::new();
        let item_id = items[0].id;
        triage_item(
            &mut items,
            &mut commitments,
            &priorities,
            item_id,
            TriageTarget::Priority(priorities[0].id),
            None,
        )
        .expect("triage");

        let effect = triage_item(
            &mut items,
            &mut commitments,
            &priorities,
            item_id,
            TriageTarget::Discard,
            None,
        )
        .expect("discard");
        assert_eq!(effect, TriageEffect::Discarded { removed_commitments: 1 });
        assert!(commitments.is_empty());
        assert_eq!(items[0].status, ItemStatus::Discarded);
    }

    #[test]
    fn discarded_item_cannot_be_triaged_again() {
        let (mut items, priorities) = setup();
        let mut commitments = Vec::new();
        let item_id = items[0].id;
        triage_item(&mut items, &mut commitments, &priorities, item_id, TriageTarget::Discard, None)
            .expect("discard");

        let err = triage_item(
            &mut items,
            &mut commitments,
            &priorities,
            item_id,
            TriageTarget::Priority(priorities[0].id),
            None,
        )
        .expect_err("discarded is terminal");
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert!(commitments.is_empty());
    }

    #[test]
    fn unknown_priority_leaves_item_in_inbox() {
        let (mut items, priorities) = setup();
        let mut commitments = Vec::new();
        let item_id = items[0].id;
        let err = triage_item(
            &mut items,
            &mut commitments,
            &priorities,
            item_id,
            TriageTarget::Priority(uuid::Uuid::new_v4()),
            None,
        )
        .expect_err("unknown priority");
        assert!(matches!(err, WorkflowError::PriorityNotFound(_)));
        assert_eq!(items[0].status, ItemStatus::Inbox);
    }
}
