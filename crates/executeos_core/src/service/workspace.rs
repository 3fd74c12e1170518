//! Application-state controller for one planning cycle.
//!
//! # Responsibility
//! - Own the four working collections and route every mutation through the
//!   per-step service functions.
//! - Write the touched collections back after each successful mutation.
//!
//! # Invariants
//! - A failed operation leaves memory and storage unchanged: mutations run on
//!   copies that replace the live state only after the write succeeds.
//! - Remote calendar failures abort the local mutation.

use crate::assist::{
    plan_triage, AssistDecision, TriageAssistant, TriageOutcome, TriageRequest, TriageSuggestion,
};
use crate::model::block::{
    BlockId, BlockStatus, CalendarBlock, PRIMARY_CALENDAR_ID, TASKS_CALENDAR_ID,
};
use crate::model::capture::{CaptureItem, CaptureItemId, ItemStatus};
use crate::model::commitment::{Commitment, CommitmentId};
use crate::model::priority::{PriorityId, StrategicPriority};
use crate::model::session::ExecutionSession;
use crate::repo::collection_repo::CollectionRepository;
use crate::service::error::{WorkflowError, WorkflowResult};
use crate::service::plan_service::{self, BlockPlacement};
use crate::service::review_service::{self, IntegrityReport, ReviewStats};
use crate::service::strategy_service::{self, RankDirection};
use crate::service::triage_service::{self, TriageEffect, TriageTarget};
use crate::service::{capture_service, duration_service, execution_service};
use crate::sync::{ProviderRegistry, RemoteEventDraft, SyncError, SyncStage, TaskDraft};
use chrono::{DateTime, Utc};
use log::{info, warn};

const ASSIST_DISCARD_REASON: &str = "Marked as noise during assisted triage.";
const TRIAGE_PRIORITY_DESCRIPTION: &str = "Added during triage session.";
const DEFAULT_EVENT_DESCRIPTION: &str = "Managed by ExecuteOS";
const FALLBACK_EVENT_SUMMARY: &str = "ExecuteOS block";

/// Live state of the brain dump → triage → schedule → execute cycle.
pub struct Workspace<R: CollectionRepository> {
    repo: R,
    priorities: Vec<StrategicPriority>,
    items: Vec<CaptureItem>,
    commitments: Vec<Commitment>,
    blocks: Vec<CalendarBlock>,
}

/// Copy of the three working buffers used for all-or-nothing updates.
struct Buffers {
    items: Vec<CaptureItem>,
    commitments: Vec<Commitment>,
    blocks: Vec<CalendarBlock>,
}

impl<R: CollectionRepository> Workspace<R> {
    /// Reads every collection from `repo`.
    pub fn load(repo: R) -> WorkflowResult<Self> {
        let workspace = Self {
            priorities: repo.load_priorities()?,
            items: repo.load_capture_items()?,
            commitments: repo.load_commitments()?,
            blocks: repo.load_calendar_blocks()?,
            repo,
        };
        info!(
            "event=workspace_load module=service status=ok priorities={} items={} commitments={} blocks={}",
            workspace.priorities.len(),
            workspace.items.len(),
            workspace.commitments.len(),
            workspace.blocks.len()
        );
        Ok(workspace)
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn priorities(&self) -> &[StrategicPriority] {
        &self.priorities
    }

    pub fn items(&self) -> &[CaptureItem] {
        &self.items
    }

    pub fn commitments(&self) -> &[Commitment] {
        &self.commitments
    }

    pub fn blocks(&self) -> &[CalendarBlock] {
        &self.blocks
    }

    pub fn commitment(&self, id: CommitmentId) -> Option<&Commitment> {
        self.commitments.iter().find(|c| c.id == id)
    }

    pub fn block(&self, id: BlockId) -> Option<&CalendarBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    // Strategy

    pub fn add_priority(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> WorkflowResult<PriorityId> {
        let id = self.update_priorities(|p| strategy_service::add_priority(p, name, description))?;
        info!("event=priority_add module=service status=ok priority_id={id}");
        Ok(id)
    }

    pub fn seed_priorities(&mut self) -> WorkflowResult<usize> {
        self.update_priorities(|p| Ok(strategy_service::seed_suggestions(p)))
    }

    pub fn edit_priority(
        &mut self,
        id: PriorityId,
        name: &str,
        description: Option<&str>,
    ) -> WorkflowResult<()> {
        self.update_priorities(|p| strategy_service::edit_priority(p, id, name, description))
    }

    /// Commitments already filed under the priority keep the dangling id and
    /// show up in [`Workspace::integrity_report`].
    pub fn remove_priority(&mut self, id: PriorityId) -> WorkflowResult<StrategicPriority> {
        let removed = self.update_priorities(|p| strategy_service::remove_priority(p, id))?;
        info!("event=priority_remove module=service status=ok priority_id={id}");
        Ok(removed)
    }

    pub fn toggle_pin(&mut self, id: PriorityId) -> WorkflowResult<bool> {
        self.update_priorities(|p| strategy_service::toggle_pin(p, id))
    }

    pub fn set_pinned(&mut self, id: PriorityId, pinned: bool) -> WorkflowResult<()> {
        self.update_priorities(|p| strategy_service::set_pinned(p, id, pinned))
    }

    pub fn move_priority(&mut self, id: PriorityId, to_index: usize) -> WorkflowResult<()> {
        self.update_priorities(|p| strategy_service::move_priority(p, id, to_index))
    }

    pub fn step_priority(&mut self, id: PriorityId, direction: RankDirection) -> WorkflowResult<()> {
        self.update_priorities(|p| strategy_service::step_priority(p, id, direction))
    }

    // Capture

    /// Appends one inbox item per non-blank line of `text`.
    pub fn capture_dump(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Vec<CaptureItemId>> {
        let captured = capture_service::capture_lines(&capture_service::split_dump(text), now)?;
        let ids: Vec<CaptureItemId> = captured.iter().map(|item| item.id).collect();
        self.update_buffers(|buffers| {
            buffers.items.extend(captured);
            Ok(())
        })?;
        info!(
            "event=capture_dump module=service status=ok count={}",
            ids.len()
        );
        Ok(ids)
    }

    // Triage

    pub fn inbox(&self) -> Vec<&CaptureItem> {
        triage_service::inbox(&self.items)
    }

    pub fn triage(
        &mut self,
        item_id: CaptureItemId,
        target: TriageTarget,
    ) -> WorkflowResult<TriageEffect> {
        let priorities = &self.priorities;
        let repo = &self.repo;
        let effect = update_buffers_in(
            repo,
            &mut self.items,
            &mut self.commitments,
            &mut self.blocks,
            |buffers| {
                triage_service::triage_item(
                    &mut buffers.items,
                    &mut buffers.commitments,
                    priorities,
                    item_id,
                    target,
                    None,
                )
            },
        )?;
        info!("event=triage_item module=service status=ok item_id={item_id} effect={effect:?}");
        Ok(effect)
    }

    /// Creates a priority on the spot and files the item under it.
    ///
    /// Runs as two mutations: the priority stays even if filing fails.
    pub fn triage_to_new_priority(
        &mut self,
        item_id: CaptureItemId,
        name: &str,
    ) -> WorkflowResult<(PriorityId, TriageEffect)> {
        if !self.items.iter().any(|i| i.id == item_id) {
            return Err(WorkflowError::CaptureItemNotFound(item_id));
        }
        let priority_id = self.add_priority(name, Some(TRIAGE_PRIORITY_DESCRIPTION))?;
        let effect = self.triage(item_id, TriageTarget::Priority(priority_id))?;
        Ok((priority_id, effect))
    }

    /// Asks `assistant` for suggestions and applies them.
    ///
    /// Assistant failures change nothing; the caller falls back to manual
    /// triage.
    pub fn assist_triage(
        &mut self,
        assistant: &dyn TriageAssistant,
    ) -> WorkflowResult<TriageOutcome> {
        let request = TriageRequest::from_state(&self.items, &self.priorities);
        if request.items.is_empty() {
            return Ok(TriageOutcome::default());
        }
        let suggestions = assistant.suggest(&request).map_err(|err| {
            warn!("event=assist_triage module=service status=error error={err}");
            WorkflowError::from(err)
        })?;
        self.apply_suggestions(suggestions)
    }

    /// Applies parsed suggestions in one all-or-nothing write.
    pub fn apply_suggestions(
        &mut self,
        suggestions: Vec<TriageSuggestion>,
    ) -> WorkflowResult<TriageOutcome> {
        let outcome = plan_triage(&self.items, &self.priorities, suggestions);
        let priorities = &self.priorities;
        update_buffers_in(
            &self.repo,
            &mut self.items,
            &mut self.commitments,
            &mut self.blocks,
            |buffers| {
                for planned in &outcome.planned {
                    let (target, commitment) = match &planned.decision {
                        AssistDecision::Keep {
                            commitment,
                            matched,
                        } => match matched.priority_id() {
                            Some(id) => (TriageTarget::Priority(id), Some(commitment.clone())),
                            None => continue,
                        },
                        AssistDecision::Discard => (TriageTarget::Discard, None),
                    };
                    let suggested_type = commitment.as_ref().map(|c| c.kind);
                    triage_service::triage_item(
                        &mut buffers.items,
                        &mut buffers.commitments,
                        priorities,
                        planned.item_id,
                        target,
                        commitment,
                    )?;
                    if let Some(item) = buffers.items.iter_mut().find(|i| i.id == planned.item_id) {
                        item.suggested_type = suggested_type;
                        match target {
                            TriageTarget::Priority(id) => item.suggested_priority_id = Some(id),
                            TriageTarget::Discard => {
                                item.discard_suggestion_reason =
                                    Some(ASSIST_DISCARD_REASON.to_string())
                            }
                        }
                    }
                }
                Ok(())
            },
        )?;
        info!(
            "event=assist_apply module=service status=ok applied={} fallback={} unmatched={} unclaimed={}",
            outcome.planned.len(),
            outcome.fallback_count(),
            outcome.unmatched_items.len(),
            outcome.unclaimed.len()
        );
        Ok(outcome)
    }

    // Duration

    pub fn set_duration(&mut self, id: CommitmentId, minutes: u32) -> WorkflowResult<()> {
        self.update_buffers(|buffers| {
            duration_service::set_duration(&mut buffers.commitments, id, minutes)
        })
    }

    /// Gate for moving on to planning.
    pub fn finish_durations(&self) -> WorkflowResult<()> {
        duration_service::ensure_ready(&self.commitments)
    }

    // Plan

    pub fn unscheduled(&self) -> Vec<&Commitment> {
        plan_service::unscheduled(&self.commitments, &self.blocks)
    }

    /// Places a commitment at `start`.
    ///
    /// With a connected provider the remote event is created first on the
    /// primary calendar; otherwise the block stays local.
    pub fn schedule_commitment(
        &mut self,
        commitment_id: CommitmentId,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        sync: Option<&ProviderRegistry>,
    ) -> WorkflowResult<BlockId> {
        let commitment = self
            .commitment(commitment_id)
            .ok_or(WorkflowError::CommitmentNotFound(commitment_id))?
            .clone();
        plan_service::ensure_not_scheduled(&self.blocks, commitment_id)?;
        let mut block = plan_service::new_block(&commitment, start, BlockPlacement::local(), now)?;

        let mode = match sync.and_then(ProviderRegistry::connected_provider) {
            Some(provider) => {
                let draft = event_draft(Some(&commitment), &block);
                let remote = provider
                    .create_event(PRIMARY_CALENDAR_ID, &draft)
                    .inspect_err(|err| {
                        warn!(
                            "event=block_schedule module=service status=error commitment_id={commitment_id} error={err}"
                        );
                    })?;
                block.calendar_id = remote.calendar_id;
                block.google_event_id = remote.event_id;
                "remote"
            }
            None => "local",
        };

        let block_id = block.id;
        let item_id = commitment.capture_item_id;
        self.update_buffers(|buffers| {
            buffers.blocks.push(block);
            advance_item(&mut buffers.items, item_id, ItemStatus::Scheduled);
            Ok(())
        })?;
        info!(
            "event=block_schedule module=service status=ok block_id={block_id} commitment_id={commitment_id} mode={mode}"
        );
        Ok(block_id)
    }

    /// Repositions a block, keeping its duration.
    ///
    /// Remote-backed blocks are updated remotely first when a provider is
    /// connected; without one only the local copy moves.
    pub fn move_block(
        &mut self,
        block_id: BlockId,
        new_start: DateTime<Utc>,
        now: DateTime<Utc>,
        sync: Option<&ProviderRegistry>,
    ) -> WorkflowResult<()> {
        let current = self
            .block(block_id)
            .ok_or(WorkflowError::BlockNotFound(block_id))?;
        let moved = plan_service::moved_block(current, new_start, now);

        if !moved.is_local() {
            match sync.and_then(ProviderRegistry::connected_provider) {
                Some(provider) => {
                    let draft = event_draft(self.commitment(moved.commitment_id), &moved);
                    provider.update_event(&moved.calendar_id, &moved.google_event_id, &draft)?;
                }
                None => warn!(
                    "event=block_move module=service status=remote_skipped block_id={block_id}"
                ),
            }
        }

        self.update_buffers(|buffers| {
            if let Some(slot) = buffers.blocks.iter_mut().find(|b| b.id == block_id) {
                *slot = moved;
            }
            Ok(())
        })?;
        info!("event=block_move module=service status=ok block_id={block_id}");
        Ok(())
    }

    /// Removes a block locally. Remote events are left untouched.
    pub fn delete_block(
        &mut self,
        block_id: BlockId,
        confirmed: bool,
    ) -> WorkflowResult<CalendarBlock> {
        if !confirmed {
            return Err(WorkflowError::DeleteNotConfirmed(block_id));
        }
        let removed = self.update_buffers(|buffers| {
            let index = buffers
                .blocks
                .iter()
                .position(|b| b.id == block_id)
                .ok_or(WorkflowError::BlockNotFound(block_id))?;
            Ok(buffers.blocks.remove(index))
        })?;
        info!("event=block_delete module=service status=ok block_id={block_id}");
        Ok(removed)
    }

    /// Hands the commitment to the provider's first task list and records a
    /// completed zero-length block in the `tasks` calendar.
    pub fn send_to_tasks(
        &mut self,
        commitment_id: CommitmentId,
        now: DateTime<Utc>,
        sync: &ProviderRegistry,
    ) -> WorkflowResult<BlockId> {
        let provider = sync
            .connected_provider()
            .ok_or(WorkflowError::ProviderRequired("send_to_tasks"))?;
        let commitment = self
            .commitment(commitment_id)
            .ok_or(WorkflowError::CommitmentNotFound(commitment_id))?
            .clone();
        plan_service::ensure_not_scheduled(&self.blocks, commitment_id)?;

        let list = provider.list_task_lists()?.into_iter().next().ok_or_else(|| {
            SyncError::new(
                provider.provider_id(),
                SyncStage::ListTaskLists,
                "no_task_list",
                "Provider has no task list to send to.",
                false,
            )
        })?;
        let task = provider.create_task(
            &list.id,
            &TaskDraft {
                title: commitment.title.clone(),
                notes: commitment.description.clone(),
                due: commitment.deadline,
            },
        )?;

        let block = plan_service::task_list_block(
            &commitment,
            BlockPlacement::remote(TASKS_CALENDAR_ID, task.task_id),
            now,
        );
        let block_id = block.id;
        let item_id = commitment.capture_item_id;
        self.update_buffers(|buffers| {
            buffers.blocks.push(block);
            advance_item(&mut buffers.items, item_id, ItemStatus::Scheduled);
            Ok(())
        })?;
        info!(
            "event=send_to_tasks module=service status=ok block_id={block_id} commitment_id={commitment_id}"
        );
        Ok(block_id)
    }

    // Execution

    pub fn current_block(&self, now: DateTime<Utc>) -> Option<&CalendarBlock> {
        execution_service::current_block(&self.blocks, now)
    }

    pub fn next_block(&self, now: DateTime<Utc>) -> Option<&CalendarBlock> {
        execution_service::next_block(&self.blocks, now)
    }

    pub fn progress_percent(&self) -> f64 {
        execution_service::progress_percent(&self.blocks)
    }

    /// Marks the block completed in storage. The source item becomes `done`
    /// once every block of its commitment is completed.
    pub fn complete_block(&mut self, block_id: BlockId, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.update_buffers(|buffers| {
            let block = buffers
                .blocks
                .iter_mut()
                .find(|b| b.id == block_id)
                .ok_or(WorkflowError::BlockNotFound(block_id))?;
            block.status = BlockStatus::Completed;
            block.last_synced_at = now;
            let commitment_id = block.commitment_id;

            let all_done = buffers
                .blocks
                .iter()
                .filter(|b| b.commitment_id == commitment_id)
                .all(CalendarBlock::is_completed);
            let item_id = buffers
                .commitments
                .iter()
                .find(|c| c.id == commitment_id)
                .map(|c| c.capture_item_id);
            if let (true, Some(item_id)) = (all_done, item_id) {
                advance_item(&mut buffers.items, item_id, ItemStatus::Done);
            }
            Ok(())
        })?;
        info!("event=block_complete module=service status=ok block_id={block_id}");
        Ok(())
    }

    // Review

    pub fn review_stats(&self) -> ReviewStats {
        review_service::review_stats(&self.priorities, &self.items, &self.commitments, &self.blocks)
    }

    pub fn integrity_report(&self) -> IntegrityReport {
        review_service::integrity_report(&self.priorities, &self.commitments, &self.blocks)
    }

    /// Archives the cycle with its alignment score and empties the buffers.
    pub fn finalize_session(&mut self, now: DateTime<Utc>) -> WorkflowResult<ExecutionSession> {
        let stats = self.review_stats();
        let session = review_service::build_session(
            &self.items,
            &self.commitments,
            &self.blocks,
            stats.alignment_score,
            now,
        );
        self.repo.save_session(&session)?;
        self.items.clear();
        self.commitments.clear();
        self.blocks.clear();
        info!(
            "event=session_finalize module=service status=ok session_id={} alignment_score={:.1}",
            session.id, session.alignment_score
        );
        Ok(session)
    }

    /// Past sessions, newest first.
    pub fn sessions(&self) -> WorkflowResult<Vec<ExecutionSession>> {
        Ok(self.repo.load_sessions()?)
    }

    /// Drops items, commitments and blocks; priorities and history stay.
    pub fn clear_current_buffers(&mut self) -> WorkflowResult<()> {
        self.repo.clear_current_buffers()?;
        self.items.clear();
        self.commitments.clear();
        self.blocks.clear();
        Ok(())
    }

    pub fn clear_all(&mut self) -> WorkflowResult<()> {
        self.repo.clear_all()?;
        self.priorities.clear();
        self.items.clear();
        self.commitments.clear();
        self.blocks.clear();
        warn!("event=workspace_clear_all module=service status=ok");
        Ok(())
    }

    fn update_priorities<T>(
        &mut self,
        mutate: impl FnOnce(&mut Vec<StrategicPriority>) -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        let mut next = self.priorities.clone();
        let out = mutate(&mut next)?;
        self.repo.save_priorities(&next)?;
        self.priorities = next;
        Ok(out)
    }

    fn update_buffers<T>(
        &mut self,
        mutate: impl FnOnce(&mut Buffers) -> WorkflowResult<T>,
    ) -> WorkflowResult<T> {
        update_buffers_in(
            &self.repo,
            &mut self.items,
            &mut self.commitments,
            &mut self.blocks,
            mutate,
        )
    }
}

/// Field-level variant of `update_buffers` so callers can keep borrowing
/// priorities inside the closure.
fn update_buffers_in<R: CollectionRepository, T>(
    repo: &R,
    items: &mut Vec<CaptureItem>,
    commitments: &mut Vec<Commitment>,
    blocks: &mut Vec<CalendarBlock>,
    mutate: impl FnOnce(&mut Buffers) -> WorkflowResult<T>,
) -> WorkflowResult<T> {
    let mut next = Buffers {
        items: items.clone(),
        commitments: commitments.clone(),
        blocks: blocks.clone(),
    };
    let out = mutate(&mut next)?;
    repo.save_buffers(&next.items, &next.commitments, &next.blocks)?;
    *items = next.items;
    *commitments = next.commitments;
    *blocks = next.blocks;
    Ok(out)
}

/// Moves an item forward when the edge is allowed; otherwise leaves it.
fn advance_item(items: &mut [CaptureItem], item_id: CaptureItemId, to: ItemStatus) {
    if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
        if item.status != to && item.status.can_transition_to(to) {
            item.status = to;
        }
    }
}

/// Remote event body for `block`; a block whose commitment is gone still
/// gets a readable summary.
fn event_draft(commitment: Option<&Commitment>, block: &CalendarBlock) -> RemoteEventDraft {
    let summary = commitment.map_or(FALLBACK_EVENT_SUMMARY, |c| c.title.as_str());
    let description = commitment
        .and_then(|c| c.description.as_deref())
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(DEFAULT_EVENT_DESCRIPTION);
    RemoteEventDraft::tagged(
        summary,
        Some(description.to_string()),
        block.start,
        block.end,
    )
}
