//! Workflow error shared by every use-case operation.

use crate::assist::AssistError;
use crate::model::block::BlockId;
use crate::model::capture::{CaptureItemId, ItemStatus};
use crate::model::commitment::CommitmentId;
use crate::model::priority::PriorityId;
use crate::repo::collection_repo::RepoError;
use crate::sync::SyncError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug)]
pub enum WorkflowError {
    /// Priority name is blank after trim.
    InvalidPriorityName,
    /// Another priority already uses the same normalized name.
    DuplicatePriorityName(String),
    PriorityNotFound(PriorityId),
    CaptureItemNotFound(CaptureItemId),
    CommitmentNotFound(CommitmentId),
    BlockNotFound(BlockId),
    /// Dump contained no non-blank lines.
    EmptyDump,
    /// Requested status change is not an allowed edge.
    InvalidTransition {
        item_id: CaptureItemId,
        from: ItemStatus,
        to: ItemStatus,
    },
    /// Duration must be a positive number of minutes.
    InvalidDuration(CommitmentId),
    /// Finish is blocked while these commitments lack a positive duration.
    DurationsMissing(Vec<CommitmentId>),
    /// Commitment already has a block on the grid.
    AlreadyScheduled {
        commitment_id: CommitmentId,
        block_id: BlockId,
    },
    /// Hour/minute pair does not address a grid slot.
    InvalidSlot { hour: u32, minute: u32 },
    /// Wall-clock time does not exist in the local zone (DST gap).
    NonexistentLocalTime {
        date: NaiveDate,
        hour: u32,
        minute: u32,
    },
    /// Block deletion was requested without confirmation.
    DeleteNotConfirmed(BlockId),
    /// Reorder target is outside the list.
    IndexOutOfRange { index: usize, len: usize },
    /// Operation needs a connected calendar provider.
    ProviderRequired(&'static str),
    Sync(SyncError),
    Assist(AssistError),
    Repo(RepoError),
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPriorityName => write!(f, "priority name must not be blank"),
            Self::DuplicatePriorityName(name) => {
                write!(f, "a priority named `{name}` already exists")
            }
            Self::PriorityNotFound(id) => write!(f, "priority not found: {id}"),
            Self::CaptureItemNotFound(id) => write!(f, "capture item not found: {id}"),
            Self::CommitmentNotFound(id) => write!(f, "commitment not found: {id}"),
            Self::BlockNotFound(id) => write!(f, "calendar block not found: {id}"),
            Self::EmptyDump => write!(f, "brain dump contains no items"),
            Self::InvalidTransition { item_id, from, to } => write!(
                f,
                "capture item {item_id} cannot move from `{}` to `{}`",
                from.as_str(),
                to.as_str()
            ),
            Self::InvalidDuration(id) => {
                write!(f, "commitment {id}: duration must be a positive number of minutes")
            }
            Self::DurationsMissing(ids) => {
                write!(f, "{} commitment(s) still need a duration", ids.len())
            }
            Self::AlreadyScheduled {
                commitment_id,
                block_id,
            } => write!(
                f,
                "commitment {commitment_id} is already scheduled as block {block_id}"
            ),
            Self::InvalidSlot { hour, minute } => {
                write!(f, "invalid grid slot {hour:02}:{minute:02}")
            }
            Self::NonexistentLocalTime { date, hour, minute } => write!(
                f,
                "local time {date} {hour:02}:{minute:02} does not exist in this time zone"
            ),
            Self::DeleteNotConfirmed(id) => {
                write!(f, "removing block {id} from the schedule requires confirmation")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} item(s)")
            }
            Self::ProviderRequired(operation) => {
                write!(f, "{operation} requires a connected calendar provider")
            }
            Self::Sync(err) => write!(f, "{err}"),
            Self::Assist(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sync(err) => Some(err),
            Self::Assist(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WorkflowError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SyncError> for WorkflowError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<AssistError> for WorkflowError {
    fn from(value: AssistError) -> Self {
        Self::Assist(value)
    }
}
