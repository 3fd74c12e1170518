//! Collection repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store each collection as one JSON array under a fixed key.
//! - Provide session archiving that clears the working buffers atomically.
//!
//! # Invariants
//! - A missing key reads as an empty collection.
//! - `save_*` replaces the whole collection (last write wins).
//! - `save_session` prepends the snapshot and clears items, commitments and
//!   blocks in one transaction.

use crate::db::DbError;
use crate::model::block::CalendarBlock;
use crate::model::capture::CaptureItem;
use crate::model::commitment::Commitment;
use crate::model::priority::StrategicPriority;
use crate::model::session::ExecutionSession;
use crate::model::validation::ModelValidationError;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage key of one persisted collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Priorities,
    CaptureItems,
    Commitments,
    CalendarBlocks,
    Sessions,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 5] = [
        Self::Priorities,
        Self::CaptureItems,
        Self::Commitments,
        Self::CalendarBlocks,
        Self::Sessions,
    ];

    /// Working buffers cleared when a session is finalized.
    pub const BUFFERS: [CollectionKey; 3] =
        [Self::CaptureItems, Self::Commitments, Self::CalendarBlocks];

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Priorities => "ps_priorities",
            Self::CaptureItems => "ps_capture_items",
            Self::Commitments => "ps_commitments",
            Self::CalendarBlocks => "ps_calendar_blocks",
            Self::Sessions => "ps_sessions",
        }
    }
}

/// Error for collection persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Stored payload is not a valid JSON array of the expected entity.
    InvalidData {
        key: &'static str,
        message: String,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData { key, message } => {
                write!(f, "invalid persisted data in `{key}`: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData { .. } => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface: one load/save pair per entity type.
pub trait CollectionRepository {
    fn load_priorities(&self) -> RepoResult<Vec<StrategicPriority>>;
    fn save_priorities(&self, priorities: &[StrategicPriority]) -> RepoResult<()>;
    fn load_capture_items(&self) -> RepoResult<Vec<CaptureItem>>;
    fn save_capture_items(&self, items: &[CaptureItem]) -> RepoResult<()>;
    fn load_commitments(&self) -> RepoResult<Vec<Commitment>>;
    fn save_commitments(&self, commitments: &[Commitment]) -> RepoResult<()>;
    fn load_calendar_blocks(&self) -> RepoResult<Vec<CalendarBlock>>;
    fn save_calendar_blocks(&self, blocks: &[CalendarBlock]) -> RepoResult<()>;
    /// Writes the three working buffers atomically.
    fn save_buffers(
        &self,
        items: &[CaptureItem],
        commitments: &[Commitment],
        blocks: &[CalendarBlock],
    ) -> RepoResult<()>;
    /// Sessions newest first.
    fn load_sessions(&self) -> RepoResult<Vec<ExecutionSession>>;
    /// Prepends `session` and clears the working buffers.
    fn save_session(&self, session: &ExecutionSession) -> RepoResult<()>;
    fn clear_current_buffers(&self) -> RepoResult<()>;
    /// Removes every collection including priorities and sessions.
    fn clear_all(&self) -> RepoResult<()>;
}

/// Entities that can be checked before write and after read.
trait Validated {
    fn check(&self) -> Result<(), ModelValidationError>;
}

macro_rules! impl_validated {
    ($($ty:ty),+) => {
        $(impl Validated for $ty {
            fn check(&self) -> Result<(), ModelValidationError> {
                self.validate()
            }
        })+
    };
}

impl_validated!(
    StrategicPriority,
    CaptureItem,
    Commitment,
    CalendarBlock,
    ExecutionSession
);

/// SQLite-backed collection repository.
pub struct SqliteCollectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCollectionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load<T: DeserializeOwned + Validated>(&self, key: CollectionKey) -> RepoResult<Vec<T>> {
        load_collection(self.conn, key)
    }

    fn save<T: Serialize + Validated>(&self, key: CollectionKey, values: &[T]) -> RepoResult<()> {
        save_collection(self.conn, key, values)
    }
}

impl CollectionRepository for SqliteCollectionRepository<'_> {
    fn load_priorities(&self) -> RepoResult<Vec<StrategicPriority>> {
        self.load(CollectionKey::Priorities)
    }

    fn save_priorities(&self, priorities: &[StrategicPriority]) -> RepoResult<()> {
        self.save(CollectionKey::Priorities, priorities)
    }

    fn load_capture_items(&self) -> RepoResult<Vec<CaptureItem>> {
        self.load(CollectionKey::CaptureItems)
    }

    fn save_capture_items(&self, items: &[CaptureItem]) -> RepoResult<()> {
        self.save(CollectionKey::CaptureItems, items)
    }

    fn load_commitments(&self) -> RepoResult<Vec<Commitment>> {
        self.load(CollectionKey::Commitments)
    }

    fn save_commitments(&self, commitments: &[Commitment]) -> RepoResult<()> {
        self.save(CollectionKey::Commitments, commitments)
    }

    fn load_calendar_blocks(&self) -> RepoResult<Vec<CalendarBlock>> {
        self.load(CollectionKey::CalendarBlocks)
    }

    fn save_calendar_blocks(&self, blocks: &[CalendarBlock]) -> RepoResult<()> {
        self.save(CollectionKey::CalendarBlocks, blocks)
    }

    fn save_buffers(
        &self,
        items: &[CaptureItem],
        commitments: &[Commitment],
        blocks: &[CalendarBlock],
    ) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        save_collection(&tx, CollectionKey::CaptureItems, items)?;
        save_collection(&tx, CollectionKey::Commitments, commitments)?;
        save_collection(&tx, CollectionKey::CalendarBlocks, blocks)?;
        tx.commit()?;
        Ok(())
    }

    fn load_sessions(&self) -> RepoResult<Vec<ExecutionSession>> {
        self.load(CollectionKey::Sessions)
    }

    fn save_session(&self, session: &ExecutionSession) -> RepoResult<()> {
        session.validate()?;
        let mut sessions: Vec<ExecutionSession> = self.load(CollectionKey::Sessions)?;
        sessions.insert(0, session.clone());

        let tx = self.conn.unchecked_transaction()?;
        save_collection(&tx, CollectionKey::Sessions, &sessions)?;
        for key in CollectionKey::BUFFERS {
            write_payload(&tx, key, "[]")?;
        }
        tx.commit()?;

        debug!(
            "event=session_saved module=repo status=ok session_id={} total_sessions={}",
            session.id,
            sessions.len()
        );
        Ok(())
    }

    fn clear_current_buffers(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for key in CollectionKey::BUFFERS {
            write_payload(&tx, key, "[]")?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_all(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM collections;", [])?;
        Ok(())
    }
}

fn load_collection<T: DeserializeOwned + Validated>(
    conn: &Connection,
    key: CollectionKey,
) -> RepoResult<Vec<T>> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM collections WHERE key = ?1;",
            [key.as_key()],
            |row| row.get(0),
        )
        .optional()?;

    let Some(payload) = payload else {
        return Ok(Vec::new());
    };

    let values: Vec<T> = serde_json::from_str(&payload).map_err(|err| {
        error!(
            "event=collection_load module=repo status=error key={} error_code=decode_failed error={err}",
            key.as_key()
        );
        RepoError::InvalidData {
            key: key.as_key(),
            message: err.to_string(),
        }
    })?;

    for value in &values {
        value.check()?;
    }
    Ok(values)
}

fn save_collection<T: Serialize + Validated>(
    conn: &Connection,
    key: CollectionKey,
    values: &[T],
) -> RepoResult<()> {
    for value in values {
        value.check()?;
    }
    let payload = serde_json::to_string(values).map_err(|err| RepoError::InvalidData {
        key: key.as_key(),
        message: err.to_string(),
    })?;
    write_payload(conn, key, &payload)?;
    debug!(
        "event=collection_save module=repo status=ok key={} count={}",
        key.as_key(),
        values.len()
    );
    Ok(())
}

fn write_payload(conn: &Connection, key: CollectionKey, payload: &str) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO collections (key, payload, updated_at)
         VALUES (?1, ?2, strftime('%s', 'now') * 1000)
         ON CONFLICT(key) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at;",
        params![key.as_key(), payload],
    )?;
    Ok(())
}
