//! Core domain logic for ExecuteOS.
//! This crate is the single source of truth for workflow invariants.

pub mod assist;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::block::{BlockId, BlockStatus, CalendarBlock};
pub use model::capture::{CaptureItem, CaptureItemId, ItemStatus};
pub use model::commitment::{Commitment, CommitmentId, CommitmentType, EnergyLevel};
pub use model::priority::{PriorityId, StrategicPriority};
pub use model::session::ExecutionSession;
pub use model::validation::ModelValidationError;
pub use repo::collection_repo::{
    CollectionKey, CollectionRepository, RepoError, RepoResult, SqliteCollectionRepository,
};
pub use service::{WorkflowError, WorkflowResult, Workspace};
