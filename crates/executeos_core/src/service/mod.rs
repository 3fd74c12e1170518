//! Core use-case services.
//!
//! # Responsibility
//! - One module of pure functions per workflow step.
//! - `Workspace` ties them to persistence for front ends.

pub mod capture_service;
pub mod duration_service;
pub mod error;
pub mod execution_service;
pub mod plan_service;
pub mod review_service;
pub mod strategy_service;
pub mod triage_service;
pub mod workspace;

pub use error::{WorkflowError, WorkflowResult};
pub use workspace::Workspace;
