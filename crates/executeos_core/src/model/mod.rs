//! Domain model for the capture → triage → schedule → execute cycle.
//!
//! # Responsibility
//! - Define the five persisted entity shapes and their JSON field names.
//! - Provide per-entity `validate()` used on every storage read and write.
//!
//! # Invariants
//! - Every entity is identified by a random UUID v4.
//! - Cross-entity references (`priority_id`, `commitment_id`) are plain ids;
//!   integrity is reported by review, not enforced by storage.

pub mod block;
pub mod capture;
pub mod commitment;
pub mod priority;
pub mod session;
pub mod validation;
