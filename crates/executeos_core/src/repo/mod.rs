//! Persistence contracts for the working collections and session history.
//!
//! # Responsibility
//! - Define per-entity `load`/`save` contracts (full-collection overwrite).
//! - Isolate SQL and JSON encoding from the workflow layer.
//!
//! # Invariants
//! - Writes validate every element before touching storage.
//! - Reads reject corrupt payloads instead of masking them.

pub mod collection_repo;
