//! Assisted triage contract.
//!
//! The transport to a language model lives outside core; this module owns
//! the request/response shapes and how suggestions map onto local state.

pub mod triage_assist;

pub use triage_assist::{
    match_priority, parse_suggestions, plan_triage, AssistDecision, AssistError,
    PlannedSuggestion, PriorityMatch, TriageAssistant, TriageOutcome, TriageRequest,
    TriageSuggestion,
};
