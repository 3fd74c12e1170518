//! Suggestion parsing and the priority matching policy.
//!
//! # Matching order
//! 1. explicit `priorityId` that exists
//! 2. exact name
//! 3. normalized name (trim, case-fold, whitespace collapse)
//! 4. first priority in rank order, reported as `Fallback`
//!
//! With no priorities at all the item is left in the inbox as `Unmatched`.

use crate::model::capture::{CaptureItem, CaptureItemId};
use crate::model::commitment::{
    Commitment, CommitmentType, EnergyLevel, DEFAULT_COMMITMENT_MINUTES,
};
use crate::model::priority::{PriorityId, StrategicPriority};
use crate::service::strategy_service::{normalize_priority_name, rank_order};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("valid code fence regex")
});

#[derive(Debug)]
pub enum AssistError {
    /// Assistant could not be reached or refused the request.
    Unavailable(String),
    /// Response body is not the expected JSON array.
    InvalidResponse(serde_json::Error),
}

impl Display for AssistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "triage assistant unavailable: {message}"),
            Self::InvalidResponse(err) => write!(f, "triage assistant response invalid: {err}"),
        }
    }
}

impl Error for AssistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::InvalidResponse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for AssistError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidResponse(value)
    }
}

/// Payload sent to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageRequest {
    pub items: Vec<String>,
    pub priority_names: Vec<String>,
    /// Parallel to `priority_names`.
    pub priority_ids: Vec<PriorityId>,
}

impl TriageRequest {
    /// Inbox texts plus priorities in rank order.
    pub fn from_state(items: &[CaptureItem], priorities: &[StrategicPriority]) -> Self {
        let ranked = rank_order(priorities);
        Self {
            items: items
                .iter()
                .filter(|item| item.is_inbox())
                .map(|item| item.raw_text.clone())
                .collect(),
            priority_names: ranked.iter().map(|p| p.name.clone()).collect(),
            priority_ids: ranked.iter().map(|p| p.id).collect(),
        }
    }
}

/// One element of the assistant's JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageSuggestion {
    pub raw_text: String,
    pub keep: bool,
    #[serde(default)]
    pub priority_name: String,
    /// Kept as text; a value that is not a known id only skips the id match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default)]
    pub energy: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TriageSuggestion {
    pub fn parsed_priority_id(&self) -> Option<PriorityId> {
        self.priority_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
    }

    pub fn commitment_type(&self) -> CommitmentType {
        CommitmentType::parse(&self.kind).unwrap_or(CommitmentType::Task)
    }

    pub fn energy_level(&self) -> EnergyLevel {
        EnergyLevel::parse(&self.energy).unwrap_or(EnergyLevel::Medium)
    }

    /// Rounded positive minutes, otherwise the 30-minute default.
    pub fn minutes(&self) -> u32 {
        let value = self.duration_minutes;
        if value.is_finite() && value >= 0.5 && value <= f64::from(u32::MAX) {
            value.round() as u32
        } else {
            DEFAULT_COMMITMENT_MINUTES
        }
    }

    fn commitment_for(&self, item_id: CaptureItemId, priority_id: PriorityId) -> Commitment {
        let title = match self.title.trim() {
            "" => self.raw_text.clone(),
            title => title.to_string(),
        };
        let mut commitment = Commitment::from_capture(item_id, title, priority_id);
        commitment.kind = self.commitment_type();
        commitment.energy = self.energy_level();
        commitment.duration_minutes = self.minutes();
        commitment.description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        commitment
    }
}

/// Remote or local model that proposes triage decisions.
pub trait TriageAssistant {
    fn suggest(&self, request: &TriageRequest) -> Result<Vec<TriageSuggestion>, AssistError>;
}

/// Parses a JSON array response, tolerating a surrounding code fence.
/// A blank response means "no suggestions".
pub fn parse_suggestions(text: &str) -> Result<Vec<TriageSuggestion>, AssistError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let body = CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());
    Ok(serde_json::from_str(body)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityMatch {
    ById(PriorityId),
    Exact(PriorityId),
    Normalized(PriorityId),
    /// No name matched; the first ranked priority was used.
    Fallback(PriorityId),
    Unmatched,
}

impl PriorityMatch {
    pub fn priority_id(self) -> Option<PriorityId> {
        match self {
            Self::ById(id) | Self::Exact(id) | Self::Normalized(id) | Self::Fallback(id) => {
                Some(id)
            }
            Self::Unmatched => None,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

pub fn match_priority(
    suggestion: &TriageSuggestion,
    priorities: &[StrategicPriority],
) -> PriorityMatch {
    if let Some(id) = suggestion.parsed_priority_id() {
        if priorities.iter().any(|p| p.id == id) {
            return PriorityMatch::ById(id);
        }
    }
    if let Some(p) = priorities.iter().find(|p| p.name == suggestion.priority_name) {
        return PriorityMatch::Exact(p.id);
    }
    let wanted = normalize_priority_name(&suggestion.priority_name);
    if !wanted.is_empty() {
        if let Some(p) = priorities
            .iter()
            .find(|p| normalize_priority_name(&p.name) == wanted)
        {
            return PriorityMatch::Normalized(p.id);
        }
    }
    match rank_order(priorities).first() {
        Some(p) => PriorityMatch::Fallback(p.id),
        None => PriorityMatch::Unmatched,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistDecision {
    Keep {
        commitment: Commitment,
        matched: PriorityMatch,
    },
    Discard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSuggestion {
    pub item_id: CaptureItemId,
    pub suggestion: TriageSuggestion,
    pub decision: AssistDecision,
}

/// How a batch of suggestions maps onto the inbox.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriageOutcome {
    pub planned: Vec<PlannedSuggestion>,
    /// Kept suggestions that found no priority; the item stays in the inbox.
    pub unmatched_items: Vec<CaptureItemId>,
    /// Suggestions whose raw text matched no unclaimed inbox item.
    pub unclaimed: Vec<String>,
}

impl TriageOutcome {
    pub fn fallback_count(&self) -> usize {
        self.planned
            .iter()
            .filter(|p| {
                matches!(&p.decision, AssistDecision::Keep { matched, .. } if matched.is_fallback())
            })
            .count()
    }
}

/// Joins suggestions to inbox items by exact raw text (first unclaimed item
/// wins) and resolves each kept suggestion to a priority.
pub fn plan_triage(
    items: &[CaptureItem],
    priorities: &[StrategicPriority],
    suggestions: Vec<TriageSuggestion>,
) -> TriageOutcome {
    let mut claimed: HashSet<CaptureItemId> = HashSet::new();
    let mut outcome = TriageOutcome::default();

    for suggestion in suggestions {
        let Some(item) = items
            .iter()
            .find(|i| i.is_inbox() && i.raw_text == suggestion.raw_text && !claimed.contains(&i.id))
        else {
            outcome.unclaimed.push(suggestion.raw_text);
            continue;
        };
        claimed.insert(item.id);

        let decision = if suggestion.keep {
            let matched = match_priority(&suggestion, priorities);
            match matched.priority_id() {
                Some(priority_id) => AssistDecision::Keep {
                    commitment: suggestion.commitment_for(item.id, priority_id),
                    matched,
                },
                None => {
                    outcome.unmatched_items.push(item.id);
                    continue;
                }
            }
        } else {
            AssistDecision::Discard
        };
        outcome.planned.push(PlannedSuggestion {
            item_id: item.id,
            suggestion,
            decision,
        });
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn suggestion_for(raw_text: &str, priority_name: &str) -> TriageSuggestion {
        TriageSuggestion {
            raw_text: raw_text.to_string(),
            keep: true,
            priority_name: priority_name.to_string(),
            priority_id: None,
            kind: "task".to_string(),
            duration_minutes: f64::from(DEFAULT_COMMITMENT_MINUTES),
            energy: "medium".to_string(),
            title: raw_text.to_string(),
            description: None,
        }
    }

    fn priorities() -> Vec<StrategicPriority> {
        let mut home = StrategicPriority::new("Home");
        home.is_pinned = false;
        vec![home, StrategicPriority::new("Business")]
    }

    #[test]
    fn parse_accepts_plain_and_fenced_arrays() {
        let body = r#"[{"rawText":"Buy milk","keep":true,"priorityName":"Home","type":"task","durationMinutes":15,"energy":"low","title":"Buy milk"}]"#;
        assert_eq!(parse_suggestions(body).expect("plain").len(), 1);
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(parse_suggestions(&fenced).expect("fenced").len(), 1);
        assert!(parse_suggestions("  ").expect("blank").is_empty());
        assert!(matches!(
            parse_suggestions("{not json"),
            Err(AssistError::InvalidResponse(_))
        ));
    }

    #[test]
    fn matching_follows_policy_order() {
        let priorities = priorities();
        let mut suggestion = suggestion_for("x", "Home");
        assert_eq!(
            match_priority(&suggestion, &priorities),
            PriorityMatch::Exact(priorities[0].id)
        );

        suggestion.priority_name = "  business ".to_string();
        assert_eq!(
            match_priority(&suggestion, &priorities),
            PriorityMatch::Normalized(priorities[1].id)
        );

        suggestion.priority_id = Some(priorities[0].id.to_string());
        assert_eq!(
            match_priority(&suggestion, &priorities),
            PriorityMatch::ById(priorities[0].id)
        );

        suggestion.priority_id = None;
        suggestion.priority_name = "None".to_string();
        // Business is pinned so it ranks first.
        assert_eq!(
            match_priority(&suggestion, &priorities),
            PriorityMatch::Fallback(priorities[1].id)
        );
        assert_eq!(match_priority(&suggestion, &[]), PriorityMatch::Unmatched);
    }

    #[test]
    fn unusable_priority_ids_fall_through_to_name_matching() {
        let body = r#"[
            {"rawText":"Buy milk","keep":true,"priorityId":"","priorityName":"Home"},
            {"rawText":"Call mom","keep":true,"priorityId":"none","priorityName":"business"},
            {"rawText":"Scroll feed","keep":false,"priorityId":null}
        ]"#;
        let suggestions = parse_suggestions(body).expect("ids are optional text");
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|s| s.parsed_priority_id().is_none()));

        let priorities = priorities();
        assert_eq!(
            match_priority(&suggestions[0], &priorities),
            PriorityMatch::Exact(priorities[0].id)
        );
        assert_eq!(
            match_priority(&suggestions[1], &priorities),
            PriorityMatch::Normalized(priorities[1].id)
        );
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let mut suggestion = suggestion_for("x", "Home");
        suggestion.kind = "chore".to_string();
        suggestion.energy = "extreme".to_string();
        suggestion.duration_minutes = -10.0;
        assert_eq!(suggestion.commitment_type(), CommitmentType::Task);
        assert_eq!(suggestion.energy_level(), EnergyLevel::Medium);
        assert_eq!(suggestion.minutes(), 30);
        suggestion.duration_minutes = f64::NAN;
        assert_eq!(suggestion.minutes(), 30);
    }

    #[test]
    fn plan_joins_by_raw_text_once_per_item() {
        let now = Utc::now();
        let items = vec![
            CaptureItem::new("Buy milk", now),
            CaptureItem::new("Buy milk", now),
            CaptureItem::new("Scroll feed", now),
        ];
        let mut noise = suggestion_for("Scroll feed", "");
        noise.keep = false;
        let suggestions = vec![
            suggestion_for("Buy milk", "Home"),
            suggestion_for("Buy milk", "Home"),
            suggestion_for("Buy milk", "Home"),
            noise,
        ];

        let outcome = plan_triage(&items, &priorities(), suggestions);
        assert_eq!(outcome.planned.len(), 3);
        assert_eq!(outcome.planned[0].item_id, items[0].id);
        assert_eq!(outcome.planned[1].item_id, items[1].id);
        assert_eq!(outcome.planned[2].decision, AssistDecision::Discard);
        assert_eq!(outcome.unclaimed, vec!["Buy milk".to_string()]);
    }

    #[test]
    fn plan_leaves_items_unmatched_without_priorities() {
        let items = vec![CaptureItem::new("Buy milk", Utc::now())];
        let outcome = plan_triage(&items, &[], vec![suggestion_for("Buy milk", "Home")]);
        assert!(outcome.planned.is_empty());
        assert_eq!(outcome.unmatched_items, vec![items[0].id]);
    }
}
