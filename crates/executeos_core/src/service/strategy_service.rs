//! Strategy use-cases: CRUD, pinning and ranking of priorities.
//!
//! # Invariants
//! - Priority names are unique after normalization (trim, case-fold,
//!   whitespace collapse) so name-based joins stay unambiguous.
//! - List order is the user's rank order and is persisted as-is.

use crate::model::priority::{PriorityId, StrategicPriority};
use crate::service::error::{WorkflowError, WorkflowResult};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Built-in starter priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioritySuggestion {
    pub name: &'static str,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

pub const PRIORITY_SUGGESTIONS: &[PrioritySuggestion] = &[
    PrioritySuggestion {
        name: "Health",
        description: "Physical and mental well-being activities.",
        examples: &["Go to gym", "Therapy session", "Meal prep"],
    },
    PrioritySuggestion {
        name: "Relationship",
        description: "Time spent with partner or dating.",
        examples: &["Date night", "Deep conversation"],
    },
    PrioritySuggestion {
        name: "Family",
        description: "Activities involving immediate and extended family.",
        examples: &["Call parents", "Play with kids"],
    },
    PrioritySuggestion {
        name: "Business",
        description: "Professional work, career growth, and side projects.",
        examples: &["Finish report", "Client meeting"],
    },
    PrioritySuggestion {
        name: "Money",
        description: "Financial planning, budgeting, and bills.",
        examples: &["Review budget", "Invest savings"],
    },
    PrioritySuggestion {
        name: "Home",
        description: "Household maintenance and chores.",
        examples: &["Clean kitchen", "Home repairs"],
    },
    PrioritySuggestion {
        name: "Growth",
        description: "Learning new skills and personal development.",
        examples: &["Read 30 mins", "Online course"],
    },
];

impl PrioritySuggestion {
    pub fn to_priority(self) -> StrategicPriority {
        let mut priority = StrategicPriority::new(self.name).with_description(self.description);
        priority.examples = self.examples.iter().map(|e| (*e).to_string()).collect();
        priority
    }
}

/// Reorder direction for single-step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    Up,
    Down,
}

/// Case-folded, whitespace-collapsed form used for name comparisons.
pub fn normalize_priority_name(name: &str) -> String {
    WHITESPACE_RE
        .replace_all(name.trim(), " ")
        .to_lowercase()
}

fn position(priorities: &[StrategicPriority], id: PriorityId) -> WorkflowResult<usize> {
    priorities
        .iter()
        .position(|p| p.id == id)
        .ok_or(WorkflowError::PriorityNotFound(id))
}

fn ensure_unique_name(
    priorities: &[StrategicPriority],
    name: &str,
    except: Option<PriorityId>,
) -> WorkflowResult<()> {
    let normalized = normalize_priority_name(name);
    if normalized.is_empty() {
        return Err(WorkflowError::InvalidPriorityName);
    }
    let clash = priorities
        .iter()
        .filter(|p| Some(p.id) != except)
        .any(|p| normalize_priority_name(&p.name) == normalized);
    if clash {
        return Err(WorkflowError::DuplicatePriorityName(name.trim().to_string()));
    }
    Ok(())
}

/// Appends a new pinned priority and returns its id.
pub fn add_priority(
    priorities: &mut Vec<StrategicPriority>,
    name: &str,
    description: Option<&str>,
) -> WorkflowResult<PriorityId> {
    ensure_unique_name(priorities, name, None)?;
    let priority =
        StrategicPriority::new(name).with_description(description.unwrap_or_default());
    let id = priority.id;
    priorities.push(priority);
    Ok(id)
}

/// Appends every built-in suggestion whose name is not taken yet.
///
/// Returns the number of priorities added.
pub fn seed_suggestions(priorities: &mut Vec<StrategicPriority>) -> usize {
    let mut added = 0;
    for suggestion in PRIORITY_SUGGESTIONS {
        if ensure_unique_name(priorities, suggestion.name, None).is_ok() {
            priorities.push(suggestion.to_priority());
            added += 1;
        }
    }
    added
}

/// Replaces name and (when given) description.
pub fn edit_priority(
    priorities: &mut [StrategicPriority],
    id: PriorityId,
    name: &str,
    description: Option<&str>,
) -> WorkflowResult<()> {
    let index = position(priorities, id)?;
    ensure_unique_name(priorities, name, Some(id))?;
    let priority = &mut priorities[index];
    priority.name = name.trim().to_string();
    if let Some(description) = description {
        priority.description = description.to_string();
    }
    Ok(())
}

/// Removes a priority. Commitments filed under it keep the dangling id.
pub fn remove_priority(
    priorities: &mut Vec<StrategicPriority>,
    id: PriorityId,
) -> WorkflowResult<StrategicPriority> {
    let index = position(priorities, id)?;
    Ok(priorities.remove(index))
}

/// Flips the pinned flag and returns the new value.
pub fn toggle_pin(priorities: &mut [StrategicPriority], id: PriorityId) -> WorkflowResult<bool> {
    let index = position(priorities, id)?;
    let priority = &mut priorities[index];
    priority.is_pinned = !priority.is_pinned;
    Ok(priority.is_pinned)
}

pub fn set_pinned(
    priorities: &mut [StrategicPriority],
    id: PriorityId,
    pinned: bool,
) -> WorkflowResult<()> {
    let index = position(priorities, id)?;
    priorities[index].is_pinned = pinned;
    Ok(())
}

/// Moves a priority to `to_index`, shifting the others.
pub fn move_priority(
    priorities: &mut Vec<StrategicPriority>,
    id: PriorityId,
    to_index: usize,
) -> WorkflowResult<()> {
    let from = position(priorities, id)?;
    if to_index >= priorities.len() {
        return Err(WorkflowError::IndexOutOfRange {
            index: to_index,
            len: priorities.len(),
        });
    }
    let priority = priorities.remove(from);
    priorities.insert(to_index, priority);
    Ok(())
}

/// Swaps with the neighbour. Moving past either end is a no-op.
pub fn step_priority(
    priorities: &mut [StrategicPriority],
    id: PriorityId,
    direction: RankDirection,
) -> WorkflowResult<()> {
    let index = position(priorities, id)?;
    let target = match direction {
        RankDirection::Up => index.checked_sub(1),
        RankDirection::Down => Some(index + 1).filter(|t| *t < priorities.len()),
    };
    if let Some(target) = target {
        priorities.swap(index, target);
    }
    Ok(())
}

/// Splits into (active focus, backlog), preserving rank order.
pub fn partition_pinned(
    priorities: &[StrategicPriority],
) -> (Vec<&StrategicPriority>, Vec<&StrategicPriority>) {
    priorities.iter().partition(|p| p.is_pinned)
}

/// Pinned priorities first, each group in rank order.
pub fn rank_order(priorities: &[StrategicPriority]) -> Vec<&StrategicPriority> {
    let (mut pinned, backlog) = partition_pinned(priorities);
    pinned.extend(backlog);
    pinned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(priorities: &[StrategicPriority]) -> Vec<&str> {
        priorities.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn add_rejects_blank_and_duplicate_names() {
        let mut priorities = Vec::new();
        add_priority(&mut priorities, "Deep Work", None).expect("first add");
        assert!(matches!(
            add_priority(&mut priorities, "  ", None),
            Err(WorkflowError::InvalidPriorityName)
        ));
        assert!(matches!(
            add_priority(&mut priorities, "deep   work", None),
            Err(WorkflowError::DuplicatePriorityName(_))
        ));
    }

    #[test]
    fn edit_keeps_own_name_and_description_when_absent() {
        let mut priorities = Vec::new();
        let id = add_priority(&mut priorities, "Home", Some("Chores")).expect("add");
        edit_priority(&mut priorities, id, "HOME", None).expect("rename to same normalized name");
        assert_eq!(priorities[0].name, "HOME");
        assert_eq!(priorities[0].description, "Chores");
    }

    #[test]
    fn seed_skips_existing_names() {
        let mut priorities = Vec::new();
        add_priority(&mut priorities, "health", None).expect("add");
        let added = seed_suggestions(&mut priorities);
        assert_eq!(added, PRIORITY_SUGGESTIONS.len() - 1);
        assert_eq!(priorities.len(), PRIORITY_SUGGESTIONS.len());
    }

    #[test]
    fn move_and_step_reorder() {
        let mut priorities = Vec::new();
        let a = add_priority(&mut priorities, "A", None).expect("add a");
        add_priority(&mut priorities, "B", None).expect("add b");
        let c = add_priority(&mut priorities, "C", None).expect("add c");

        move_priority(&mut priorities, c, 0).expect("move c to top");
        assert_eq!(names(&priorities), ["C", "A", "B"]);

        step_priority(&mut priorities, a, RankDirection::Down).expect("step a down");
        assert_eq!(names(&priorities), ["C", "B", "A"]);

        step_priority(&mut priorities, c, RankDirection::Up).expect("no-op at top");
        assert_eq!(names(&priorities), ["C", "B", "A"]);

        let err = move_priority(&mut priorities, a, 3).expect_err("index out of range");
        assert!(matches!(err, WorkflowError::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn rank_order_puts_pinned_first() {
        let mut priorities = Vec::new();
        let a = add_priority(&mut priorities, "A", None).expect("add a");
        add_priority(&mut priorities, "B", None).expect("add b");
        toggle_pin(&mut priorities, a).expect("unpin a");
        let ranked: Vec<&str> = rank_order(&priorities).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(ranked, ["B", "A"]);
    }
}
