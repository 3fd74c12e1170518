//! Effort estimation before scheduling.

use crate::model::commitment::{Commitment, CommitmentId};
use crate::service::error::{WorkflowError, WorkflowResult};

/// Quick-pick durations in minutes.
pub const DURATION_PRESETS: [u32; 6] = [15, 30, 60, 90, 120, 180];

/// Parses free-form minute entry. Only positive integers are accepted.
pub fn parse_custom_minutes(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|minutes| *minutes > 0)
}

/// Short label such as `45m`, `1h` or `1h 30m`.
pub fn format_minutes(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

pub fn set_duration(
    commitments: &mut [Commitment],
    id: CommitmentId,
    minutes: u32,
) -> WorkflowResult<()> {
    if minutes == 0 {
        return Err(WorkflowError::InvalidDuration(id));
    }
    let commitment = commitments
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or(WorkflowError::CommitmentNotFound(id))?;
    commitment.duration_minutes = minutes;
    Ok(())
}

/// Ids of commitments that still block the finish action.
pub fn missing_durations(commitments: &[Commitment]) -> Vec<CommitmentId> {
    commitments
        .iter()
        .filter(|c| !c.has_positive_duration())
        .map(|c| c.id)
        .collect()
}

/// Gate for leaving the duration step.
pub fn ensure_ready(commitments: &[Commitment]) -> WorkflowResult<()> {
    let missing = missing_durations(commitments);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkflowError::DurationsMissing(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn custom_minutes_must_be_positive_integers() {
        assert_eq!(parse_custom_minutes(" 45 "), Some(45));
        assert_eq!(parse_custom_minutes("0"), None);
        assert_eq!(parse_custom_minutes("-15"), None);
        assert_eq!(parse_custom_minutes("1.5"), None);
        assert_eq!(parse_custom_minutes("soon"), None);
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_minutes(15), "15m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(90), "1h 30m");
    }

    #[test]
    fn finish_is_blocked_by_zero_duration() {
        let mut commitments = vec![
            Commitment::from_capture(Uuid::new_v4(), "a", Uuid::new_v4()),
            Commitment::from_capture(Uuid::new_v4(), "b", Uuid::new_v4()),
        ];
        commitments[1].duration_minutes = 0;
        let blocked = commitments[1].id;

        match ensure_ready(&commitments) {
            Err(WorkflowError::DurationsMissing(ids)) => assert_eq!(ids, vec![blocked]),
            other => panic!("expected DurationsMissing, got {other:?}"),
        }

        set_duration(&mut commitments, blocked, DURATION_PRESETS[3]).expect("set preset");
        assert!(ensure_ready(&commitments).is_ok());
        assert_eq!(commitments[1].duration_minutes, 90);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut commitments = vec![Commitment::from_capture(Uuid::new_v4(), "a", Uuid::new_v4())];
        let id = commitments[0].id;
        assert!(matches!(
            set_duration(&mut commitments, id, 0),
            Err(WorkflowError::InvalidDuration(_))
        ));
        assert_eq!(commitments[0].duration_minutes, 30);
    }
}
