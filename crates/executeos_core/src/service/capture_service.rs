//! Brain dump capture.

use crate::model::capture::CaptureItem;
use crate::service::error::{WorkflowError, WorkflowResult};
use chrono::{DateTime, Utc};

/// Splits a free-text dump into one entry per non-blank line.
pub fn split_dump(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Creates `inbox` items for every non-blank line, all stamped `now`.
///
/// Fails with `EmptyDump` when nothing remains after dropping blank lines.
pub fn capture_lines<S: AsRef<str>>(
    lines: &[S],
    now: DateTime<Utc>,
) -> WorkflowResult<Vec<CaptureItem>> {
    let items: Vec<CaptureItem> = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !line.is_empty())
        .map(|line| CaptureItem::new(line, now))
        .collect();
    if items.is_empty() {
        return Err(WorkflowError::EmptyDump);
    }
    Ok(items)
}
