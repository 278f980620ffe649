use crate::errors::MergeError;
use crate::models::visit::Visit;
use chrono::Local;

/// Result of combining two visits: `kept` replaces the earlier row,
/// `absorbed_id` is deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub kept: Visit,
    pub absorbed_id: i64,
}

/// The selection must name exactly two distinct visits.
pub fn validate_selection(ids: &[i64]) -> Result<(i64, i64), MergeError> {
    let mut distinct: Vec<i64> = ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    match distinct.as_slice() {
        [a, b] => Ok((*a, *b)),
        other => Err(MergeError::WrongSelection(other.len())),
    }
}

fn merge_notes(first: Option<&str>, second: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [first, second].into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Combine two visits at the same place. The result is independent of the
/// order the visits were selected in.
pub fn plan_merge(a: Visit, b: Visit) -> Result<MergePlan, MergeError> {
    if a.place_id != b.place_id {
        return Err(MergeError::DifferentPlaces);
    }

    let (first, second) = if (a.entry, a.id) <= (b.entry, b.id) {
        (a, b)
    } else {
        (b, a)
    };

    let exit = match (first.exit, second.exit) {
        (Some(x), Some(y)) => Some(x.max(y)),
        _ => None,
    };

    let notes = merge_notes(first.notes_text(), second.notes_text());

    let kept = Visit {
        exit,
        notes,
        updated_at: Local::now().to_rfc3339(),
        ..first
    };

    Ok(MergePlan {
        kept,
        absorbed_id: second.id,
    })
}
