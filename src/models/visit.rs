use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Storage format of `entry_time` / `exit_time`. Lexical order equals
/// chronological order.
pub const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    pub id: i64,                   // ⇔ location_visits.id
    pub user_id: String,           // ⇔ location_visits.user_id
    pub place_id: i64,             // ⇔ location_visits.saved_place_id
    pub entry: NaiveDateTime,      // ⇔ location_visits.entry_time
    pub exit: Option<NaiveDateTime>, // ⇔ location_visits.exit_time (NULL while open)
    pub notes: Option<String>,     // ⇔ location_visits.visit_notes
    pub updated_at: String,        // ⇔ location_visits.updated_at (RFC 3339)
}

impl Visit {
    /// Build a new, not yet stored visit (`id = 0`).
    pub fn new(
        user_id: &str,
        place_id: i64,
        entry: NaiveDateTime,
        exit: Option<NaiveDateTime>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            place_id,
            entry,
            exit,
            notes: notes.filter(|n| !n.trim().is_empty()),
            updated_at: Local::now().to_rfc3339(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    /// Minutes between entry and exit, `None` while the visit is open.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.exit.map(|x| (x - self.entry).num_minutes())
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry.date()
    }

    /// Notes trimmed, `None` when empty.
    pub fn notes_text(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    pub fn entry_str(&self) -> String {
        self.entry.format(TIMESTAMP_FMT).to_string()
    }

    pub fn exit_str(&self) -> Option<String> {
        self.exit.map(|x| x.format(TIMESTAMP_FMT).to_string())
    }
}

/// The part of a visit that falls on one calendar day.
///
/// A visit crossing midnight yields one segment per day it touches.
/// `visit_id` always points at the stored row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitSegment {
    pub visit_id: i64,
    pub place_id: i64,
    pub place_name: String,
    pub day: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// true when the underlying visit has no exit yet
    pub open: bool,
    /// true when the segment starts or ends on a midnight cut
    pub continued: bool,
    pub notes: Option<String>,
}

impl VisitSegment {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}
