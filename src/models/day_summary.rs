use chrono::NaiveDate;
use serde::Serialize;

/// Row of `day_summaries`: the narrative generated for one user and day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub user_id: String,
    pub date: NaiveDate,
    pub text: String,
    /// Hash of the day's `(visit id, notes)` pairs the text was built from.
    pub visits_hash: String,
    pub updated_at: String,
}

/// Where a summary returned by the summary logic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SummarySource {
    /// In-memory copy, hash unchanged.
    Memory,
    /// Persisted copy, hash unchanged.
    Stored,
    /// Freshly generated by the text generator.
    Generated,
    /// Deterministic place sequence.
    Fallback,
}

impl SummarySource {
    pub fn label(&self) -> &'static str {
        match self {
            SummarySource::Memory => "cached",
            SummarySource::Stored => "stored",
            SummarySource::Generated => "generated",
            SummarySource::Fallback => "fallback",
        }
    }
}
