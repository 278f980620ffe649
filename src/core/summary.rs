//! Day summary: a short first-person narrative of one day's visits.

use crate::ai::{GenerationRequest, TextGenerator};
use crate::config::AiConfig;
use crate::db::queries::{load_day_summary, upsert_day_summary};
use crate::errors::AppResult;
use crate::models::day_summary::{DaySummary, SummarySource};
use crate::models::visit::VisitSegment;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::collections::HashMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

pub const EMPTY_DAY: &str = "No visits recorded.";
const FALLBACK_SHOWN: usize = 3;

const SYSTEM_PROMPT: &str = "You write a private diary. Given the places someone visited today \
and their notes, write ONE first-person summary of the day in 15 to 40 words. \
Plain text only: no lists, no quotes, no emojis, no markdown. \
Mention only what the notes say; do not invent activities.";

/// Hash of the `(visit id, notes)` pairs of a day, in start order.
/// Any note edit or any added/removed visit changes it.
pub fn visits_hash(segments: &[VisitSegment]) -> String {
    let mut ordered: Vec<&VisitSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| (s.start, s.visit_id));

    let mut hasher = XxHash64::with_seed(0);
    for s in ordered {
        hasher.write_i64(s.visit_id);
        hasher.write(s.notes.as_deref().unwrap_or("").trim().as_bytes());
        hasher.write_u8(0xff);
    }
    format!("{:016x}", hasher.finish())
}

/// `place: notes` lines for every visit with notes, in start order.
pub fn build_context(segments: &[VisitSegment]) -> String {
    let mut ordered: Vec<&VisitSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| (s.start, s.visit_id));

    ordered
        .into_iter()
        .filter_map(|s| {
            let notes = s.notes.as_deref()?.trim();
            (!notes.is_empty()).then(|| format!("{}: {}", s.place_name, notes))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deterministic summary: places in order, consecutive repeats collapsed,
/// the first three shown and the rest counted.
pub fn fallback_summary(segments: &[VisitSegment]) -> String {
    let mut ordered: Vec<&VisitSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| (s.start, s.visit_id));

    let mut names: Vec<&str> = Vec::new();
    for s in ordered {
        if names.last() != Some(&s.place_name.as_str()) {
            names.push(&s.place_name);
        }
    }

    if names.is_empty() {
        return EMPTY_DAY.to_string();
    }

    let shown = names
        .iter()
        .take(FALLBACK_SHOWN)
        .copied()
        .collect::<Vec<_>>()
        .join(" → ");

    if names.len() > FALLBACK_SHOWN {
        format!("{} +{} more", shown, names.len() - FALLBACK_SHOWN)
    } else {
        shown
    }
}

fn has_notes(segments: &[VisitSegment]) -> bool {
    segments
        .iter()
        .any(|s| s.notes.as_deref().is_some_and(|n| !n.trim().is_empty()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub date: NaiveDate,
    pub text: String,
    pub source: SummarySource,
    pub visits_hash: String,
}

/// Remembers the last summary computed per day so an unchanged day is not
/// regenerated.
#[derive(Debug, Default)]
pub struct SummaryLogic {
    memory: HashMap<NaiveDate, (String, String)>, // date → (hash, text)
}

impl SummaryLogic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forget(&mut self, date: &NaiveDate) {
        self.memory.remove(date);
    }

    /// Return the summary for `date`, regenerating only when the day's
    /// hash differs from the last computed one. Lookup order: memory,
    /// stored row, generation.
    #[allow(clippy::too_many_arguments)]
    pub fn summarize(
        &mut self,
        conn: &Connection,
        user_id: &str,
        date: NaiveDate,
        segments: &[VisitSegment],
        generator: Option<&dyn TextGenerator>,
        ai: &AiConfig,
        force: bool,
    ) -> AppResult<SummaryOutcome> {
        let hash = visits_hash(segments);
        let outcome = |text: String, source: SummarySource| SummaryOutcome {
            date,
            text,
            source,
            visits_hash: hash.clone(),
        };

        if segments.is_empty() {
            return Ok(outcome(EMPTY_DAY.to_string(), SummarySource::Fallback));
        }

        if !force {
            if let Some((h, text)) = self.memory.get(&date)
                && *h == hash
            {
                return Ok(outcome(text.clone(), SummarySource::Memory));
            }

            if let Some(stored) = load_day_summary(conn, user_id, &date)?
                && stored.visits_hash == hash
            {
                self.memory
                    .insert(date, (hash.clone(), stored.text.clone()));
                return Ok(outcome(stored.text, SummarySource::Stored));
            }
        }

        let (text, source, persist) = if has_notes(segments) {
            match generator {
                Some(g) => {
                    let req = GenerationRequest {
                        system_prompt: SYSTEM_PROMPT.to_string(),
                        user_prompt: format!(
                            "Today's visits with notes:\n{}",
                            build_context(segments)
                        ),
                        max_tokens: ai.max_tokens,
                        temperature: ai.temperature,
                    };
                    match g.generate(&req) {
                        Ok(text) => (text, SummarySource::Generated, true),
                        Err(e) => {
                            log::warn!("day summary generation failed for {}: {}", date, e);
                            (fallback_summary(segments), SummarySource::Fallback, false)
                        }
                    }
                }
                None => (fallback_summary(segments), SummarySource::Fallback, false),
            }
        } else {
            (fallback_summary(segments), SummarySource::Fallback, true)
        };

        if persist {
            upsert_day_summary(
                conn,
                &DaySummary {
                    user_id: user_id.to_string(),
                    date,
                    text: text.clone(),
                    visits_hash: hash.clone(),
                    updated_at: Local::now().to_rfc3339(),
                },
            )?;
            self.memory.insert(date, (hash.clone(), text.clone()));
        }

        Ok(outcome(text, source))
    }
}
