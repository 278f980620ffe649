use crate::models::visit::{Visit, VisitSegment};
use crate::utils::date::{all_days_of_month, day_start};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const UNKNOWN_PLACE: &str = "Unknown place";

/// One cell of the calendar grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub visit_count: usize,
    pub total_minutes: i64,
    /// Distinct place names in order of first visit.
    pub places: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<MonthDay>,
}

impl MonthView {
    pub fn active_days(&self) -> impl Iterator<Item = &MonthDay> {
        self.days.iter().filter(|d| d.visit_count > 0)
    }
}

pub fn place_name(names: &HashMap<i64, String>, id: i64) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_PLACE.to_string())
}

/// Rank used to pick the survivor among duplicate rows: a known exit beats
/// an open one, a later exit beats an earlier one, notes beat no notes,
/// lower id wins ties.
fn survivor_rank(v: &Visit) -> (bool, Option<NaiveDateTime>, bool, std::cmp::Reverse<i64>) {
    (
        v.exit.is_some(),
        v.exit,
        v.notes_text().is_some(),
        std::cmp::Reverse(v.id),
    )
}

/// Collapse rows describing the same stay (same place, same entry time).
pub fn dedup_visits(visits: Vec<Visit>) -> Vec<Visit> {
    let mut by_key: BTreeMap<(NaiveDateTime, i64), Visit> = BTreeMap::new();

    for v in visits {
        let key = (v.entry, v.place_id);
        match by_key.get(&key) {
            Some(existing) if survivor_rank(existing) >= survivor_rank(&v) => {
                log::debug!("dropping duplicate visit #{} (kept #{})", v.id, existing.id);
            }
            _ => {
                by_key.insert(key, v);
            }
        }
    }

    by_key.into_values().collect()
}

/// Cut a visit at every midnight it crosses.
///
/// An open visit runs until `now` (or is a zero-length segment when `now`
/// precedes its entry).
pub fn split_at_midnight(v: &Visit, place_name: &str, now: NaiveDateTime) -> Vec<VisitSegment> {
    let end = v.exit.unwrap_or(now.max(v.entry));

    let make = |start: NaiveDateTime, seg_end: NaiveDateTime| VisitSegment {
        visit_id: v.id,
        place_id: v.place_id,
        place_name: place_name.to_string(),
        day: start.date(),
        start,
        end: seg_end,
        open: v.is_open(),
        continued: start != v.entry || seg_end != end,
        notes: v.notes_text().map(str::to_string),
    };

    if end <= v.entry {
        return vec![make(v.entry, v.entry)];
    }

    let mut out = Vec::new();
    let mut cur = v.entry;
    while cur < end {
        let next_midnight = match cur.date().succ_opt() {
            Some(d) => day_start(d),
            None => end,
        };
        let seg_end = end.min(next_midnight);
        out.push(make(cur, seg_end));
        cur = seg_end;
    }
    out
}

/// Segments of `visits` that fall on `day`, ordered by start.
pub fn segments_for_day(
    visits: &[Visit],
    names: &HashMap<i64, String>,
    day: NaiveDate,
    now: NaiveDateTime,
) -> Vec<VisitSegment> {
    let mut out: Vec<VisitSegment> = visits
        .iter()
        .flat_map(|v| split_at_midnight(v, &place_name(names, v.place_id), now))
        .filter(|s| s.day == day)
        .collect();
    out.sort_by_key(|s| (s.start, s.visit_id));
    out
}

/// Per-day aggregation of a month of visits.
pub fn build_month_view(
    visits: &[Visit],
    names: &HashMap<i64, String>,
    year: i32,
    month: u32,
    now: NaiveDateTime,
) -> MonthView {
    let mut per_day: HashMap<NaiveDate, Vec<VisitSegment>> = HashMap::new();
    for v in visits {
        for seg in split_at_midnight(v, &place_name(names, v.place_id), now) {
            per_day.entry(seg.day).or_default().push(seg);
        }
    }

    let days = all_days_of_month(year, month)
        .into_iter()
        .map(|date| {
            let mut segs = per_day.remove(&date).unwrap_or_default();
            segs.sort_by_key(|s| (s.start, s.visit_id));

            let mut places: Vec<String> = Vec::new();
            for s in &segs {
                if !places.contains(&s.place_name) {
                    places.push(s.place_name.clone());
                }
            }

            MonthDay {
                date,
                visit_count: segs.len(),
                total_minutes: segs.iter().map(VisitSegment::duration_minutes).sum(),
                places,
            }
        })
        .collect();

    MonthView { year, month, days }
}
