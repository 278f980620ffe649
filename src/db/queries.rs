use crate::errors::{AppError, AppResult};
use crate::models::day_summary::DaySummary;
use crate::models::place::{PlaceCategory, SavedPlace};
use crate::models::visit::{TIMESTAMP_FMT, Visit};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::collections::HashMap;

const VISIT_COLUMNS: &str =
    "id, user_id, saved_place_id, entry_time, exit_time, visit_notes, updated_at";

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_ts(idx: usize, s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT)
        .map_err(|_| conversion_error(idx, AppError::InvalidTime(s.to_string())))
}

fn fmt_ts(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FMT).to_string()
}

// ---------------------------------------------------------------------------
// Saved places
// ---------------------------------------------------------------------------

pub fn map_place_row(row: &Row) -> Result<SavedPlace> {
    let cat_str: String = row.get("category")?;
    let category = PlaceCategory::from_db_str(&cat_str)
        .ok_or_else(|| conversion_error(3, AppError::InvalidCategory(cat_str.clone())))?;

    Ok(SavedPlace {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        category,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

pub fn insert_place(conn: &Connection, place: &SavedPlace) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO saved_places (user_id, name, category, latitude, longitude, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            place.user_id,
            place.name,
            place.category.to_db_str(),
            place.latitude,
            place.longitude,
            place.address,
            place.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_place(conn: &Connection, user_id: &str, id: i64) -> AppResult<Option<SavedPlace>> {
    let place = conn
        .query_row(
            "SELECT * FROM saved_places WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            map_place_row,
        )
        .optional()?;
    Ok(place)
}

pub fn load_places(conn: &Connection, user_id: &str) -> AppResult<Vec<SavedPlace>> {
    let mut stmt =
        conn.prepare("SELECT * FROM saved_places WHERE user_id = ?1 ORDER BY name ASC, id ASC")?;
    let rows = stmt.query_map([user_id], map_place_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Id → display name for every place of the user.
pub fn place_names(conn: &Connection, user_id: &str) -> AppResult<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, name FROM saved_places WHERE user_id = ?1")?;
    let rows = stmt.query_map([user_id], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut out = HashMap::new();
    for r in rows {
        let (id, name) = r?;
        out.insert(id, name);
    }
    Ok(out)
}

pub fn count_visits_for_place(conn: &Connection, user_id: &str, place_id: i64) -> AppResult<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM location_visits WHERE user_id = ?1 AND saved_place_id = ?2",
        params![user_id, place_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

pub fn delete_place(conn: &Connection, user_id: &str, id: i64) -> AppResult<bool> {
    let n = conn.execute(
        "DELETE FROM saved_places WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(n > 0)
}

// ---------------------------------------------------------------------------
// Visits
// ---------------------------------------------------------------------------

pub fn map_visit_row(row: &Row) -> Result<Visit> {
    let entry_str: String = row.get("entry_time")?;
    let exit_str: Option<String> = row.get("exit_time")?;

    let entry = parse_ts(3, &entry_str)?;
    let exit = match exit_str {
        Some(s) => Some(parse_ts(4, &s)?),
        None => None,
    };

    Ok(Visit {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        place_id: row.get("saved_place_id")?,
        entry,
        exit,
        notes: row.get("visit_notes")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Collect decoded rows. Rows that fail to decode are logged and skipped so
/// one bad timestamp does not hide the rest of the day.
fn collect_visits<I>(rows: I) -> AppResult<Vec<Visit>>
where
    I: Iterator<Item = Result<Visit>>,
{
    let mut out = Vec::new();
    for r in rows {
        match r {
            Ok(v) => out.push(v),
            Err(e @ rusqlite::Error::FromSqlConversionFailure(..)) => {
                log::warn!("skipping undecodable visit row: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(out)
}

/// Visits of `user_id` overlapping `[start, end)`, ordered by entry time.
/// Open visits overlap every range that starts after their entry.
pub fn load_visits_in_range(
    conn: &Connection,
    user_id: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> AppResult<Vec<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM location_visits
         WHERE user_id = ?1
           AND entry_time < ?3
           AND (exit_time IS NULL OR exit_time > ?2 OR entry_time >= ?2)
         ORDER BY entry_time ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, fmt_ts(start), fmt_ts(end)], map_visit_row)?;
    collect_visits(rows)
}

pub fn load_visit(conn: &Connection, user_id: &str, id: i64) -> AppResult<Option<Visit>> {
    let sql = format!("SELECT {VISIT_COLUMNS} FROM location_visits WHERE id = ?1 AND user_id = ?2");
    let v = conn
        .query_row(&sql, params![id, user_id], map_visit_row)
        .optional()?;
    Ok(v)
}

/// Most recent visit at `place_id` that has no exit yet.
pub fn load_open_visit(conn: &Connection, user_id: &str, place_id: i64) -> AppResult<Option<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM location_visits
         WHERE user_id = ?1 AND saved_place_id = ?2 AND exit_time IS NULL
         ORDER BY entry_time DESC
         LIMIT 1"
    );
    let v = conn
        .query_row(&sql, params![user_id, place_id], map_visit_row)
        .optional()?;
    Ok(v)
}

pub fn insert_visit(conn: &Connection, v: &Visit) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO location_visits (user_id, saved_place_id, entry_time, exit_time, visit_notes, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            v.user_id,
            v.place_id,
            v.entry_str(),
            v.exit_str(),
            v.notes,
            v.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Patch `visit_notes` of one visit. Returns false when no row matched.
pub fn update_visit_notes(
    conn: &Connection,
    user_id: &str,
    id: i64,
    notes: Option<&str>,
) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE location_visits
         SET visit_notes = ?1, updated_at = ?2
         WHERE id = ?3 AND user_id = ?4",
        params![notes, Local::now().to_rfc3339(), id, user_id],
    )?;
    Ok(n > 0)
}

/// Patch `exit_time` of one visit. Returns false when no row matched.
pub fn update_visit_exit(
    conn: &Connection,
    user_id: &str,
    id: i64,
    exit: &NaiveDateTime,
) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE location_visits
         SET exit_time = ?1, updated_at = ?2
         WHERE id = ?3 AND user_id = ?4",
        params![fmt_ts(exit), Local::now().to_rfc3339(), id, user_id],
    )?;
    Ok(n > 0)
}

pub fn delete_visit(conn: &Connection, user_id: &str, id: i64) -> AppResult<bool> {
    let n = conn.execute(
        "DELETE FROM location_visits WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    Ok(n > 0)
}

/// Store the result of a merge: patch the kept row, drop the absorbed one.
/// Both statements run in one transaction.
pub fn apply_merge(conn: &mut Connection, kept: &Visit, absorbed_id: i64) -> AppResult<()> {
    let tx = conn.transaction()?;

    let updated = tx.execute(
        "UPDATE location_visits
         SET entry_time = ?1, exit_time = ?2, visit_notes = ?3, updated_at = ?4
         WHERE id = ?5 AND user_id = ?6",
        params![
            kept.entry_str(),
            kept.exit_str(),
            kept.notes,
            kept.updated_at,
            kept.id,
            kept.user_id,
        ],
    )?;
    if updated == 0 {
        return Err(AppError::VisitNotFound(kept.id));
    }

    let deleted = tx.execute(
        "DELETE FROM location_visits WHERE id = ?1 AND user_id = ?2",
        params![absorbed_id, kept.user_id],
    )?;
    if deleted == 0 {
        return Err(AppError::VisitNotFound(absorbed_id));
    }

    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Day summaries
// ---------------------------------------------------------------------------

pub fn load_day_summary(
    conn: &Connection,
    user_id: &str,
    date: &NaiveDate,
) -> AppResult<Option<DaySummary>> {
    let row = conn
        .query_row(
            "SELECT user_id, summary_date, summary_text, visits_hash, updated_at
             FROM day_summaries
             WHERE user_id = ?1 AND summary_date = ?2",
            params![user_id, date.format("%Y-%m-%d").to_string()],
            |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .map_err(|_| conversion_error(1, AppError::InvalidDate(date_str.clone())))?;
                Ok(DaySummary {
                    user_id: row.get(0)?,
                    date,
                    text: row.get(2)?,
                    visits_hash: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn upsert_day_summary(conn: &Connection, s: &DaySummary) -> AppResult<()> {
    conn.execute(
        "INSERT INTO day_summaries (user_id, summary_date, summary_text, visits_hash, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, summary_date) DO UPDATE SET
             summary_text = excluded.summary_text,
             visits_hash  = excluded.visits_hash,
             updated_at   = excluded.updated_at",
        params![
            s.user_id,
            s.date.format("%Y-%m-%d").to_string(),
            s.text,
            s.visits_hash,
            s.updated_at,
        ],
    )?;
    Ok(())
}
