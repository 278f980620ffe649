use crate::db::migrate::schema_version;
use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use chrono::NaiveDateTime;
use rusqlite::OptionalExtension;
use std::fs;

/// Aggregate figures shown by `db --info`.
#[derive(Debug, Default, PartialEq)]
pub struct DbStats {
    pub places: i64,
    pub visits: i64,
    pub open_visits: i64,
    pub summaries: i64,
    pub first_entry: Option<String>,
    pub last_entry: Option<String>,
}

pub fn collect_stats(pool: &DbPool, user_id: &str) -> rusqlite::Result<DbStats> {
    let conn = &pool.conn;
    let count = |sql: &str| -> rusqlite::Result<i64> { conn.query_row(sql, [user_id], |r| r.get(0)) };

    let places = count("SELECT COUNT(*) FROM saved_places WHERE user_id = ?1")?;
    let visits = count("SELECT COUNT(*) FROM location_visits WHERE user_id = ?1")?;
    let open_visits =
        count("SELECT COUNT(*) FROM location_visits WHERE user_id = ?1 AND exit_time IS NULL")?;
    let summaries = count("SELECT COUNT(*) FROM day_summaries WHERE user_id = ?1")?;

    let first_entry: Option<String> = conn
        .query_row(
            "SELECT MIN(entry_time) FROM location_visits WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    let last_entry: Option<String> = conn
        .query_row(
            "SELECT MAX(entry_time) FROM location_visits WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    Ok(DbStats {
        places,
        visits,
        open_visits,
        summaries,
        first_entry,
        last_entry,
    })
}

pub fn print_db_info(pool: &DbPool, db_path: &str, user_id: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);
    println!(
        "{}• Schema:{} v{}",
        CYAN,
        RESET,
        schema_version(&pool.conn)?
    );
    println!("{}• User:{} {}", CYAN, RESET, user_id);

    //
    // 2) COUNTS
    //
    let stats = collect_stats(pool, user_id)?;
    println!("{}• Places:{} {}{}{}", CYAN, RESET, GREEN, stats.places, RESET);
    println!(
        "{}• Visits:{} {}{}{} ({} open)",
        CYAN, RESET, GREEN, stats.visits, RESET, stats.open_visits
    );
    println!(
        "{}• Day summaries:{} {}",
        CYAN, RESET, stats.summaries
    );

    //
    // 3) DATE RANGE
    //
    let fmt_first = stats
        .first_entry
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = stats
        .last_entry
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Visit range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) AVERAGE VISITS/DAY
    //
    if let (Some(f), Some(l)) = (stats.first_entry, stats.last_entry) {
        let d1 = parse_ts(&f)?;
        let d2 = parse_ts(&l)?;
        let days = (d2.date() - d1.date()).num_days().max(1);

        let avg = stats.visits as f64 / days as f64;
        println!("{}• Average visits/day:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}

fn parse_ts(s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, crate::models::visit::TIMESTAMP_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}
