use crate::db::log::ttlog;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// A schema step. Applied in order; `PRAGMA user_version` records the last
/// one that ran.
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_places_and_visits",
        sql: r#"
        CREATE TABLE IF NOT EXISTS saved_places (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            category    TEXT NOT NULL DEFAULT 'other'
                        CHECK(category IN ('home','work','food','shop','gym','health','social','other')),
            latitude    REAL NOT NULL DEFAULT 0,
            longitude   REAL NOT NULL DEFAULT 0,
            address     TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS location_visits (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         TEXT NOT NULL,
            saved_place_id  INTEGER NOT NULL REFERENCES saved_places(id),
            entry_time      TEXT NOT NULL,
            exit_time       TEXT,
            visit_notes     TEXT,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_visits_user_entry ON location_visits(user_id, entry_time);
        CREATE INDEX IF NOT EXISTS idx_visits_user_place ON location_visits(user_id, saved_place_id);
        "#,
    },
    Migration {
        version: 2,
        name: "create_day_summaries",
        sql: r#"
        CREATE TABLE IF NOT EXISTS day_summaries (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       TEXT NOT NULL,
            summary_date  TEXT NOT NULL,
            summary_text  TEXT NOT NULL,
            visits_hash   TEXT NOT NULL,
            updated_at    TEXT NOT NULL,
            UNIQUE(user_id, summary_date)
        );
        "#,
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
}

/// Check if a table exists.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

pub fn latest_version() -> i32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Apply every migration newer than the stored schema version.
/// Returns the number of migrations applied.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let current = schema_version(conn)?;
    if current > latest_version() {
        return Err(AppError::Migration(format!(
            "database schema v{} is newer than this binary (v{})",
            current,
            latest_version()
        )));
    }

    let mut applied = 0;
    for m in MIGRATIONS.iter().filter(|m| m.version > current) {
        // `user_version` does not accept bound parameters.
        let sql = format!(
            "BEGIN;\n{}\nPRAGMA user_version = {};\nCOMMIT;",
            m.sql, m.version
        );
        if let Err(e) = conn.execute_batch(&sql) {
            let _ = conn.execute_batch("ROLLBACK;");
            return Err(AppError::Migration(format!("{}: {}", m.name, e)));
        }

        ttlog(
            conn,
            "migration_applied",
            m.name,
            &format!("Schema upgraded to v{}", m.version),
        )?;
        log::debug!("applied migration v{} ({})", m.version, m.name);
        applied += 1;
    }

    if applied > 0 {
        success(format!(
            "Database schema upgraded to v{} ({} migration(s)).",
            latest_version(),
            applied
        ));
    }

    Ok(applied)
}
