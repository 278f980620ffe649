//! Visit service: the single entry point used by the CLI for reading and
//! changing visits. Owns the store connection, the day/month cache and the
//! summary memory.

use crate::ai::TextGenerator;
use crate::config::{AiConfig, Config};
use crate::core::cache::{CacheKey, TtlCache};
use crate::core::merge::{plan_merge, validate_selection};
use crate::core::summary::{SummaryLogic, SummaryOutcome};
use crate::core::timeline::{MonthView, build_month_view, dedup_visits, segments_for_day};
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::visit::{Visit, VisitSegment};
use crate::utils::date::{day_start, month_bounds};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::time::Duration;

pub struct VisitService {
    pool: DbPool,
    user_id: String,
    day_ttl: Duration,
    month_ttl: Duration,
    day_cache: TtlCache<Vec<VisitSegment>>,
    month_cache: TtlCache<MonthView>,
    summaries: SummaryLogic,
    last_error: Option<String>,
    now_override: Option<NaiveDateTime>,

    /// Segments of the day last fetched (the day list).
    pub current_day: Vec<VisitSegment>,
    /// Month last fetched (the calendar grid).
    pub current_month: Option<MonthView>,
}

impl VisitService {
    pub fn new(pool: DbPool, cfg: &Config) -> Self {
        Self::with_ttls(pool, &cfg.user_id, cfg.day_ttl(), cfg.month_ttl())
    }

    pub fn with_ttls(pool: DbPool, user_id: &str, day_ttl: Duration, month_ttl: Duration) -> Self {
        Self {
            pool,
            user_id: user_id.to_string(),
            day_ttl,
            month_ttl,
            day_cache: TtlCache::new(),
            month_cache: TtlCache::new(),
            summaries: SummaryLogic::new(),
            last_error: None,
            now_override: None,
            current_day: Vec::new(),
            current_month: None,
        }
    }

    /// Pin "now" (used to clip open visits). Tests only need this.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now_override = Some(now);
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn now(&self) -> NaiveDateTime {
        self.now_override
            .unwrap_or_else(|| Local::now().naive_local())
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Segments of `date`, served from cache while fresh.
    pub fn fetch_day(&mut self, date: NaiveDate) -> AppResult<Vec<VisitSegment>> {
        let key = CacheKey::day(date);
        if let Some(hit) = self.day_cache.get(&key) {
            log::debug!("cache hit {}", key);
            self.current_day = hit.clone();
            return Ok(hit);
        }
        log::debug!("cache miss {}", key);

        let start = day_start(date);
        let end = date
            .succ_opt()
            .map(day_start)
            .ok_or_else(|| AppError::InvalidDate(date.to_string()))?;

        let visits = dedup_visits(queries::load_visits_in_range(
            &self.pool.conn,
            &self.user_id,
            &start,
            &end,
        )?);
        let names = queries::place_names(&self.pool.conn, &self.user_id)?;
        let segments = segments_for_day(&visits, &names, date, self.now());

        self.day_cache.insert(key, segments.clone(), self.day_ttl);
        self.current_day = segments.clone();
        Ok(segments)
    }

    /// Calendar grid of a month, served from cache while fresh.
    pub fn fetch_month(&mut self, year: i32, month: u32) -> AppResult<MonthView> {
        let key = CacheKey::month(year, month);
        if let Some(hit) = self.month_cache.get(&key) {
            log::debug!("cache hit {}", key);
            self.current_month = Some(hit.clone());
            return Ok(hit);
        }
        log::debug!("cache miss {}", key);

        let (first, next) = month_bounds(year, month)
            .ok_or_else(|| AppError::InvalidMonth(format!("{:04}-{:02}", year, month)))?;

        let visits = dedup_visits(queries::load_visits_in_range(
            &self.pool.conn,
            &self.user_id,
            &day_start(first),
            &day_start(next),
        )?);
        let names = queries::place_names(&self.pool.conn, &self.user_id)?;
        let view = build_month_view(&visits, &names, year, month, self.now());

        self.month_cache.insert(key, view.clone(), self.month_ttl);
        self.current_month = Some(view.clone());
        Ok(view)
    }

    pub fn visit(&self, id: i64) -> AppResult<Visit> {
        queries::load_visit(&self.pool.conn, &self.user_id, id)?.ok_or(AppError::VisitNotFound(id))
    }

    // -----------------------------------------------------------------
    // Cache invalidation
    // -----------------------------------------------------------------

    /// Drop the day and month entries for `date`.
    pub fn invalidate_day(&mut self, date: NaiveDate) {
        self.day_cache.invalidate(&CacheKey::day(date));
        self.month_cache.invalidate(&CacheKey::month_of(date));
    }

    /// Drop every cached day (and month) a visit touches.
    fn invalidate_visit(&mut self, v: &Visit) {
        let last = v.exit.unwrap_or(self.now().max(v.entry)).date();
        let mut d = v.entry_date();
        while d <= last {
            self.invalidate_day(d);
            match d.succ_opt() {
                Some(next) => d = next,
                None => break,
            }
        }
    }

    // -----------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------

    fn ensure_place(&self, place_id: i64) -> AppResult<()> {
        queries::load_place(&self.pool.conn, &self.user_id, place_id)?
            .map(|_| ())
            .ok_or(AppError::PlaceNotFound(place_id))
    }

    /// Geofence entry: open a visit at `place_id`.
    pub fn enter(&mut self, place_id: i64, at: NaiveDateTime) -> AppResult<Visit> {
        self.ensure_place(place_id)?;
        if queries::load_open_visit(&self.pool.conn, &self.user_id, place_id)?.is_some() {
            return Err(AppError::VisitAlreadyOpen(place_id));
        }

        let mut v = Visit::new(&self.user_id, place_id, at, None, None);
        v.id = queries::insert_visit(&self.pool.conn, &v)?;
        self.invalidate_visit(&v);

        ttlog_quiet(
            &self.pool.conn,
            "enter",
            &format!("visit #{}", v.id),
            &format!("Entered place #{} at {}", place_id, v.entry_str()),
        );
        Ok(v)
    }

    /// Geofence exit: close the open visit at `place_id`.
    pub fn exit(&mut self, place_id: i64, at: NaiveDateTime) -> AppResult<Visit> {
        let mut v = queries::load_open_visit(&self.pool.conn, &self.user_id, place_id)?
            .ok_or(AppError::NoOpenVisit(place_id))?;

        if at < v.entry {
            return Err(AppError::ExitBeforeEntry {
                entry: v.entry_str(),
                exit: at.to_string(),
            });
        }

        // the open visit is cached up to "now"; clear that span first
        self.invalidate_visit(&v);
        queries::update_visit_exit(&self.pool.conn, &self.user_id, v.id, &at)?;
        v.exit = Some(at);
        self.invalidate_visit(&v);

        ttlog_quiet(
            &self.pool.conn,
            "exit",
            &format!("visit #{}", v.id),
            &format!("Left place #{} at {}", place_id, at),
        );
        Ok(v)
    }

    /// Record a visit by hand. Without an exit the visit stays open, which is
    /// refused while another visit at the same place is open.
    pub fn add(
        &mut self,
        place_id: i64,
        entry: NaiveDateTime,
        exit: Option<NaiveDateTime>,
        notes: Option<String>,
    ) -> AppResult<Visit> {
        self.ensure_place(place_id)?;
        if let Some(x) = exit
            && x < entry
        {
            return Err(AppError::ExitBeforeEntry {
                entry: entry.to_string(),
                exit: x.to_string(),
            });
        }
        // at most one open visit per place
        if exit.is_none()
            && queries::load_open_visit(&self.pool.conn, &self.user_id, place_id)?.is_some()
        {
            return Err(AppError::VisitAlreadyOpen(place_id));
        }

        let mut v = Visit::new(&self.user_id, place_id, entry, exit, notes);
        v.id = queries::insert_visit(&self.pool.conn, &v)?;
        self.invalidate_visit(&v);

        ttlog_quiet(
            &self.pool.conn,
            "add",
            &format!("visit #{}", v.id),
            &format!("Added visit at place #{} from {}", place_id, v.entry_str()),
        );
        Ok(v)
    }

    /// Replace the notes of a visit (empty text clears them).
    pub fn set_notes(&mut self, id: i64, notes: &str) -> AppResult<Visit> {
        let trimmed = notes.trim();
        let value = (!trimmed.is_empty()).then_some(trimmed);

        if !queries::update_visit_notes(&self.pool.conn, &self.user_id, id, value)? {
            return Err(AppError::VisitNotFound(id));
        }

        let v = self.visit(id)?;
        self.invalidate_visit(&v);

        ttlog_quiet(
            &self.pool.conn,
            "note",
            &format!("visit #{}", id),
            if value.is_some() {
                "Notes updated"
            } else {
                "Notes cleared"
            },
        );
        Ok(v)
    }

    pub fn delete(&mut self, id: i64) -> AppResult<Visit> {
        let v = self.visit(id)?;
        queries::delete_visit(&self.pool.conn, &self.user_id, id)?;
        self.invalidate_visit(&v);

        ttlog_quiet(
            &self.pool.conn,
            "del",
            &format!("visit #{}", id),
            &format!("Deleted visit at place #{}", v.place_id),
        );
        Ok(v)
    }

    // -----------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------

    /// Message of the last failed merge, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Merge the two selected visits into one. On failure the message is
    /// also kept for [`last_error`](Self::last_error).
    pub fn merge(&mut self, ids: &[i64]) -> AppResult<Visit> {
        self.last_error = None;
        let result = self.try_merge(ids);
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn try_merge(&mut self, ids: &[i64]) -> AppResult<Visit> {
        let (a, b) = validate_selection(ids)?;
        let va = self.visit(a)?;
        let vb = self.visit(b)?;

        let plan = plan_merge(va.clone(), vb.clone())?;
        let day = plan.kept.entry_date();

        self.invalidate_visit(&va);
        self.invalidate_visit(&vb);

        queries::apply_merge(&mut self.pool.conn, &plan.kept, plan.absorbed_id)?;

        self.invalidate_visit(&plan.kept);
        self.summaries.forget(&day);

        ttlog_quiet(
            &self.pool.conn,
            "merge",
            &format!("visit #{}", plan.kept.id),
            &format!("Merged visit #{} into #{}", plan.absorbed_id, plan.kept.id),
        );

        if let Err(e) = self.fetch_day(day) {
            log::warn!("reload of {} after merge failed: {}", day, e);
        }
        Ok(plan.kept)
    }

    // -----------------------------------------------------------------
    // Day summary
    // -----------------------------------------------------------------

    pub fn summarize_day(
        &mut self,
        date: NaiveDate,
        generator: Option<&dyn TextGenerator>,
        ai: &AiConfig,
        force: bool,
    ) -> AppResult<SummaryOutcome> {
        let segments = self.fetch_day(date)?;
        self.summaries.summarize(
            &self.pool.conn,
            &self.user_id,
            date,
            &segments,
            generator,
            ai,
            force,
        )
    }
}
