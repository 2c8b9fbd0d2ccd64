//! Site-wide visit counting
//!
//! One `visit_counts` row per calendar date. A qualifying request increments
//! today's count at most once per browser session: the session carries a
//! `visited_day_<YYYY-MM-DD>` mark once the visit has been counted.
//!
//! Known race: two concurrent first-of-day requests from the same session can
//! both miss the mark before either stores it, counting that session twice.
//! The increment itself is a single `count = count + 1` statement, so visits
//! from different sessions are never lost.

use catalog_common::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::debug;

/// Path prefixes that never count as a visit
pub const EXCLUDED_PREFIXES: [&str; 3] = ["/admin/", "/static/", "/media/"];

/// Session-scoped boolean marks
///
/// Implemented by the HTTP session; tests use a plain `HashSet`.
pub trait SessionMarks {
    fn has_mark(&self, key: &str) -> bool;
    fn set_mark(&mut self, key: &str);
}

impl SessionMarks for HashSet<String> {
    fn has_mark(&self, key: &str) -> bool {
        self.contains(key)
    }

    fn set_mark(&mut self, key: &str) {
        self.insert(key.to_string());
    }
}

/// What `record_visit` did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Not a qualifying request; storage untouched
    Skipped,
    /// First qualifying request of this session today; count incremented
    Counted,
    /// Session already counted today
    AlreadyCounted,
}

/// Visit statistics for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitStats {
    pub today_visits: i64,
    pub total_visits: i64,
}

/// A synchronous, non-administrative, non-static GET request
pub fn is_qualifying_request(path: &str, method: &str, is_ajax: bool) -> bool {
    method.eq_ignore_ascii_case("GET")
        && !is_ajax
        && !EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Session key marking that `date` has been counted for this session
pub fn session_mark_for(date: NaiveDate) -> String {
    format!("visited_day_{}", date.format("%Y-%m-%d"))
}

/// Count a visit for `today` if the request qualifies and the session has
/// not been counted yet today
pub async fn record_visit<S>(
    pool: &SqlitePool,
    request_path: &str,
    method: &str,
    is_ajax: bool,
    session: &mut S,
    today: NaiveDate,
) -> Result<VisitOutcome>
where
    S: SessionMarks + ?Sized,
{
    if !is_qualifying_request(request_path, method, is_ajax) {
        return Ok(VisitOutcome::Skipped);
    }

    // Get-or-create today's record
    sqlx::query("INSERT INTO visit_counts (date, count) VALUES (?, 0) ON CONFLICT(date) DO NOTHING")
        .bind(today)
        .execute(pool)
        .await?;

    let mark = session_mark_for(today);
    if session.has_mark(&mark) {
        return Ok(VisitOutcome::AlreadyCounted);
    }

    sqlx::query("UPDATE visit_counts SET count = count + 1 WHERE date = ?")
        .bind(today)
        .execute(pool)
        .await?;

    session.set_mark(&mark);
    debug!("Counted visit for {} ({})", today, request_path);

    Ok(VisitOutcome::Counted)
}

/// Visits counted on `date` (0 when no record exists)
pub async fn visits_on(pool: &SqlitePool, date: NaiveDate) -> Result<i64> {
    let count: Option<i64> = sqlx::query_scalar("SELECT count FROM visit_counts WHERE date = ?")
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(count.unwrap_or(0))
}

/// Sum of all visit counts
pub async fn total_visits(pool: &SqlitePool) -> Result<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(count), 0) FROM visit_counts")
        .fetch_one(pool)
        .await?;

    Ok(total)
}

pub async fn visit_stats(pool: &SqlitePool, today: NaiveDate) -> Result<VisitStats> {
    Ok(VisitStats {
        today_visits: visits_on(pool, today).await?,
        total_visits: total_visits(pool).await?,
    })
}
