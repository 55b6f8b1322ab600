//! Rollups of completed-task time.
//!
//! Callers compute `today` once and pass it to every query they run, so a
//! request that straddles midnight still sees one consistent date.

use chrono::{Days, NaiveDate, Utc};
use rusqlite::{params, Connection};

use crate::errors::AppResult;
use crate::models::{DailySummary, DailyTotal};

/// Days looked back from today, inclusive at both ends.
pub const TRAILING_WINDOW_DAYS: u64 = 30;

/// Current calendar date in UTC, the same clock SQLite's `date('now')` uses.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Per-day sums of `time_spent_seconds` for tasks completed within the
/// trailing window, oldest first. Days without completions are omitted.
pub fn productivity_stats(
    conn: &Connection,
    user_id: i64,
    today: NaiveDate,
) -> AppResult<Vec<DailyTotal>> {
    let since = today
        .checked_sub_days(Days::new(TRAILING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);

    let mut stmt = conn.prepare(
        "SELECT completion_date, SUM(time_spent_seconds)
         FROM tasks
         WHERE user_id = ?1
           AND is_completed = 1
           AND completion_date >= ?2
           AND completion_date <= ?3
         GROUP BY completion_date
         ORDER BY completion_date ASC",
    )?;
    let totals = stmt
        .query_map(params![user_id, since, today], |row| {
            Ok(DailyTotal {
                date: row.get(0)?,
                total_seconds: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(totals)
}

/// Time on tasks completed today; zero when there are none.
pub fn daily_summary(conn: &Connection, user_id: i64, today: NaiveDate) -> AppResult<DailySummary> {
    let total_seconds: i64 = conn.query_row(
        "SELECT COALESCE(SUM(time_spent_seconds), 0)
         FROM tasks
         WHERE user_id = ?1
           AND is_completed = 1
           AND completion_date = ?2",
        params![user_id, today],
        |row| row.get(0),
    )?;
    Ok(DailySummary { total_seconds })
}
