//! Per-date materialization of recurring tasks.
//!
//! An occurrence row appears the first time anyone touches a recurring
//! task on a given date. Numbers are assigned in creation order and never
//! renumbered, even when a future date is materialized before an earlier
//! one.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{is_unique_violation, EngineError, Result};
use crate::models::{self, Occurrence, OccurrenceStatus, Task};

/// Lifetime completion statistics for one recurring task.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OccurrenceStats {
    pub total: i64,
    pub done: i64,
    pub skipped: i64,
    /// floor(done / total * 100); 0 with no occurrences.
    pub success_rate: i64,
}

/// Fetch the occurrence for `(task_id, date)`, creating a pending one
/// with the next occurrence number if none exists. Idempotent: an
/// existing row is returned unchanged.
pub fn get_or_create(
    conn: &Connection,
    owner_id: i64,
    task_id: i64,
    date: NaiveDate,
) -> Result<Occurrence> {
    let task = Task::find_by_id(conn, task_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "task" })?;
    if !task.is_recurring {
        return Err(EngineError::InvalidState {
            reason: "occurrences apply to recurring tasks only".into(),
        });
    }

    if let Some(existing) = Occurrence::find(conn, task_id, date)? {
        return Ok(existing);
    }

    let number = Occurrence::count_for_task(conn, task_id)? + 1;
    match Occurrence::insert_pending(conn, task_id, owner_id, date, number) {
        Ok(()) => {}
        // Lost an insert race on the (task_id, date) key; the winner's
        // row is the one to return.
        Err(ref e) if is_unique_violation(e) => {}
        Err(e) => return Err(e.into()),
    }

    Occurrence::find(conn, task_id, date)?.ok_or(EngineError::NotFound { entity: "occurrence" })
}

/// Mark the occurrence for `date` done, stamping completion time.
pub fn mark_done(conn: &Connection, owner_id: i64, task_id: i64, date: NaiveDate) -> Result<Occurrence> {
    let mut occ = get_or_create(conn, owner_id, task_id, date)?;
    occ.set_status(conn, OccurrenceStatus::Done, None, Some(models::now()))?;
    Ok(occ)
}

/// Mark the occurrence for `date` skipped. The planner treats a skipped
/// occurrence's window as free time for that date.
pub fn mark_skipped(
    conn: &Connection,
    owner_id: i64,
    task_id: i64,
    date: NaiveDate,
    notes: Option<&str>,
) -> Result<Occurrence> {
    let mut occ = get_or_create(conn, owner_id, task_id, date)?;
    occ.set_status(conn, OccurrenceStatus::Skipped, notes, None)?;
    Ok(occ)
}

/// Reset the occurrence for `date` back to pending.
pub fn unmark(conn: &Connection, owner_id: i64, task_id: i64, date: NaiveDate) -> Result<Occurrence> {
    let mut occ = get_or_create(conn, owner_id, task_id, date)?;
    occ.set_status(conn, OccurrenceStatus::Pending, None, None)?;
    Ok(occ)
}

pub fn stats(conn: &Connection, owner_id: i64, task_id: i64) -> Result<OccurrenceStats> {
    Task::find_by_id(conn, task_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "task" })?;

    let (total, done, skipped) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'done'), 0),
                COALESCE(SUM(status = 'skipped'), 0)
         FROM task_occurrences WHERE task_id = ?1",
        params![task_id],
        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
    )?;

    let success_rate = if total > 0 { done * 100 / total } else { 0 };
    Ok(OccurrenceStats {
        total,
        done,
        skipped,
        success_rate,
    })
}
