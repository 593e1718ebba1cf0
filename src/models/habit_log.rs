use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use crate::models::{self, bad_enum, date_to_sql, datetime_to_sql};

/// One check-in per habit per calendar day at most. Re-logging the same
/// day overwrites the status, it never appends.
#[derive(Debug, Clone, Serialize)]
pub struct HabitLog {
    pub id: Option<i64>,
    pub goal_id: i64,
    pub owner_id: i64,
    pub date: NaiveDate,
    pub status: LogStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogStatus {
    Done,
    /// An explicit, accepted pause. Counts toward streak continuity.
    Skipped,
    /// An explicit failure. Breaks the streak just like a missing log.
    Missed,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Done => "done",
            LogStatus::Skipped => "skipped",
            LogStatus::Missed => "missed",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "done" => Some(LogStatus::Done),
            "skipped" => Some(LogStatus::Skipped),
            "missed" => Some(LogStatus::Missed),
            _ => None,
        }
    }

    /// Whether this status keeps a streak alive.
    pub fn continues_streak(self) -> bool {
        matches!(self, LogStatus::Done | LogStatus::Skipped)
    }
}

impl HabitLog {
    /// Insert or overwrite the log row for `(goal_id, date)`.
    pub fn upsert(
        conn: &Connection,
        goal_id: i64,
        owner_id: i64,
        date: NaiveDate,
        status: LogStatus,
        notes: Option<&str>,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO habit_logs (goal_id, owner_id, date, status, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(goal_id, date) DO UPDATE SET status = ?4, notes = ?5",
            params![
                goal_id,
                owner_id,
                date_to_sql(date),
                status.as_str(),
                notes,
                datetime_to_sql(models::now()),
            ],
        )?;
        Ok(())
    }

    pub fn find(conn: &Connection, goal_id: i64, date: NaiveDate) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, goal_id, owner_id, date, status, notes
             FROM habit_logs WHERE goal_id = ?1 AND date = ?2",
            params![goal_id, date_to_sql(date)],
            Self::from_row,
        )
        .optional()
    }

    /// Most recent logs first; `limit` bounds how far back we look.
    pub fn recent(conn: &Connection, goal_id: i64, limit: u32) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, goal_id, owner_id, date, status, notes
             FROM habit_logs WHERE goal_id = ?1
             ORDER BY date DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![goal_id, limit], Self::from_row)?;
        rows.collect()
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let raw_status: String = row.get(4)?;
        let status =
            LogStatus::parse(&raw_status).ok_or_else(|| bad_enum(4, "log status", &raw_status))?;
        Ok(Self {
            id: Some(row.get(0)?),
            goal_id: row.get(1)?,
            owner_id: row.get(2)?,
            date: models::date_from_sql(3, &row.get::<_, String>(3)?)?,
            status,
            notes: row.get(5)?,
        })
    }
}
