use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use crate::models::{self, bad_enum, date_to_sql, datetime_to_sql, opt_datetime_from_sql};

/// One calendar-date instance of a recurring task. `(task_id, date)` is
/// unique; `occurrence_number` is assigned once at creation and never
/// renumbered.
#[derive(Debug, Clone, Serialize)]
pub struct Occurrence {
    pub id: Option<i64>,
    pub task_id: i64,
    pub owner_id: i64,
    pub date: NaiveDate,
    pub occurrence_number: i64,
    pub status: OccurrenceStatus,
    pub notes: Option<String>,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OccurrenceStatus {
    Pending,
    Done,
    Skipped,
}

impl OccurrenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OccurrenceStatus::Pending => "pending",
            OccurrenceStatus::Done => "done",
            OccurrenceStatus::Skipped => "skipped",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(OccurrenceStatus::Pending),
            "done" => Some(OccurrenceStatus::Done),
            "skipped" => Some(OccurrenceStatus::Skipped),
            _ => None,
        }
    }
}

impl Occurrence {
    pub fn find(conn: &Connection, task_id: i64, date: NaiveDate) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, task_id, owner_id, date, occurrence_number, status, notes, completed_at
             FROM task_occurrences WHERE task_id = ?1 AND date = ?2",
            params![task_id, date_to_sql(date)],
            Self::from_row,
        )
        .optional()
    }

    pub fn count_for_task(conn: &Connection, task_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM task_occurrences WHERE task_id = ?1",
            params![task_id],
            |row| row.get(0),
        )
    }

    pub(crate) fn insert_pending(
        conn: &Connection,
        task_id: i64,
        owner_id: i64,
        date: NaiveDate,
        occurrence_number: i64,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO task_occurrences
                (task_id, owner_id, date, occurrence_number, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
            params![
                task_id,
                owner_id,
                date_to_sql(date),
                occurrence_number,
                datetime_to_sql(models::now()),
            ],
        )?;
        Ok(())
    }

    pub(crate) fn set_status(
        &mut self,
        conn: &Connection,
        status: OccurrenceStatus,
        notes: Option<&str>,
        completed_at: Option<NaiveDateTime>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE task_occurrences SET status = ?1, notes = ?2, completed_at = ?3
             WHERE task_id = ?4 AND date = ?5",
            params![
                status.as_str(),
                notes,
                completed_at.map(datetime_to_sql),
                self.task_id,
                date_to_sql(self.date),
            ],
        )?;
        self.status = status;
        self.notes = notes.map(str::to_string);
        self.completed_at = completed_at;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let raw_status: String = row.get(5)?;
        let status = OccurrenceStatus::parse(&raw_status)
            .ok_or_else(|| bad_enum(5, "occurrence status", &raw_status))?;
        Ok(Self {
            id: Some(row.get(0)?),
            task_id: row.get(1)?,
            owner_id: row.get(2)?,
            date: models::date_from_sql(3, &row.get::<_, String>(3)?)?,
            occurrence_number: row.get(4)?,
            status,
            notes: row.get(6)?,
            completed_at: opt_datetime_from_sql(7, row.get(7)?)?,
        })
    }
}
