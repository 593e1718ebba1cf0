use chrono::{Datelike, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::models::{self, date_to_sql, datetime_to_sql, join_days, parse_days, time_to_sql};
use crate::validation;

/// A recurring window that is busy by default on its weekdays: sleep,
/// work hours, standing commitments. Skips carve out single dates.
#[derive(Debug, Clone, Serialize)]
pub struct TimeBlock {
    pub id: Option<i64>,
    pub owner_id: i64,
    pub title: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// ISO weekdays (1=Monday) the block applies to.
    pub days: Vec<u32>,
    pub is_fixed: bool,
    /// Whether single dates may be skipped at all.
    pub is_skippable: bool,
    pub is_active: bool,
}

const TIME_BLOCK_COLUMNS: &str =
    "id, owner_id, title, start_time, end_time, days, is_fixed, is_skippable, is_active";

impl TimeBlock {
    pub fn new(
        owner_id: i64,
        title: &str,
        start_time: NaiveTime,
        end_time: NaiveTime,
        days: Vec<u32>,
    ) -> Self {
        Self {
            id: None,
            owner_id,
            title: title.to_string(),
            start_time,
            end_time,
            days,
            is_fixed: true,
            is_skippable: true,
            is_active: true,
        }
    }

    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        self.title = validation::validate_title(&self.title)?.to_string();
        validation::validate_days_nonempty(&self.days, "days")?;
        validation::validate_time_range(self.start_time, self.end_time)?;

        conn.execute(
            "INSERT INTO time_blocks
                (owner_id, title, start_time, end_time, days,
                 is_fixed, is_skippable, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.owner_id,
                self.title,
                time_to_sql(self.start_time),
                time_to_sql(self.end_time),
                join_days(&self.days),
                self.is_fixed,
                self.is_skippable,
                self.is_active,
                datetime_to_sql(models::now()),
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64, owner_id: i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks WHERE id = ?1 AND owner_id = ?2"),
            params![id, owner_id],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_all(conn: &Connection, owner_id: i64) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks
             WHERE owner_id = ?1 ORDER BY start_time, title"
        ))?;
        let rows = stmt.query_map(params![owner_id], Self::from_row)?;
        rows.collect()
    }

    /// Active blocks that land on `date`'s weekday, minus skipped dates.
    pub fn for_date(conn: &Connection, owner_id: i64, date: NaiveDate) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TIME_BLOCK_COLUMNS} FROM time_blocks b
             WHERE b.owner_id = ?1 AND b.is_active = 1
               AND NOT EXISTS (
                   SELECT 1 FROM time_block_skips s
                   WHERE s.time_block_id = b.id AND s.skip_date = ?2
               )
             ORDER BY b.start_time"
        ))?;
        let weekday = date.weekday().number_from_monday();
        let rows = stmt.query_map(params![owner_id, date_to_sql(date)], Self::from_row)?;
        rows.filter(|r| match r {
            Ok(block) => block.applies_to_day(weekday),
            Err(_) => true,
        })
        .collect()
    }

    /// Whether the block recurs on the given ISO weekday (1=Monday).
    pub fn applies_to_day(&self, weekday: u32) -> bool {
        self.days.contains(&weekday)
    }

    /// Skip this block for a single date. Idempotent.
    pub fn skip(&self, conn: &Connection, date: NaiveDate) -> Result<()> {
        let id = self.require_id()?;
        if !self.is_skippable {
            return Err(EngineError::InvalidState {
                reason: format!("time block '{}' is not skippable", self.title),
            });
        }
        conn.execute(
            "INSERT INTO time_block_skips (time_block_id, owner_id, skip_date)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(time_block_id, skip_date) DO NOTHING",
            params![id, self.owner_id, date_to_sql(date)],
        )?;
        Ok(())
    }

    /// Reinstate the block for a previously skipped date.
    pub fn unskip(&self, conn: &Connection, date: NaiveDate) -> Result<()> {
        let id = self.require_id()?;
        conn.execute(
            "DELETE FROM time_block_skips WHERE time_block_id = ?1 AND skip_date = ?2",
            params![id, date_to_sql(date)],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64, owner_id: i64) -> rusqlite::Result<bool> {
        let rows = conn.execute(
            "DELETE FROM time_blocks WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows > 0)
    }

    fn require_id(&self) -> Result<i64> {
        self.id.ok_or(EngineError::InvalidState {
            reason: "time block has not been saved".into(),
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            owner_id: row.get(1)?,
            title: row.get(2)?,
            start_time: models::time_from_sql(3, &row.get::<_, String>(3)?)?,
            end_time: models::time_from_sql(4, &row.get::<_, String>(4)?)?,
            days: parse_days(&row.get::<_, String>(5)?),
            is_fixed: row.get(6)?,
            is_skippable: row.get(7)?,
            is_active: row.get(8)?,
        })
    }
}
