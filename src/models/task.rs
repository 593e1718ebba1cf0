use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::models::{
    self, bad_enum, date_to_sql, datetime_to_sql, join_days, opt_date_from_sql,
    opt_datetime_from_sql, parse_days,
};
use crate::validation;

/// A one-shot or recurring task. One-shot completion is a flag on the row;
/// recurring completion is tracked per date through occurrences.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: Option<i64>,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Eisenhower priority: 0=urgent .. 3=low.
    pub priority: i64,
    pub deadline: Option<NaiveDate>,
    pub scheduled_start: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub estimated_minutes: Option<i64>,
    /// Fixed tasks occupy their window; the planner never moves them.
    pub is_fixed: bool,
    pub is_recurring: bool,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub recurrence_days: Vec<u32>,
    /// Optional link to a project for progress rollup.
    pub goal_id: Option<i64>,
    pub is_completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecurrenceRule {
    Daily,
    Weekdays,
    Custom,
}

impl RecurrenceRule {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceRule::Daily => "daily",
            RecurrenceRule::Weekdays => "weekdays",
            RecurrenceRule::Custom => "custom",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(RecurrenceRule::Daily),
            "weekdays" => Some(RecurrenceRule::Weekdays),
            "custom" => Some(RecurrenceRule::Custom),
            _ => None,
        }
    }
}

const TASK_COLUMNS: &str = "id, owner_id, title, description, priority, deadline, \
     scheduled_start, scheduled_end, estimated_minutes, is_fixed, is_recurring, \
     recurrence_rule, recurrence_days, goal_id, is_completed, completed_at, created_at";

impl Task {
    pub fn new(owner_id: i64, title: &str) -> Self {
        Self {
            id: None,
            owner_id,
            title: title.to_string(),
            description: None,
            priority: 2,
            deadline: None,
            scheduled_start: None,
            scheduled_end: None,
            estimated_minutes: None,
            is_fixed: false,
            is_recurring: false,
            recurrence_rule: None,
            recurrence_days: Vec::new(),
            goal_id: None,
            is_completed: false,
            completed_at: None,
            created_at: models::now(),
        }
    }

    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        self.title = validation::validate_title(&self.title)?.to_string();
        validation::validate_priority(self.priority)?;
        validation::validate_days(&self.recurrence_days, "recurrence_days")?;
        if let Some(minutes) = self.estimated_minutes {
            validation::validate_minutes(minutes, "estimated_minutes")?;
        }
        if self.is_recurring && self.recurrence_rule.is_none() {
            return Err(EngineError::InvalidInput {
                field: "recurrence_rule",
                reason: "required for a recurring task".into(),
            });
        }

        conn.execute(
            "INSERT INTO tasks (
                owner_id, title, description, priority, deadline,
                scheduled_start, scheduled_end, estimated_minutes,
                is_fixed, is_recurring, recurrence_rule, recurrence_days,
                goal_id, is_completed, completed_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                self.owner_id,
                self.title,
                self.description,
                self.priority,
                self.deadline.map(date_to_sql),
                self.scheduled_start.map(datetime_to_sql),
                self.scheduled_end.map(datetime_to_sql),
                self.estimated_minutes,
                self.is_fixed as i32,
                self.is_recurring as i32,
                self.recurrence_rule.map(RecurrenceRule::as_str),
                if self.recurrence_days.is_empty() {
                    None
                } else {
                    Some(join_days(&self.recurrence_days))
                },
                self.goal_id,
                self.is_completed as i32,
                self.completed_at.map(datetime_to_sql),
                datetime_to_sql(self.created_at),
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64, owner_id: i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND owner_id = ?2"),
            params![id, owner_id],
            Self::from_row,
        )
        .optional()
    }

    /// Plain completion flag update. The cascading wrapper lives in the
    /// progress module.
    pub fn set_completed(&mut self, conn: &Connection, completed: bool) -> Result<()> {
        let id = self.require_id()?;
        let at = completed.then(models::now);
        let changed = conn.execute(
            "UPDATE tasks SET is_completed = ?1, completed_at = ?2
             WHERE id = ?3 AND owner_id = ?4",
            params![completed as i32, at.map(datetime_to_sql), id, self.owner_id],
        )?;
        if changed == 0 {
            return Err(EngineError::NotFound { entity: "task" });
        }
        self.is_completed = completed;
        self.completed_at = at;
        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64, owner_id: i64) -> rusqlite::Result<bool> {
        let rows = conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows > 0)
    }

    /// Whether a recurring task falls on the given ISO weekday (1=Monday).
    /// Always false for one-shot tasks.
    pub fn occurs_on(&self, weekday: u32) -> bool {
        if !self.is_recurring {
            return false;
        }
        match self.recurrence_rule {
            Some(RecurrenceRule::Daily) => true,
            Some(RecurrenceRule::Weekdays) => (1..=5).contains(&weekday),
            Some(RecurrenceRule::Custom) => self.recurrence_days.contains(&weekday),
            None => false,
        }
    }

    /// Fixed, incomplete tasks whose scheduled window lies on `date`.
    pub fn fixed_for_date(
        conn: &Connection,
        owner_id: i64,
        date: NaiveDate,
    ) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE owner_id = ?1 AND is_fixed = 1 AND is_completed = 0
               AND DATE(scheduled_start) = ?2
             ORDER BY scheduled_start"
        ))?;
        let rows = stmt.query_map(params![owner_id, date_to_sql(date)], Self::from_row)?;
        rows.collect()
    }

    /// Flexible, incomplete tasks relevant to `date` (scheduled there or
    /// due there), in priority then deadline order.
    pub fn flexible_for_date(
        conn: &Connection,
        owner_id: i64,
        date: NaiveDate,
    ) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE owner_id = ?1 AND is_fixed = 0 AND is_completed = 0
               AND (DATE(scheduled_start) = ?2 OR deadline = ?2)
             ORDER BY priority, deadline"
        ))?;
        let rows = stmt.query_map(params![owner_id, date_to_sql(date)], Self::from_row)?;
        rows.collect()
    }

    pub(crate) fn set_schedule(
        &self,
        conn: &Connection,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<()> {
        let id = self.require_id()?;
        conn.execute(
            "UPDATE tasks SET scheduled_start = ?1, scheduled_end = ?2
             WHERE id = ?3 AND owner_id = ?4",
            params![
                datetime_to_sql(start),
                datetime_to_sql(end),
                id,
                self.owner_id
            ],
        )?;
        Ok(())
    }

    fn require_id(&self) -> Result<i64> {
        self.id.ok_or(EngineError::InvalidState {
            reason: "task has not been saved".into(),
        })
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw_rule: Option<String> = row.get(11)?;
        let recurrence_rule = match raw_rule {
            Some(ref s) => {
                Some(RecurrenceRule::parse(s).ok_or_else(|| bad_enum(11, "recurrence rule", s))?)
            }
            None => None,
        };
        Ok(Self {
            id: Some(row.get(0)?),
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            priority: row.get(4)?,
            deadline: opt_date_from_sql(5, row.get(5)?)?,
            scheduled_start: opt_datetime_from_sql(6, row.get(6)?)?,
            scheduled_end: opt_datetime_from_sql(7, row.get(7)?)?,
            estimated_minutes: row.get(8)?,
            is_fixed: row.get::<_, i32>(9)? != 0,
            is_recurring: row.get::<_, i32>(10)? != 0,
            recurrence_rule,
            recurrence_days: row
                .get::<_, Option<String>>(12)?
                .map_or_else(Vec::new, |s| parse_days(&s)),
            goal_id: row.get(13)?,
            is_completed: row.get::<_, i32>(14)? != 0,
            completed_at: opt_datetime_from_sql(15, row.get(15)?)?,
            created_at: models::datetime_from_sql(16, &row.get::<_, String>(16)?)?,
        })
    }
}
