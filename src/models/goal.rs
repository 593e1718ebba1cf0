use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::models::{
    self, bad_enum, date_to_sql, datetime_to_sql, join_days, opt_date_from_sql,
    opt_datetime_from_sql, opt_time_from_sql, parse_days, time_to_sql,
};
use crate::validation;

/// One record per goal. Fields that only apply to a particular structural
/// variant live inside [`GoalVariant`], so reading a target's range bounds
/// off a habit is unrepresentable.
#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub id: Option<i64>,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub variant: GoalVariant,
    /// Only a project may be referenced here; enforced on save/update.
    pub parent_id: Option<i64>,
    /// Free-form labels, no computational role.
    pub domain_tags: Vec<String>,
    pub deadline: Option<NaiveDate>,
    /// 0-100. Derived for projects and targets, directly settable for
    /// task-like goals, unused for habits and metrics.
    pub progress: i64,
    pub status: GoalStatus,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub enum GoalVariant {
    Task,
    Project,
    Habit(HabitData),
    Target(TargetData),
    Metric(MetricData),
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitData {
    pub frequency: HabitFrequency,
    /// ISO weekdays (1=Monday) the habit is scheduled on. Empty means
    /// unconstrained for frequencies that allow it.
    pub schedule_days: Vec<u32>,
    pub reminder_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub current_streak: i64,
    pub longest_streak: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetData {
    pub target_value: Option<f64>,
    /// Raw sum of all entries, persisted uncapped even when progress
    /// caps at 100.
    pub current_value: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricData {
    pub target_min: f64,
    pub target_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GoalStatus {
    Active,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HabitFrequency {
    Daily,
    Weekdays,
    /// "3 times a week" style habits; the count is informational, the
    /// schedule days (if any) drive weekday matching.
    NPerWeek(u32),
    Custom,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(GoalStatus::Active),
            "completed" => Some(GoalStatus::Completed),
            "archived" => Some(GoalStatus::Archived),
            _ => None,
        }
    }
}

impl HabitFrequency {
    fn to_sql(self) -> String {
        match self {
            HabitFrequency::Daily => "daily".to_string(),
            HabitFrequency::Weekdays => "weekdays".to_string(),
            HabitFrequency::NPerWeek(n) => format!("{n}_per_week"),
            HabitFrequency::Custom => "custom".to_string(),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(HabitFrequency::Daily),
            "weekdays" => Some(HabitFrequency::Weekdays),
            "custom" => Some(HabitFrequency::Custom),
            other => {
                let n = other.strip_suffix("_per_week")?.parse().ok()?;
                Some(HabitFrequency::NPerWeek(n))
            }
        }
    }
}

impl HabitData {
    /// Whether the habit is scheduled on the given ISO weekday (1=Monday).
    /// A per-week habit with no explicit days can fall on any day.
    pub fn is_scheduled_on(&self, weekday: u32) -> bool {
        match self.frequency {
            HabitFrequency::Daily => true,
            HabitFrequency::Weekdays => (1..=5).contains(&weekday),
            HabitFrequency::NPerWeek(_) => {
                self.schedule_days.is_empty() || self.schedule_days.contains(&weekday)
            }
            HabitFrequency::Custom => self.schedule_days.contains(&weekday),
        }
    }
}

impl GoalVariant {
    pub fn kind(&self) -> &'static str {
        match self {
            GoalVariant::Task => "task",
            GoalVariant::Project => "project",
            GoalVariant::Habit(_) => "habit",
            GoalVariant::Target(_) => "target",
            GoalVariant::Metric(_) => "metric",
        }
    }

    pub fn habit(&self) -> Option<&HabitData> {
        match self {
            GoalVariant::Habit(h) => Some(h),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&TargetData> {
        match self {
            GoalVariant::Target(t) => Some(t),
            _ => None,
        }
    }

    pub fn metric(&self) -> Option<&MetricData> {
        match self {
            GoalVariant::Metric(m) => Some(m),
            _ => None,
        }
    }
}

const GOAL_COLUMNS: &str = "id, owner_id, title, description, goal_type, parent_id, domain_tags, \
     frequency, schedule_days, reminder_time, duration_minutes, current_streak, longest_streak, \
     target_value, current_value, unit, target_min, target_max, \
     deadline, progress, status, completed_at, created_at";

impl Goal {
    pub fn new(owner_id: i64, title: &str, variant: GoalVariant) -> Self {
        Self {
            id: None,
            owner_id,
            title: title.to_string(),
            description: None,
            variant,
            parent_id: None,
            domain_tags: Vec::new(),
            deadline: None,
            progress: 0,
            status: GoalStatus::Active,
            completed_at: None,
            created_at: models::now(),
        }
    }

    /// Convenience constructor for a habit with zeroed streaks.
    pub fn new_habit(owner_id: i64, title: &str, frequency: HabitFrequency, schedule_days: Vec<u32>) -> Self {
        Self::new(
            owner_id,
            title,
            GoalVariant::Habit(HabitData {
                frequency,
                schedule_days,
                reminder_time: None,
                duration_minutes: None,
                current_streak: 0,
                longest_streak: 0,
            }),
        )
    }

    pub fn new_target(owner_id: i64, title: &str, target_value: f64, unit: Option<&str>) -> Self {
        Self::new(
            owner_id,
            title,
            GoalVariant::Target(TargetData {
                target_value: Some(target_value),
                current_value: 0.0,
                unit: unit.map(str::to_string),
            }),
        )
    }

    pub fn new_metric(owner_id: i64, title: &str, target_min: f64, target_max: f64) -> Self {
        Self::new(
            owner_id,
            title,
            GoalVariant::Metric(MetricData {
                target_min,
                target_max,
            }),
        )
    }

    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        self.title = validation::validate_title(&self.title)?.to_string();
        self.validate(conn)?;

        let tags_json = serde_json::to_string(&self.domain_tags)
            .map_err(|e| EngineError::InvalidInput {
                field: "domain_tags",
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO goals (
                owner_id, title, description, goal_type, parent_id, domain_tags,
                frequency, schedule_days, reminder_time, duration_minutes,
                current_streak, longest_streak,
                target_value, current_value, unit, target_min, target_max,
                deadline, progress, status, completed_at, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                self.owner_id,
                self.title,
                self.description,
                self.variant.kind(),
                self.parent_id,
                tags_json,
                self.variant.habit().map(|h| h.frequency.to_sql()),
                self.variant.habit().map(|h| join_days(&h.schedule_days)),
                self.variant
                    .habit()
                    .and_then(|h| h.reminder_time.map(time_to_sql)),
                self.variant.habit().and_then(|h| h.duration_minutes),
                self.variant.habit().map_or(0, |h| h.current_streak),
                self.variant.habit().map_or(0, |h| h.longest_streak),
                self.variant.target().and_then(|t| t.target_value),
                self.variant.target().map_or(0.0, |t| t.current_value),
                self.variant.target().and_then(|t| t.unit.clone()),
                self.variant.metric().map(|m| m.target_min),
                self.variant.metric().map(|m| m.target_max),
                self.deadline.map(date_to_sql),
                self.progress,
                self.status.as_str(),
                self.completed_at.map(datetime_to_sql),
                datetime_to_sql(self.created_at),
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// Update common and variant fields of an existing goal. Derived fields
    /// (progress, streaks, current value) are owned by the engine modules
    /// and updated there.
    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        self.validate(conn)?;

        let tags_json = serde_json::to_string(&self.domain_tags)
            .map_err(|e| EngineError::InvalidInput {
                field: "domain_tags",
                reason: e.to_string(),
            })?;

        let changed = conn.execute(
            "UPDATE goals SET
                title = ?1, description = ?2, parent_id = ?3, domain_tags = ?4,
                frequency = ?5, schedule_days = ?6, reminder_time = ?7, duration_minutes = ?8,
                target_value = ?9, unit = ?10, target_min = ?11, target_max = ?12,
                deadline = ?13
             WHERE id = ?14 AND owner_id = ?15",
            params![
                validation::validate_title(&self.title)?,
                self.description,
                self.parent_id,
                tags_json,
                self.variant.habit().map(|h| h.frequency.to_sql()),
                self.variant.habit().map(|h| join_days(&h.schedule_days)),
                self.variant
                    .habit()
                    .and_then(|h| h.reminder_time.map(time_to_sql)),
                self.variant.habit().and_then(|h| h.duration_minutes),
                self.variant.target().and_then(|t| t.target_value),
                self.variant.target().and_then(|t| t.unit.clone()),
                self.variant.metric().map(|m| m.target_min),
                self.variant.metric().map(|m| m.target_max),
                self.deadline.map(date_to_sql),
                id,
                self.owner_id,
            ],
        )?;
        if changed == 0 {
            return Err(EngineError::NotFound { entity: "goal" });
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        match &self.variant {
            GoalVariant::Habit(h) => {
                validation::validate_days(&h.schedule_days, "schedule_days")?;
                if let Some(minutes) = h.duration_minutes {
                    validation::validate_minutes(minutes, "duration_minutes")?;
                }
            }
            GoalVariant::Target(t) => {
                if let Some(value) = t.target_value {
                    validation::validate_target_value(value)?;
                }
            }
            GoalVariant::Metric(m) => validation::validate_metric_range(m.target_min, m.target_max)?,
            GoalVariant::Task | GoalVariant::Project => {}
        }
        if let Some(parent_id) = self.parent_id {
            ensure_project_parent(conn, parent_id, self.owner_id)?;
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: i64, owner_id: i64) -> rusqlite::Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1 AND owner_id = ?2"),
            params![id, owner_id],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_children(conn: &Connection, parent_id: i64, owner_id: i64) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE parent_id = ?1 AND owner_id = ?2
             ORDER BY goal_type, created_at DESC"
        ))?;
        let rows = stmt.query_map(params![parent_id, owner_id], Self::from_row)?;
        rows.collect()
    }

    /// All active habits for an owner, reminder-time order (unset last).
    pub fn active_habits(conn: &Connection, owner_id: i64) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE owner_id = ?1 AND goal_type = 'habit' AND status = 'active'
             ORDER BY reminder_time IS NULL, reminder_time, title"
        ))?;
        let rows = stmt.query_map(params![owner_id], Self::from_row)?;
        rows.collect()
    }

    pub fn find_by_kind(
        conn: &Connection,
        owner_id: i64,
        kind: &str,
        status: GoalStatus,
    ) -> rusqlite::Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals
             WHERE owner_id = ?1 AND goal_type = ?2 AND status = ?3
             ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id, kind, status.as_str()], Self::from_row)?;
        rows.collect()
    }

    /// Mark completed: status, progress pinned to 100, completion stamp.
    pub fn complete(&mut self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        let at = models::now();
        let changed = conn.execute(
            "UPDATE goals
             SET status = 'completed', progress = 100, completed_at = ?1
             WHERE id = ?2 AND owner_id = ?3",
            params![datetime_to_sql(at), id, self.owner_id],
        )?;
        if changed == 0 {
            return Err(EngineError::NotFound { entity: "goal" });
        }
        self.status = GoalStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Reverse a completion. Progress keeps its last value.
    pub fn restore(&mut self, conn: &Connection) -> Result<()> {
        let id = self.require_id()?;
        let changed = conn.execute(
            "UPDATE goals SET status = 'active', completed_at = NULL
             WHERE id = ?1 AND owner_id = ?2",
            params![id, self.owner_id],
        )?;
        if changed == 0 {
            return Err(EngineError::NotFound { entity: "goal" });
        }
        self.status = GoalStatus::Active;
        self.completed_at = None;
        Ok(())
    }

    /// Hard delete; logs and entries cascade at the schema level.
    pub fn delete(conn: &Connection, id: i64, owner_id: i64) -> rusqlite::Result<bool> {
        let rows = conn.execute(
            "DELETE FROM goals WHERE id = ?1 AND owner_id = ?2",
            params![id, owner_id],
        )?;
        Ok(rows > 0)
    }

    fn require_id(&self) -> Result<i64> {
        self.id.ok_or(EngineError::InvalidState {
            reason: "goal has not been saved".into(),
        })
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let kind: String = row.get(4)?;
        let variant = match kind.as_str() {
            "task" => GoalVariant::Task,
            "project" => GoalVariant::Project,
            "habit" => {
                let raw_freq: Option<String> = row.get(7)?;
                let frequency = match raw_freq {
                    Some(ref s) => {
                        HabitFrequency::parse(s).ok_or_else(|| bad_enum(7, "habit frequency", s))?
                    }
                    None => HabitFrequency::Daily,
                };
                GoalVariant::Habit(HabitData {
                    frequency,
                    schedule_days: row
                        .get::<_, Option<String>>(8)?
                        .map_or_else(Vec::new, |s| parse_days(&s)),
                    reminder_time: opt_time_from_sql(9, row.get(9)?)?,
                    duration_minutes: row.get(10)?,
                    current_streak: row.get(11)?,
                    longest_streak: row.get(12)?,
                })
            }
            "target" => GoalVariant::Target(TargetData {
                target_value: row.get(13)?,
                current_value: row.get(14)?,
                unit: row.get(15)?,
            }),
            "metric" => GoalVariant::Metric(MetricData {
                target_min: row.get::<_, Option<f64>>(16)?.unwrap_or(0.0),
                target_max: row.get::<_, Option<f64>>(17)?.unwrap_or(0.0),
            }),
            other => return Err(bad_enum(4, "goal type", other)),
        };

        let raw_status: String = row.get(20)?;
        let status =
            GoalStatus::parse(&raw_status).ok_or_else(|| bad_enum(20, "goal status", &raw_status))?;

        let raw_tags: String = row.get(6)?;
        let domain_tags: Vec<String> = serde_json::from_str(&raw_tags).unwrap_or_default();

        Ok(Self {
            id: Some(row.get(0)?),
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            variant,
            parent_id: row.get(5)?,
            domain_tags,
            deadline: opt_date_from_sql(18, row.get(18)?)?,
            progress: row.get(19)?,
            status,
            completed_at: opt_datetime_from_sql(21, row.get(21)?)?,
            created_at: models::datetime_from_sql(22, &row.get::<_, String>(22)?)?,
        })
    }
}

fn ensure_project_parent(conn: &Connection, parent_id: i64, owner_id: i64) -> Result<()> {
    let kind: Option<String> = conn
        .query_row(
            "SELECT goal_type FROM goals WHERE id = ?1 AND owner_id = ?2",
            params![parent_id, owner_id],
            |row| row.get(0),
        )
        .optional()?;
    match kind.as_deref() {
        None => Err(EngineError::NotFound {
            entity: "parent goal",
        }),
        Some("project") => Ok(()),
        Some(other) => Err(EngineError::ConstraintViolation {
            reason: format!("parent must be a project, got a {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    const OWNER: i64 = 1;

    #[test]
    fn test_save_and_find_project() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut project = Goal::new(OWNER, "Learn German", GoalVariant::Project);
        project.domain_tags = vec!["education".into()];
        project.save(conn).unwrap();

        let found = Goal::find_by_id(conn, project.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "Learn German");
        assert!(matches!(found.variant, GoalVariant::Project));
        assert_eq!(found.domain_tags, vec!["education".to_string()]);
        assert_eq!(found.status, GoalStatus::Active);
        assert_eq!(found.progress, 0);
    }

    #[test]
    fn test_save_and_find_habit_round_trip() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut habit = Goal::new_habit(OWNER, "Morning run", HabitFrequency::Custom, vec![1, 3, 5]);
        if let GoalVariant::Habit(ref mut h) = habit.variant {
            h.reminder_time = NaiveTime::from_hms_opt(7, 30, 0);
            h.duration_minutes = Some(45);
        }
        habit.save(conn).unwrap();

        let found = Goal::find_by_id(conn, habit.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        let data = found.variant.habit().unwrap();
        assert_eq!(data.frequency, HabitFrequency::Custom);
        assert_eq!(data.schedule_days, vec![1, 3, 5]);
        assert_eq!(data.reminder_time, NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(data.duration_minutes, Some(45));
        assert_eq!(data.current_streak, 0);
    }

    #[test]
    fn test_save_and_find_target() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut target = Goal::new_target(OWNER, "Read 24 books", 24.0, Some("books"));
        target.save(conn).unwrap();

        let found = Goal::find_by_id(conn, target.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        let data = found.variant.target().unwrap();
        assert_eq!(data.target_value, Some(24.0));
        assert_eq!(data.current_value, 0.0);
        assert_eq!(data.unit.as_deref(), Some("books"));
    }

    #[test]
    fn test_save_and_find_metric() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut metric = Goal::new_metric(OWNER, "Weight", 73.0, 77.0);
        metric.save(conn).unwrap();

        let found = Goal::find_by_id(conn, metric.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        let data = found.variant.metric().unwrap();
        assert_eq!(data.target_min, 73.0);
        assert_eq!(data.target_max, 77.0);
    }

    #[test]
    fn test_find_by_id_scoped_to_owner() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut goal = Goal::new(OWNER, "Private", GoalVariant::Task);
        goal.save(conn).unwrap();

        let other_owner = Goal::find_by_id(conn, goal.id.unwrap(), OWNER + 1).unwrap();
        assert!(other_owner.is_none());
    }

    #[test]
    fn test_parent_must_be_project() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut habit = Goal::new_habit(OWNER, "Stretch", HabitFrequency::Daily, vec![]);
        habit.save(conn).unwrap();

        let mut child = Goal::new(OWNER, "Child", GoalVariant::Task);
        child.parent_id = habit.id;
        let err = child.save(conn).unwrap_err();
        assert!(matches!(err, EngineError::ConstraintViolation { .. }));
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut child = Goal::new(OWNER, "Orphan", GoalVariant::Task);
        child.parent_id = Some(9999);
        let err = child.save(conn).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_parent_owned_by_someone_else_is_not_found() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut project = Goal::new(OWNER, "Their project", GoalVariant::Project);
        project.save(conn).unwrap();

        let mut child = Goal::new(OWNER + 1, "Mine", GoalVariant::Task);
        child.parent_id = project.id;
        let err = child.save(conn).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_complete_and_restore() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut goal = Goal::new(OWNER, "Ship it", GoalVariant::Task);
        goal.save(conn).unwrap();

        goal.complete(conn).unwrap();
        let found = Goal::find_by_id(conn, goal.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert_eq!(found.status, GoalStatus::Completed);
        assert_eq!(found.progress, 100);
        assert!(found.completed_at.is_some());

        goal.restore(conn).unwrap();
        let found = Goal::find_by_id(conn, goal.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert_eq!(found.status, GoalStatus::Active);
        assert!(found.completed_at.is_none());
        // Progress keeps its last value after a restore.
        assert_eq!(found.progress, 100);
    }

    #[test]
    fn test_delete_returns_false_for_missing() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut goal = Goal::new(OWNER, "Ephemeral", GoalVariant::Task);
        goal.save(conn).unwrap();
        let id = goal.id.unwrap();

        assert!(Goal::delete(conn, id, OWNER).unwrap());
        assert!(!Goal::delete(conn, id, OWNER).unwrap());
    }

    #[test]
    fn test_update_fields() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut target = Goal::new_target(OWNER, "Save money", 1000.0, Some("€"));
        target.save(conn).unwrap();

        target.title = "Save more money".into();
        if let GoalVariant::Target(ref mut t) = target.variant {
            t.target_value = Some(2000.0);
        }
        target.update(conn).unwrap();

        let found = Goal::find_by_id(conn, target.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "Save more money");
        assert_eq!(found.variant.target().unwrap().target_value, Some(2000.0));
    }

    #[test]
    fn test_save_rejects_bad_schedule_days() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut habit = Goal::new_habit(OWNER, "Bad days", HabitFrequency::Custom, vec![0, 8]);
        assert!(matches!(
            habit.save(conn).unwrap_err(),
            EngineError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_save_rejects_nonpositive_duration() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut habit = Goal::new_habit(OWNER, "Blink", HabitFrequency::Daily, vec![]);
        if let GoalVariant::Habit(ref mut h) = habit.variant {
            h.duration_minutes = Some(0);
        }
        assert!(matches!(
            habit.save(conn).unwrap_err(),
            EngineError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_save_rejects_nonpositive_target() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut target = Goal::new_target(OWNER, "Zero", 0.0, None);
        assert!(matches!(
            target.save(conn).unwrap_err(),
            EngineError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_find_children() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut project = Goal::new(OWNER, "Parent", GoalVariant::Project);
        project.save(conn).unwrap();

        for title in ["a", "b"] {
            let mut child = Goal::new(OWNER, title, GoalVariant::Task);
            child.parent_id = project.id;
            child.save(conn).unwrap();
        }

        let children = Goal::find_children(conn, project.id.unwrap(), OWNER).unwrap();
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_frequency_sql_round_trip() {
        for freq in [
            HabitFrequency::Daily,
            HabitFrequency::Weekdays,
            HabitFrequency::NPerWeek(3),
            HabitFrequency::Custom,
        ] {
            assert_eq!(HabitFrequency::parse(&freq.to_sql()), Some(freq));
        }
        assert_eq!(HabitFrequency::parse("fortnightly"), None);
    }

    #[test]
    fn test_habit_weekday_matching() {
        let mut habit = HabitData {
            frequency: HabitFrequency::Daily,
            schedule_days: vec![],
            reminder_time: None,
            duration_minutes: None,
            current_streak: 0,
            longest_streak: 0,
        };
        assert!(habit.is_scheduled_on(6));

        habit.frequency = HabitFrequency::Weekdays;
        assert!(habit.is_scheduled_on(5));
        assert!(!habit.is_scheduled_on(6));

        habit.frequency = HabitFrequency::Custom;
        habit.schedule_days = vec![2, 4];
        assert!(habit.is_scheduled_on(4));
        assert!(!habit.is_scheduled_on(5));

        habit.frequency = HabitFrequency::NPerWeek(3);
        habit.schedule_days = vec![];
        assert!(habit.is_scheduled_on(7));
        habit.schedule_days = vec![1];
        assert!(!habit.is_scheduled_on(7));
    }
}
