use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

use crate::models::{self, date_to_sql, datetime_to_sql};

/// Append-only measurement for target and metric goals. Entries are never
/// updated or deduplicated; several on the same day simply accumulate.
#[derive(Debug, Clone, Serialize)]
pub struct GoalEntry {
    pub id: Option<i64>,
    pub goal_id: i64,
    pub owner_id: i64,
    pub date: NaiveDate,
    pub value: f64,
    pub notes: Option<String>,
}

impl GoalEntry {
    pub fn insert(
        conn: &Connection,
        goal_id: i64,
        owner_id: i64,
        date: NaiveDate,
        value: f64,
        notes: Option<&str>,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO goal_entries (goal_id, owner_id, date, value, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                goal_id,
                owner_id,
                date_to_sql(date),
                value,
                notes,
                datetime_to_sql(models::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Sum of every entry over the goal's entire history.
    pub fn total_value(conn: &Connection, goal_id: i64) -> Result<f64> {
        conn.query_row(
            "SELECT COALESCE(SUM(value), 0) FROM goal_entries WHERE goal_id = ?1",
            params![goal_id],
            |row| row.get(0),
        )
    }

    /// Latest entry by date, ties broken by insertion order.
    pub fn latest(conn: &Connection, goal_id: i64) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, goal_id, owner_id, date, value, notes
             FROM goal_entries WHERE goal_id = ?1
             ORDER BY date DESC, id DESC LIMIT 1",
            params![goal_id],
            Self::from_row,
        )
        .optional()
    }

    pub fn list_since(
        conn: &Connection,
        goal_id: i64,
        owner_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, goal_id, owner_id, date, value, notes
             FROM goal_entries
             WHERE goal_id = ?1 AND owner_id = ?2 AND date >= ?3
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![goal_id, owner_id, date_to_sql(since)], Self::from_row)?;
        rows.collect()
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            goal_id: row.get(1)?,
            owner_id: row.get(2)?,
            date: models::date_from_sql(3, &row.get::<_, String>(3)?)?,
            value: row.get(4)?,
            notes: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Goal;
    use crate::test_utils::setup_test_db;

    const OWNER: i64 = 1;

    fn target_id(conn: &Connection) -> i64 {
        let mut target = Goal::new_target(OWNER, "Read books", 24.0, Some("books"));
        target.save(conn).unwrap();
        target.id.unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn test_entries_accumulate_per_day() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let goal_id = target_id(conn);

        GoalEntry::insert(conn, goal_id, OWNER, d(10), 2.0, None).unwrap();
        GoalEntry::insert(conn, goal_id, OWNER, d(10), 3.0, None).unwrap();

        assert_eq!(GoalEntry::total_value(conn, goal_id).unwrap(), 5.0);
    }

    #[test]
    fn test_total_value_empty_is_zero() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let goal_id = target_id(conn);

        assert_eq!(GoalEntry::total_value(conn, goal_id).unwrap(), 0.0);
    }

    #[test]
    fn test_latest_prefers_date_then_insertion() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let goal_id = target_id(conn);

        GoalEntry::insert(conn, goal_id, OWNER, d(12), 1.0, None).unwrap();
        GoalEntry::insert(conn, goal_id, OWNER, d(10), 9.0, None).unwrap();
        GoalEntry::insert(conn, goal_id, OWNER, d(12), 4.0, Some("evening")).unwrap();

        let latest = GoalEntry::latest(conn, goal_id).unwrap().unwrap();
        assert_eq!(latest.value, 4.0);
        assert_eq!(latest.notes.as_deref(), Some("evening"));
    }

    #[test]
    fn test_list_since_filters() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let goal_id = target_id(conn);

        GoalEntry::insert(conn, goal_id, OWNER, d(1), 1.0, None).unwrap();
        GoalEntry::insert(conn, goal_id, OWNER, d(15), 2.0, None).unwrap();

        let recent = GoalEntry::list_since(conn, goal_id, OWNER, d(10)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].value, 2.0);
    }

    #[test]
    fn test_entries_cascade_on_goal_delete() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let goal_id = target_id(conn);

        GoalEntry::insert(conn, goal_id, OWNER, d(10), 2.0, None).unwrap();
        Goal::delete(conn, goal_id, OWNER).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM goal_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
