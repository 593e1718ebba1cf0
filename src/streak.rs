//! Habit streak maintenance.
//!
//! A streak is the run of consecutive days ending at `as_of` on which the
//! habit was logged Done or Skipped. A day with no log at all and a day
//! explicitly logged Missed both break the chain. The longest streak is
//! monotonic: it only ever grows.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::constants::STREAK_LOG_WINDOW;
use crate::error::{EngineError, Result};
use crate::models::{Goal, GoalVariant, HabitLog, LogStatus};
use crate::progress;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreakUpdate {
    pub current: i64,
    pub longest: i64,
}

/// Current streak from a date-descending log history.
///
/// Walks backward from `as_of` with an expected-date cursor. A log dated
/// after `as_of` is ignored; a log earlier than the cursor is a gap and
/// stops the walk, as does a Missed status at the cursor.
pub fn compute_streak(logs: &[HabitLog], as_of: NaiveDate) -> i64 {
    let mut streak = 0;
    let mut expected = as_of;
    for log in logs {
        if log.date > as_of {
            continue;
        }
        if log.date < expected || !log.status.continues_streak() {
            break;
        }
        streak += 1;
        expected = log.date - Duration::days(1);
    }
    streak
}

/// Recompute a habit's streak from its log history and persist both
/// counters. The parent project, if any, is recomputed one hop up.
pub fn recompute_streak(
    conn: &Connection,
    owner_id: i64,
    goal_id: i64,
    as_of: NaiveDate,
) -> Result<StreakUpdate> {
    let goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "habit" })?;
    let data = match goal.variant {
        GoalVariant::Habit(ref h) => h,
        ref other => {
            return Err(EngineError::InvalidState {
                reason: format!("streaks apply to habits, not a {}", other.kind()),
            })
        }
    };

    // Older history cannot extend a streak computed forward from as_of.
    let logs = HabitLog::recent(conn, goal_id, STREAK_LOG_WINDOW)?;
    let current = compute_streak(&logs, as_of);
    let longest = data.longest_streak.max(current);

    conn.execute(
        "UPDATE goals SET current_streak = ?1, longest_streak = ?2
         WHERE id = ?3 AND owner_id = ?4",
        params![current, longest, goal_id, owner_id],
    )?;
    log::debug!("habit {goal_id} streak recomputed: current={current} longest={longest}");

    progress::cascade_to_parent(conn, owner_id, goal.parent_id);
    Ok(StreakUpdate { current, longest })
}

/// Record a check-in for `date` (overwriting any earlier one for that
/// day) and recompute the streak as of that date.
pub fn log_habit(
    conn: &Connection,
    owner_id: i64,
    goal_id: i64,
    date: NaiveDate,
    status: LogStatus,
    notes: Option<&str>,
) -> Result<StreakUpdate> {
    let goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "habit" })?;
    if !matches!(goal.variant, GoalVariant::Habit(_)) {
        return Err(EngineError::InvalidState {
            reason: format!("check-ins apply to habits, not a {}", goal.variant.kind()),
        });
    }

    HabitLog::upsert(conn, goal_id, owner_id, date, status, notes)?;
    recompute_streak(conn, owner_id, goal_id, date)
}
