//! Progress aggregation for projects, targets, and metrics.
//!
//! Progress is a cached projection: every mutation that can change it
//! (entries, completions, streak updates) recomputes it inline before the
//! call returns, so a read immediately after a write is never stale. The
//! cascade to a parent project is exactly one hop per mutation.

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::models::{Goal, GoalEntry, GoalStatus, GoalVariant, Task};
use crate::validation;

/// Result of a target recompute: the raw entry sum and the capped percentage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TargetProgress {
    pub current_value: f64,
    pub progress: i64,
}

/// Range check against the latest entry of a metric goal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricReading {
    pub value: f64,
    pub date: NaiveDate,
    pub target_min: f64,
    pub target_max: f64,
    pub in_range: bool,
}

/// Recompute and persist a project's progress from its direct children.
///
/// Child goals of any status contribute: 100 when completed, their own
/// `progress` field otherwise (0 for habits, which never set it). Directly
/// linked non-recurring tasks contribute 100 or 0. An empty project is
/// pinned at 0.
pub fn recompute_project(conn: &Connection, owner_id: i64, project_id: i64) -> Result<i64> {
    let project = Goal::find_by_id(conn, project_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "project" })?;
    if !matches!(project.variant, GoalVariant::Project) {
        return Err(EngineError::InvalidState {
            reason: format!(
                "progress aggregation applies to projects, not a {}",
                project.variant.kind()
            ),
        });
    }

    let mut sum: i64 = 0;
    let mut count: i64 = 0;

    for child in Goal::find_children(conn, project_id, owner_id)? {
        sum += match child.status {
            GoalStatus::Completed => 100,
            _ => child.progress,
        };
        count += 1;
    }

    let mut stmt = conn.prepare(
        "SELECT is_completed FROM tasks
         WHERE goal_id = ?1 AND owner_id = ?2 AND is_recurring = 0",
    )?;
    let completed_flags = stmt.query_map(params![project_id, owner_id], |row| {
        row.get::<_, i32>(0)
    })?;
    for flag in completed_flags {
        sum += if flag? != 0 { 100 } else { 0 };
        count += 1;
    }

    let progress = if count == 0 { 0 } else { sum / count };
    conn.execute(
        "UPDATE goals SET progress = ?1 WHERE id = ?2 AND owner_id = ?3",
        params![progress, project_id, owner_id],
    )?;

    log::debug!("project {project_id} progress recomputed to {progress} from {count} items");
    Ok(progress)
}

/// Recompute and persist a target's current value and progress from the
/// sum of its entire entry history.
///
/// Progress caps at 100; the persisted `current_value` stays uncapped.
/// An unset or non-positive `target_value` leaves everything untouched:
/// that is an expected state during goal setup, not an error.
pub fn recompute_target(conn: &Connection, owner_id: i64, goal_id: i64) -> Result<TargetProgress> {
    let goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "target goal" })?;
    let data = match goal.variant {
        GoalVariant::Target(ref t) => t,
        ref other => {
            return Err(EngineError::InvalidState {
                reason: format!("value tracking applies to targets, not a {}", other.kind()),
            })
        }
    };

    let target_value = match data.target_value {
        Some(v) if v > 0.0 => v,
        _ => {
            log::debug!("target {goal_id} has no usable target_value, skipping recompute");
            return Ok(TargetProgress {
                current_value: data.current_value,
                progress: goal.progress,
            });
        }
    };

    let total = GoalEntry::total_value(conn, goal_id)?;
    // Negative entries (corrections) can drag the sum below zero; the
    // stored percentage still has to stay within [0,100].
    let progress = ((total / target_value * 100.0).floor() as i64).clamp(0, 100);

    conn.execute(
        "UPDATE goals SET current_value = ?1, progress = ?2 WHERE id = ?3 AND owner_id = ?4",
        params![total, progress, goal_id, owner_id],
    )?;

    Ok(TargetProgress {
        current_value: total,
        progress,
    })
}

/// Range check for a metric goal from its latest entry. `None` when the
/// metric has no entries yet. Nothing is cached or persisted.
pub fn metric_status(conn: &Connection, owner_id: i64, goal_id: i64) -> Result<Option<MetricReading>> {
    let goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "metric goal" })?;
    let data = match goal.variant {
        GoalVariant::Metric(ref m) => m,
        ref other => {
            return Err(EngineError::InvalidState {
                reason: format!("range checks apply to metrics, not a {}", other.kind()),
            })
        }
    };

    let latest = match GoalEntry::latest(conn, goal_id)? {
        Some(entry) => entry,
        None => return Ok(None),
    };

    Ok(Some(MetricReading {
        value: latest.value,
        date: latest.date,
        target_min: data.target_min,
        target_max: data.target_max,
        in_range: latest.value >= data.target_min && latest.value <= data.target_max,
    }))
}

/// Record a measurement for a target or metric goal, then recompute.
///
/// Targets recompute their progress; metrics only accumulate history.
/// Either way the parent project (if any) is recomputed one hop up.
pub fn add_entry(
    conn: &Connection,
    owner_id: i64,
    goal_id: i64,
    date: NaiveDate,
    value: f64,
    notes: Option<&str>,
) -> Result<i64> {
    let goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "goal" })?;
    match goal.variant {
        GoalVariant::Target(_) | GoalVariant::Metric(_) => {}
        ref other => {
            return Err(EngineError::InvalidState {
                reason: format!("entries apply to targets and metrics, not a {}", other.kind()),
            })
        }
    }

    let entry_id = GoalEntry::insert(conn, goal_id, owner_id, date, value, notes)?;
    if matches!(goal.variant, GoalVariant::Target(_)) {
        recompute_target(conn, owner_id, goal_id)?;
    }
    cascade_to_parent(conn, owner_id, goal.parent_id);
    Ok(entry_id)
}

/// Directly set progress for a task-like goal. Derived variants refuse:
/// their progress comes from their own recompute.
pub fn set_goal_progress(conn: &Connection, owner_id: i64, goal_id: i64, progress: i64) -> Result<()> {
    validation::validate_progress(progress)?;
    let goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "goal" })?;
    if !matches!(goal.variant, GoalVariant::Task) {
        return Err(EngineError::InvalidState {
            reason: format!("progress of a {} goal is derived, not settable", goal.variant.kind()),
        });
    }

    conn.execute(
        "UPDATE goals SET progress = ?1 WHERE id = ?2 AND owner_id = ?3",
        params![progress, goal_id, owner_id],
    )?;
    cascade_to_parent(conn, owner_id, goal.parent_id);
    Ok(())
}

/// Complete a goal and roll the change up to its parent project.
pub fn complete_goal(conn: &Connection, owner_id: i64, goal_id: i64) -> Result<()> {
    let mut goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "goal" })?;
    goal.complete(conn)?;
    cascade_to_parent(conn, owner_id, goal.parent_id);
    Ok(())
}

/// Reopen a completed goal and roll the change up to its parent project.
pub fn restore_goal(conn: &Connection, owner_id: i64, goal_id: i64) -> Result<()> {
    let mut goal = Goal::find_by_id(conn, goal_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "goal" })?;
    goal.restore(conn)?;
    cascade_to_parent(conn, owner_id, goal.parent_id);
    Ok(())
}

/// Complete a one-shot task and recompute the linked project.
/// Recurring tasks are completed per date through occurrences instead.
pub fn complete_task(conn: &Connection, owner_id: i64, task_id: i64) -> Result<()> {
    set_task_completed(conn, owner_id, task_id, true)
}

/// Reverse a one-shot task completion and recompute the linked project.
pub fn uncomplete_task(conn: &Connection, owner_id: i64, task_id: i64) -> Result<()> {
    set_task_completed(conn, owner_id, task_id, false)
}

fn set_task_completed(conn: &Connection, owner_id: i64, task_id: i64, completed: bool) -> Result<()> {
    let mut task = Task::find_by_id(conn, task_id, owner_id)?
        .ok_or(EngineError::NotFound { entity: "task" })?;
    if task.is_recurring {
        return Err(EngineError::InvalidState {
            reason: "a recurring task is completed per date, not as a whole".into(),
        });
    }
    task.set_completed(conn, completed)?;
    cascade_to_parent(conn, owner_id, task.goal_id);
    Ok(())
}

/// One upward hop: recompute the linked goal when it is a project.
/// A cascade failure never rolls back the child mutation that triggered
/// it; the child update stands and the failure is logged.
pub(crate) fn cascade_to_parent(conn: &Connection, owner_id: i64, parent_id: Option<i64>) {
    let Some(parent_id) = parent_id else { return };
    match Goal::find_by_id(conn, parent_id, owner_id) {
        Ok(Some(parent)) if matches!(parent.variant, GoalVariant::Project) => {
            if let Err(e) = recompute_project(conn, owner_id, parent_id) {
                log::warn!("cascade recompute of project {parent_id} failed: {e}");
            }
        }
        Ok(_) => {}
        Err(e) => log::warn!("cascade lookup of goal {parent_id} failed: {e}"),
    }
}
