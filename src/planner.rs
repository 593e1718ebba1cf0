//! Day planning: free-slot computation and greedy packing of flexible
//! items into them.
//!
//! Everything here recomputes from current state on every call; nothing
//! is cached between invocations. Re-running a plan for the same day is
//! only idempotent if no busy interval changed in between.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::constants::{DAY_END_HOUR, DAY_START_HOUR, DEFAULT_ITEM_MINUTES};
use crate::error::Result;
use crate::models::{Goal, Occurrence, OccurrenceStatus, Task, TimeBlock};

/// A contiguous free interval within the day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Bounds of the plannable day. The defaults leave nights alone.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0).expect("valid time literal"),
            day_end: NaiveTime::from_hms_opt(DAY_END_HOUR, 0, 0).expect("valid time literal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Task,
    Habit,
}

/// A flexible item waiting for a slot, already ordered by urgency.
#[derive(Debug, Clone, Serialize)]
pub struct PlanItem {
    pub kind: ItemKind,
    pub id: i64,
    pub title: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub kind: ItemKind,
    pub id: i64,
    pub title: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Slot-filling policy. The default is a greedy single pass; a stricter
/// packer can be swapped in behind the same contract.
pub trait SlotStrategy {
    fn pack(&self, slots: &[Slot], items: &[PlanItem]) -> Vec<Assignment>;
}

/// Single left-to-right pass with a shared forward-only slot cursor.
/// A misfit advances to the next slot and retries the same item; once
/// the slots run out the pass ends and the rest stay unscheduled.
pub struct GreedyPacker;

impl SlotStrategy for GreedyPacker {
    fn pack(&self, slots: &[Slot], items: &[PlanItem]) -> Vec<Assignment> {
        let mut open: Vec<Slot> = slots.to_vec();
        let mut assignments = Vec::new();
        let mut idx = 0;

        'items: for item in items {
            loop {
                let Some(slot) = open.get_mut(idx) else {
                    break 'items;
                };
                if slot.minutes() >= item.minutes {
                    let start = slot.start;
                    let end = start + Duration::minutes(item.minutes);
                    slot.start = end;
                    assignments.push(Assignment {
                        kind: item.kind,
                        id: item.id,
                        title: item.title.clone(),
                        start,
                        end,
                    });
                    continue 'items;
                }
                idx += 1;
            }
        }
        assignments
    }
}

/// Free intervals of the day window after subtracting busy intervals:
/// active time blocks landing on that weekday and fixed incomplete tasks
/// scheduled that day. A recurring fixed task whose occurrence for the
/// date is Skipped releases its window.
pub fn free_slots(conn: &Connection, owner_id: i64, date: NaiveDate) -> Result<Vec<Slot>> {
    free_slots_with(conn, owner_id, date, &PlannerConfig::default())
}

pub fn free_slots_with(
    conn: &Connection,
    owner_id: i64,
    date: NaiveDate,
    config: &PlannerConfig,
) -> Result<Vec<Slot>> {
    let mut busy: Vec<(NaiveTime, NaiveTime)> = Vec::new();

    for block in TimeBlock::for_date(conn, owner_id, date)? {
        busy.push((block.start_time, block.end_time));
    }

    for task in Task::fixed_for_date(conn, owner_id, date)? {
        if let (true, Some(id)) = (task.is_recurring, task.id) {
            let occurrence = Occurrence::find(conn, id, date)?;
            if occurrence.is_some_and(|occ| occ.status == OccurrenceStatus::Skipped) {
                continue;
            }
        }
        if let Some(window) = task_window(&task) {
            busy.push(window);
        }
    }

    busy.sort_by_key(|&(start, _)| start);

    // Sweep left to right; the max advance merges overlaps implicitly.
    let mut slots = Vec::new();
    let mut cursor = config.day_start;
    for (start, end) in busy {
        if cursor >= config.day_end {
            break;
        }
        if start > cursor {
            slots.push(Slot {
                start: cursor,
                end: start.min(config.day_end),
            });
        }
        cursor = cursor.max(end);
    }
    if cursor < config.day_end {
        slots.push(Slot {
            start: cursor,
            end: config.day_end,
        });
    }
    Ok(slots)
}

fn task_window(task: &Task) -> Option<(NaiveTime, NaiveTime)> {
    let start = task.scheduled_start?.time();
    let end = match task.scheduled_end {
        Some(end) => end.time(),
        None => {
            start + Duration::minutes(task.estimated_minutes.unwrap_or(DEFAULT_ITEM_MINUTES))
        }
    };
    // A window whose end-of-day time is not after its start (cross-midnight
    // schedules) would invert the sweep; it occupies nothing of this day.
    if end <= start {
        return None;
    }
    Some((start, end))
}

/// Re-pack the day's flexible work into its free slots with the default
/// greedy policy. Tasks come first (priority, then deadline), habits
/// scheduled for that weekday after them (reminder-time order).
///
/// Task placements are persisted to `scheduled_start`/`scheduled_end`;
/// habit placements are advisory, returned but not stored.
pub fn reschedule_flexible(conn: &Connection, owner_id: i64, date: NaiveDate) -> Result<Vec<Assignment>> {
    reschedule_flexible_with(conn, owner_id, date, &PlannerConfig::default(), &GreedyPacker)
}

pub fn reschedule_flexible_with(
    conn: &Connection,
    owner_id: i64,
    date: NaiveDate,
    config: &PlannerConfig,
    strategy: &dyn SlotStrategy,
) -> Result<Vec<Assignment>> {
    let slots = free_slots_with(conn, owner_id, date, config)?;
    let weekday = date.weekday().number_from_monday();

    let tasks = Task::flexible_for_date(conn, owner_id, date)?;
    let mut items: Vec<PlanItem> = Vec::new();
    for task in &tasks {
        let Some(id) = task.id else { continue };
        items.push(PlanItem {
            kind: ItemKind::Task,
            id,
            title: task.title.clone(),
            minutes: task.estimated_minutes.unwrap_or(DEFAULT_ITEM_MINUTES),
        });
    }
    for habit in Goal::active_habits(conn, owner_id)? {
        let Some(data) = habit.variant.habit() else { continue };
        if !data.is_scheduled_on(weekday) {
            continue;
        }
        let Some(id) = habit.id else { continue };
        items.push(PlanItem {
            kind: ItemKind::Habit,
            id,
            title: habit.title.clone(),
            minutes: data.duration_minutes.unwrap_or(DEFAULT_ITEM_MINUTES),
        });
    }

    let assignments = strategy.pack(&slots, &items);

    for assignment in &assignments {
        if assignment.kind != ItemKind::Task {
            continue;
        }
        if let Some(task) = tasks.iter().find(|t| t.id == Some(assignment.id)) {
            task.set_schedule(conn, date.and_time(assignment.start), date.and_time(assignment.end))?;
        }
    }

    log::debug!(
        "rescheduled {} of {} flexible items for {date}",
        assignments.len(),
        items.len()
    );
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalVariant, HabitFrequency, RecurrenceRule};
    use crate::occurrences;
    use crate::test_utils::setup_test_db;

    const OWNER: i64 = 1;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, end: NaiveTime) -> Slot {
        Slot { start, end }
    }

    // 2025-03-10 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn fixed_task(conn: &Connection, title: &str, start: NaiveTime, end: NaiveTime) -> Task {
        let mut task = Task::new(OWNER, title);
        task.is_fixed = true;
        task.scheduled_start = Some(monday().and_time(start));
        task.scheduled_end = Some(monday().and_time(end));
        task.save(conn).unwrap();
        task
    }

    #[test]
    fn test_free_slots_empty_day_is_full_window() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(6, 0), t(23, 0))]);
    }

    #[test]
    fn test_free_slots_around_one_block() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut block = TimeBlock::new(OWNER, "Work", t(9, 0), t(12, 0), vec![1]);
        block.save(conn).unwrap();

        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(6, 0), t(9, 0)), slot(t(12, 0), t(23, 0))]);
    }

    #[test]
    fn test_free_slots_fully_tiled_day_is_empty() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut morning = TimeBlock::new(OWNER, "Morning", t(6, 0), t(14, 0), vec![1]);
        morning.save(conn).unwrap();
        let mut evening = TimeBlock::new(OWNER, "Evening", t(14, 0), t(23, 0), vec![1]);
        evening.save(conn).unwrap();

        assert!(free_slots(conn, OWNER, monday()).unwrap().is_empty());
    }

    #[test]
    fn test_free_slots_merges_overlaps() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut a = TimeBlock::new(OWNER, "A", t(9, 0), t(12, 0), vec![1]);
        a.save(conn).unwrap();
        let mut b = TimeBlock::new(OWNER, "B", t(11, 0), t(13, 0), vec![1]);
        b.save(conn).unwrap();
        // Contained entirely within A.
        let mut c = TimeBlock::new(OWNER, "C", t(10, 0), t(11, 0), vec![1]);
        c.save(conn).unwrap();

        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(6, 0), t(9, 0)), slot(t(13, 0), t(23, 0))]);
    }

    #[test]
    fn test_free_slots_includes_fixed_tasks() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        fixed_task(conn, "Dentist", t(8, 0), t(9, 0));

        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(6, 0), t(8, 0)), slot(t(9, 0), t(23, 0))]);
    }

    #[test]
    fn test_busy_interval_outside_window_is_ignored() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        // Sleep crosses the window start.
        let mut sleep = TimeBlock::new(OWNER, "Sleep", t(0, 0), t(7, 0), vec![1]);
        sleep.save(conn).unwrap();

        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(7, 0), t(23, 0))]);
    }

    #[test]
    fn test_cross_midnight_task_does_not_invert_the_sweep() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        // Ends at 01:00 the next day: no window on this day's timeline.
        let mut task = Task::new(OWNER, "Night shift");
        task.is_fixed = true;
        task.scheduled_start = Some(monday().and_time(t(22, 0)));
        task.scheduled_end = Some(monday().succ_opt().unwrap().and_time(t(1, 0)));
        task.save(conn).unwrap();

        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(6, 0), t(23, 0))]);
    }

    #[test]
    fn test_skipped_occurrence_releases_the_window() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut task = Task::new(OWNER, "Standup");
        task.is_fixed = true;
        task.is_recurring = true;
        task.recurrence_rule = Some(RecurrenceRule::Daily);
        task.scheduled_start = Some(monday().and_time(t(9, 0)));
        task.scheduled_end = Some(monday().and_time(t(10, 0)));
        task.save(conn).unwrap();

        assert_eq!(free_slots(conn, OWNER, monday()).unwrap().len(), 2);

        occurrences::mark_skipped(conn, OWNER, task.id.unwrap(), monday(), None).unwrap();
        let slots = free_slots(conn, OWNER, monday()).unwrap();
        assert_eq!(slots, vec![slot(t(6, 0), t(23, 0))]);
    }

    #[test]
    fn test_greedy_packer_consumes_slots_in_order() {
        let slots = vec![slot(t(6, 0), t(7, 0)), slot(t(12, 0), t(23, 0))];
        let items = vec![
            PlanItem {
                kind: ItemKind::Task,
                id: 1,
                title: "First".into(),
                minutes: 30,
            },
            PlanItem {
                kind: ItemKind::Task,
                id: 2,
                title: "Second".into(),
                minutes: 30,
            },
        ];

        let assignments = GreedyPacker.pack(&slots, &items);
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].start, t(6, 0));
        assert_eq!(assignments[0].end, t(6, 30));
        // Same slot, partially consumed.
        assert_eq!(assignments[1].start, t(6, 30));
    }

    #[test]
    fn test_greedy_packer_misfit_advances_and_retries() {
        let slots = vec![slot(t(6, 0), t(6, 45)), slot(t(12, 0), t(14, 0))];
        let items = vec![PlanItem {
            kind: ItemKind::Task,
            id: 1,
            title: "Long".into(),
            minutes: 90,
        }];

        let assignments = GreedyPacker.pack(&slots, &items);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].start, t(12, 0));
        assert_eq!(assignments[0].end, t(13, 30));
    }

    #[test]
    fn test_greedy_packer_never_searches_backward() {
        let slots = vec![slot(t(6, 0), t(7, 0)), slot(t(12, 0), t(12, 30))];
        let items = vec![
            PlanItem {
                kind: ItemKind::Task,
                id: 1,
                title: "Big".into(),
                minutes: 90,
            },
            PlanItem {
                kind: ItemKind::Task,
                id: 2,
                title: "Small".into(),
                minutes: 30,
            },
        ];

        // Big fits nowhere; the cursor is already past the first slot
        // when Small is considered, so only the second slot remains.
        let assignments = GreedyPacker.pack(&slots, &items);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].id, 2);
        assert_eq!(assignments[0].start, t(12, 0));
    }

    #[test]
    fn test_greedy_packer_empty_slots_assigns_nothing() {
        let items = vec![PlanItem {
            kind: ItemKind::Task,
            id: 1,
            title: "Anything".into(),
            minutes: 30,
        }];
        assert!(GreedyPacker.pack(&[], &items).is_empty());
    }

    #[test]
    fn test_reschedule_persists_task_placements() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut block = TimeBlock::new(OWNER, "Work", t(6, 0), t(12, 0), vec![1]);
        block.save(conn).unwrap();

        let mut task = Task::new(OWNER, "Write report");
        task.deadline = Some(monday());
        task.estimated_minutes = Some(60);
        task.save(conn).unwrap();

        let assignments = reschedule_flexible(conn, OWNER, monday()).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].start, t(12, 0));

        let found = Task::find_by_id(conn, task.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert_eq!(found.scheduled_start, Some(monday().and_time(t(12, 0))));
        assert_eq!(found.scheduled_end, Some(monday().and_time(t(13, 0))));
    }

    #[test]
    fn test_reschedule_orders_tasks_before_habits() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut habit = Goal::new_habit(OWNER, "Stretch", HabitFrequency::Daily, vec![]);
        if let GoalVariant::Habit(ref mut h) = habit.variant {
            h.duration_minutes = Some(15);
        }
        habit.save(conn).unwrap();

        let mut task = Task::new(OWNER, "Errand");
        task.deadline = Some(monday());
        task.save(conn).unwrap();

        let assignments = reschedule_flexible(conn, OWNER, monday()).unwrap();
        let kinds: Vec<_> = assignments.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ItemKind::Task, ItemKind::Habit]);

        // Default 30 minutes for the unestimated task, then the habit.
        assert_eq!(assignments[0].start, t(6, 0));
        assert_eq!(assignments[0].end, t(6, 30));
        assert_eq!(assignments[1].start, t(6, 30));
        assert_eq!(assignments[1].end, t(6, 45));
    }

    #[test]
    fn test_reschedule_skips_habits_not_scheduled_today() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        // Tuesday-only habit on a Monday plan.
        let mut habit = Goal::new_habit(OWNER, "Swim", HabitFrequency::Custom, vec![2]);
        habit.save(conn).unwrap();

        assert!(reschedule_flexible(conn, OWNER, monday()).unwrap().is_empty());
    }

    #[test]
    fn test_reschedule_habit_placement_is_not_persisted() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut habit = Goal::new_habit(OWNER, "Read", HabitFrequency::Daily, vec![]);
        habit.save(conn).unwrap();

        let assignments = reschedule_flexible(conn, OWNER, monday()).unwrap();
        assert_eq!(assignments.len(), 1);

        // Nothing changed on the goal row.
        let found = Goal::find_by_id(conn, habit.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert!(found.variant.habit().unwrap().reminder_time.is_none());
    }

    #[test]
    fn test_reschedule_leaves_unfittable_items_unscheduled() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        // 6:00-22:45 busy: 15 free minutes at the end of the day.
        let mut block = TimeBlock::new(OWNER, "Busy", t(6, 0), t(22, 45), vec![1]);
        block.save(conn).unwrap();

        let mut task = Task::new(OWNER, "Hour of work");
        task.deadline = Some(monday());
        task.estimated_minutes = Some(60);
        task.save(conn).unwrap();

        let assignments = reschedule_flexible(conn, OWNER, monday()).unwrap();
        assert!(assignments.is_empty());

        let found = Task::find_by_id(conn, task.id.unwrap(), OWNER)
            .unwrap()
            .unwrap();
        assert!(found.scheduled_start.is_none());
    }

    #[test]
    fn test_custom_window_config() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let config = PlannerConfig {
            day_start: t(8, 0),
            day_end: t(20, 0),
        };
        let slots = free_slots_with(conn, OWNER, monday(), &config).unwrap();
        assert_eq!(slots, vec![slot(t(8, 0), t(20, 0))]);
    }
}
