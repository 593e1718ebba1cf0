pub mod goal;
pub mod goal_entry;
pub mod habit_log;
pub mod occurrence;
pub mod task;
pub mod time_block;

pub use goal::{Goal, GoalStatus, GoalVariant, HabitData, HabitFrequency, MetricData, TargetData};
pub use goal_entry::GoalEntry;
pub use habit_log::{HabitLog, LogStatus};
pub use occurrence::{Occurrence, OccurrenceStatus};
pub use task::{RecurrenceRule, Task};
pub use time_block::TimeBlock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::types::Type;

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const TIME_FMT: &str = "%H:%M";
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Comma-join ISO weekday numbers for storage ("1,2,3,4,5").
pub(crate) fn join_days(days: &[u32]) -> String {
    days.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a stored weekday list; malformed entries are dropped.
pub(crate) fn parse_days(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .collect()
}

fn conversion_err(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Error for a stored enum string no variant matches. The schema CHECK
/// constraints make this unreachable for rows this crate wrote.
pub(crate) fn bad_enum(idx: usize, what: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown {what}: {raw}").into(),
    )
}

pub(crate) fn date_from_sql(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn time_from_sql(idx: usize, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FMT).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn datetime_from_sql(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FMT).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn opt_date_from_sql(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| date_from_sql(idx, &s)).transpose()
}

pub(crate) fn opt_time_from_sql(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveTime>> {
    raw.map(|s| time_from_sql(idx, &s)).transpose()
}

pub(crate) fn opt_datetime_from_sql(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.map(|s| datetime_from_sql(idx, &s)).transpose()
}

pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub(crate) fn time_to_sql(time: NaiveTime) -> String {
    time.format(TIME_FMT).to_string()
}

pub(crate) fn datetime_to_sql(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}
