use chrono::NaiveTime;

use crate::constants::*;
use crate::error::EngineError;

/// Validate a title for a goal, task, or time block.
/// Returns the trimmed title if valid.
pub fn validate_title(title: &str) -> Result<&str, EngineError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EngineError::InvalidInput {
            field: "title",
            reason: "cannot be empty".into(),
        });
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(EngineError::InvalidInput {
            field: "title",
            reason: format!("cannot exceed {} characters", MAX_TITLE_LEN),
        });
    }
    Ok(title)
}

/// Validate a list of ISO weekday numbers (1=Monday .. 7=Sunday).
pub fn validate_days(days: &[u32], field: &'static str) -> Result<(), EngineError> {
    for &day in days {
        if !(1..=7).contains(&day) {
            return Err(EngineError::InvalidInput {
                field,
                reason: format!("day must be 1-7, got {}", day),
            });
        }
    }
    Ok(())
}

/// Like [`validate_days`] but rejects an empty list.
pub fn validate_days_nonempty(days: &[u32], field: &'static str) -> Result<(), EngineError> {
    if days.is_empty() {
        return Err(EngineError::InvalidInput {
            field,
            reason: "at least one day required".into(),
        });
    }
    validate_days(days, field)
}

/// Validate a task priority (0=urgent .. 3=low).
pub fn validate_priority(priority: i64) -> Result<(), EngineError> {
    if !(0..=MAX_PRIORITY).contains(&priority) {
        return Err(EngineError::InvalidInput {
            field: "priority",
            reason: format!("must be 0-{}", MAX_PRIORITY),
        });
    }
    Ok(())
}

/// Validate a progress percentage.
pub fn validate_progress(progress: i64) -> Result<(), EngineError> {
    if !(0..=MAX_PROGRESS).contains(&progress) {
        return Err(EngineError::InvalidInput {
            field: "progress",
            reason: format!("must be 0-{}", MAX_PROGRESS),
        });
    }
    Ok(())
}

/// Validate a target value at goal creation. Recompute-time guards for an
/// unset target live in the aggregator, not here.
pub fn validate_target_value(value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::InvalidInput {
            field: "target_value",
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

/// Validate that a metric range is ordered.
pub fn validate_metric_range(min: f64, max: f64) -> Result<(), EngineError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(EngineError::InvalidInput {
            field: "target_range",
            reason: "target_min must not exceed target_max".into(),
        });
    }
    Ok(())
}

/// Validate a duration estimate in minutes.
pub fn validate_minutes(minutes: i64, field: &'static str) -> Result<(), EngineError> {
    if minutes <= 0 {
        return Err(EngineError::InvalidInput {
            field,
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

/// Validate that a time interval is non-empty.
pub fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), EngineError> {
    if start >= end {
        return Err(EngineError::InvalidInput {
            field: "time_range",
            reason: "start must be before end".into(),
        });
    }
    Ok(())
}
