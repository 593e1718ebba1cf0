// src/constants.rs

/// Default start of the plannable day window (hour, 24h clock).
pub const DAY_START_HOUR: u32 = 6;

/// Default end of the plannable day window (hour, 24h clock).
pub const DAY_END_HOUR: u32 = 23;

/// Duration assumed for a flexible item with no estimate, in minutes.
pub const DEFAULT_ITEM_MINUTES: i64 = 30;

/// How many habit log rows a streak recompute reads. Older history cannot
/// affect a streak walked backward from the as-of date.
pub const STREAK_LOG_WINDOW: u32 = 365;

/// Lowest task priority (0 is the most urgent).
pub const MAX_PRIORITY: i64 = 3;

/// Progress values are percentages.
pub const MAX_PROGRESS: i64 = 100;

/// Maximum goal/task/time-block title length.
pub const MAX_TITLE_LEN: usize = 200;
