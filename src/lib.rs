//! Progress & scheduling engine for a personal productivity tracker.
//!
//! The crate owns four pieces of real logic, everything else is storage:
//!
//! - [`streak`] — habit continuity derived from a sparse log of daily
//!   check-ins.
//! - [`progress`] — 0–100 completion for projects (rollup from children)
//!   and targets (additive over measurement entries).
//! - [`occurrences`] — per-date instances of recurring tasks and their
//!   success-rate statistics.
//! - [`planner`] — free time slots for a day and greedy placement of
//!   flexible tasks and habits into them.
//!
//! The engine is synchronous and embeds its own SQLite persistence; all
//! operations take an owner id and explicit dates, never an ambient clock
//! or session state. The conversational front-end, rendering, and
//! translations live elsewhere.

pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod occurrences;
pub mod planner;
pub mod progress;
pub mod streak;
pub mod validation;

#[cfg(test)]
mod test_utils;

pub use error::{EngineError, Result};
