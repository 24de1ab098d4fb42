//! Streak and achievement evaluation.
//!
//! Everything here is pure: callers pass history and the current records
//! and persist whatever comes back.

mod catalog;
mod streak;

pub use catalog::{
    default_achievements, evaluate_achievements, newly_unlocked, normalize, unlock_rule,
    Achievement, UnlockRule,
};
pub use streak::{evaluate_streak, DailyStreak, StreakChange};
