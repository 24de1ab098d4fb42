//! Daily activity streak.
//!
//! A day counts once it contains at least one completed focus session.
//! Days are compared at date granularity; the caller decides which timezone
//! `today` comes from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
}

/// Outcome of [`evaluate_streak`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// No prior activity: the streak starts at 1.
    Started,
    /// Already counted today, or `today` precedes the last active day.
    Unchanged,
    /// `today` is the day after the last active day.
    Extended,
    /// A gap of more than one day: the streak restarts at 1.
    Reset,
}

impl StreakChange {
    pub fn updated(self) -> bool {
        !matches!(self, StreakChange::Unchanged)
    }
}

/// Classify a new day of activity against the last counted day.
pub fn evaluate_streak(last_active_date: Option<NaiveDate>, today: NaiveDate) -> StreakChange {
    let Some(last) = last_active_date else {
        return StreakChange::Started;
    };

    match (today - last).num_days() {
        1 => StreakChange::Extended,
        gap if gap > 1 => StreakChange::Reset,
        // Same day, or the clock moved backwards. Never regress.
        _ => StreakChange::Unchanged,
    }
}

impl DailyStreak {
    /// Apply a change computed for `today`. Returns whether anything changed.
    pub fn apply(&mut self, change: StreakChange, today: NaiveDate) -> bool {
        match change {
            StreakChange::Unchanged => return false,
            StreakChange::Started | StreakChange::Reset => self.current_streak = 1,
            StreakChange::Extended => self.current_streak = self.current_streak.saturating_add(1),
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_active_date = Some(today);
        true
    }

    /// Count activity on `today`.
    pub fn record_activity(&mut self, today: NaiveDate) -> bool {
        let change = evaluate_streak(self.last_active_date, today);
        self.apply(change, today)
    }
}
