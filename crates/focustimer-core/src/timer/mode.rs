use serde::{Deserialize, Serialize};

/// Interval kind. Serialized as `focus`, `break`, `longBreak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Focus,
    Break,
    LongBreak,
}

impl TimerMode {
    /// Next mode in the manual toggle cycle: focus -> break -> longBreak -> focus.
    pub fn cycled(self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::LongBreak,
            TimerMode::LongBreak => TimerMode::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::Break => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    /// Transitional: completion side effects run while in this status and the
    /// engine is back to `Idle` before the command returns.
    Completed,
}

/// Configured durations (seconds) and the long-break threshold.
///
/// The engine accepts any positive value; range limits belong to
/// [`crate::storage::config::ScheduleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub focus_secs: u64,
    pub break_secs: u64,
    pub long_break_secs: u64,
    pub sessions_till_long_break: u32,
}

impl TimerSettings {
    pub fn duration_for(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus_secs,
            TimerMode::Break => self.break_secs,
            TimerMode::LongBreak => self.long_break_secs,
        }
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            sessions_till_long_break: 4,
        }
    }
}
