use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerStatus};

/// Every engine command returns the events it produced.
/// The service broadcasts them; the presentation layer renders toasts and
/// sounds from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session_id: String,
        mode: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_left: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        time_left: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        time_left: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: TimerMode,
        time_left: u64,
        at: DateTime<Utc>,
    },
    /// A focus interval finished (naturally or skipped) and was recorded.
    FocusCompleted {
        session_id: Option<String>,
        long_break_next: bool,
        next_mode: TimerMode,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        was_long: bool,
        at: DateTime<Utc>,
    },
    AchievementUnlocked {
        id: String,
        title: String,
        description: String,
        at: DateTime<Utc>,
    },
    MuteToggled {
        muted: bool,
        at: DateTime<Utc>,
    },
    HistoryCleared {
        at: DateTime<Utc>,
    },
    /// A store write failed. In-memory state already reflects the change.
    PersistenceFailed {
        record: String,
        message: String,
        at: DateTime<Utc>,
    },
}

/// Audio hint attached to a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    FocusComplete,
    BreakComplete,
    LongBreakComplete,
    AchievementUnlocked,
}

impl Event {
    /// The cue this event implies, ignoring mute.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            Event::FocusCompleted { .. } => Some(Cue::FocusComplete),
            Event::BreakCompleted { was_long: true, .. } => Some(Cue::LongBreakComplete),
            Event::BreakCompleted { was_long: false, .. } => Some(Cue::BreakComplete),
            Event::AchievementUnlocked { .. } => Some(Cue::AchievementUnlocked),
            _ => None,
        }
    }

    /// Title and body for a toast, for the events users are told about.
    pub fn toast(&self) -> Option<(String, String)> {
        match self {
            Event::FocusCompleted { long_break_next, .. } => Some((
                "Focus session completed!".to_string(),
                if *long_break_next {
                    "Time for a longer break!".to_string()
                } else {
                    "Time for a break.".to_string()
                },
            )),
            Event::BreakCompleted { was_long, .. } => Some((
                if *was_long {
                    "Long break completed!".to_string()
                } else {
                    "Break time is over.".to_string()
                },
                "Ready to focus again?".to_string(),
            )),
            Event::AchievementUnlocked {
                title, description, ..
            } => Some((format!("Achievement Unlocked: {title}"), description.clone())),
            _ => None,
        }
    }
}

/// Observable engine state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub mode: TimerMode,
    pub time_left: u64,
    pub total_secs: u64,
    pub progress: f64,
    pub is_muted: bool,
    pub focus_sessions_since_long_break: u32,
    pub sessions_completed: u32,
}
