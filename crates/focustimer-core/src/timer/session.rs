use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mode::TimerMode;

/// One interval, either in flight or persisted in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Planned length in seconds.
    pub duration: u64,
    #[serde(rename = "type")]
    pub mode: TimerMode,
    pub completed: bool,
}

impl TimerSession {
    /// Begin a new in-flight session. The id is a UUID v7, so ids sort by
    /// creation time.
    pub fn begin(mode: TimerMode, duration: u64, at: DateTime<Utc>) -> Self {
        let ts = uuid::Timestamp::from_unix(
            uuid::NoContext,
            at.timestamp().max(0) as u64,
            at.timestamp_subsec_nanos(),
        );
        Self {
            id: Uuid::new_v7(ts).to_string(),
            date: at,
            duration,
            mode,
            completed: false,
        }
    }

    pub fn is_completed_focus(&self) -> bool {
        self.mode == TimerMode::Focus && self.completed
    }
}
