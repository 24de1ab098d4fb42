//! Durable session history, streak and achievement records.
//!
//! The store keeps the authoritative in-memory copy and writes the full
//! snapshot of a record through its [`KvStore`] on every mutation. A failed
//! write leaves the in-memory copy updated and returns the error so the
//! caller can report it.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KvStore;
use crate::achievements::{default_achievements, normalize, Achievement, DailyStreak};
use crate::error::Result;
use crate::timer::TimerSession;

pub const SESSIONS_KEY: &str = "sessions";
pub const STREAK_KEY: &str = "streak";
pub const ACHIEVEMENTS_KEY: &str = "achievements";

/// Everything the store loads at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    /// Most recent first.
    pub sessions: Vec<TimerSession>,
    pub streak: DailyStreak,
    pub achievements: Vec<Achievement>,
}

impl Default for LoadedState {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            streak: DailyStreak::default(),
            achievements: default_achievements(),
        }
    }
}

pub struct SessionStore<S: KvStore> {
    kv: S,
    state: LoadedState,
}

impl<S: KvStore> SessionStore<S> {
    /// Wrap a key-value store and load whatever it holds.
    pub fn open(kv: S) -> Self {
        let state = load(&kv);
        Self { kv, state }
    }

    /// Re-read persisted records, falling back to defaults per record.
    pub fn load(&self) -> LoadedState {
        load(&self.kv)
    }

    pub fn sessions(&self) -> &[TimerSession] {
        &self.state.sessions
    }

    pub fn streak(&self) -> &DailyStreak {
        &self.state.streak
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.state.achievements
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Insert at the front of the history and persist the full list.
    pub fn append_session(&mut self, session: TimerSession) -> Result<()> {
        self.state.sessions.insert(0, session);
        write(&mut self.kv, SESSIONS_KEY, &self.state.sessions)
    }

    pub fn save_streak(&mut self, streak: DailyStreak) -> Result<()> {
        self.state.streak = streak;
        write(&mut self.kv, STREAK_KEY, &self.state.streak)
    }

    pub fn save_achievements(&mut self, achievements: Vec<Achievement>) -> Result<()> {
        self.state.achievements = achievements;
        write(&mut self.kv, ACHIEVEMENTS_KEY, &self.state.achievements)
    }

    /// Empty the history. Streak and achievements are untouched.
    pub fn clear_history(&mut self) -> Result<()> {
        self.state.sessions.clear();
        write(&mut self.kv, SESSIONS_KEY, &self.state.sessions)
    }
}

fn load<S: KvStore>(kv: &S) -> LoadedState {
    let sessions = read::<_, Vec<TimerSession>>(kv, SESSIONS_KEY).unwrap_or_default();
    let streak = read::<_, DailyStreak>(kv, STREAK_KEY).unwrap_or_default();
    let achievements = read::<_, Vec<Achievement>>(kv, ACHIEVEMENTS_KEY)
        .map(normalize)
        .unwrap_or_else(default_achievements);

    LoadedState {
        sessions,
        streak,
        achievements,
    }
}

fn read<S: KvStore, T: DeserializeOwned>(kv: &S, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read record, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupt record, using defaults");
            None
        }
    }
}

fn write<S: KvStore, T: Serialize + ?Sized>(kv: &mut S, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    kv.set(key, &json)?;
    Ok(())
}
