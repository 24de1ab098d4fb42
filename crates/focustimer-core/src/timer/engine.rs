//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It owns no thread: one call to
//! [`TimerEngine::tick`] is one elapsed second, delivered by the host (see
//! [`super::service::TimerService`] for the tokio driver).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running | Paused -> Completed -> Idle   (same call)
//! any -> Idle                              (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(SessionStore::open(MemoryStore::new()), TimerSettings::default());
//! engine.start();
//! // Once per second:
//! let events = engine.tick(); // completion events when the interval ends
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::mode::{TimerMode, TimerSettings, TimerStatus};
use super::session::TimerSession;
use crate::achievements::{evaluate_achievements, newly_unlocked, Achievement, DailyStreak};
use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::events::{Cue, Event, TimerSnapshot};
use crate::storage::{Config, KvStore, SessionStore};

/// Core timer engine.
pub struct TimerEngine<S: KvStore> {
    store: SessionStore<S>,
    clock: Box<dyn Clock>,
    settings: TimerSettings,
    status: TimerStatus,
    mode: TimerMode,
    /// Seconds remaining in the current interval.
    time_left: u64,
    in_flight: Option<TimerSession>,
    focus_since_long_break: u32,
    sessions_completed: u32,
    muted: bool,
}

impl<S: KvStore> TimerEngine<S> {
    /// Create an idle engine in focus mode, using the system clock.
    pub fn new(store: SessionStore<S>, settings: TimerSettings) -> Self {
        Self::with_clock(store, settings, SystemClock)
    }

    /// Create an idle engine in focus mode that reads time from `clock`.
    pub fn with_clock(store: SessionStore<S>, settings: TimerSettings, clock: impl Clock + 'static) -> Self {
        let mode = TimerMode::Focus;
        Self {
            store,
            clock: Box::new(clock),
            time_left: settings.duration_for(mode),
            settings,
            status: TimerStatus::Idle,
            mode,
            in_flight: None,
            focus_since_long_break: 0,
            sessions_completed: 0,
            muted: false,
        }
    }

    /// Build from user configuration: durations, threshold and mute.
    pub fn from_config(store: SessionStore<S>, config: &Config) -> Self {
        let mut engine = Self::new(store, config.timer_settings());
        engine.muted = config.notifications.muted;
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current lifecycle state.
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Interval kind the next `start` runs, or the one in flight.
    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Seconds remaining in the current interval.
    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    /// Durations and long-break threshold in effect.
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Whether cues are suppressed.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// The session started by `start`, until it completes or is reset.
    pub fn in_flight(&self) -> Option<&TimerSession> {
        self.in_flight.as_ref()
    }

    /// Completed focus sessions since the last long break was scheduled.
    pub fn focus_sessions_since_long_break(&self) -> u32 {
        self.focus_since_long_break
    }

    /// Focus intervals completed by this engine instance.
    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    /// History, most recent first.
    pub fn sessions(&self) -> &[TimerSession] {
        self.store.sessions()
    }

    /// Persisted daily streak.
    pub fn streak(&self) -> &DailyStreak {
        self.store.streak()
    }

    /// Achievements in catalog order.
    pub fn achievements(&self) -> &[Achievement] {
        self.store.achievements()
    }

    /// Planned length of the current interval. While an interval is in
    /// flight this is the duration it started with.
    pub fn total_secs(&self) -> u64 {
        self.in_flight
            .as_ref()
            .map(|s| s.duration)
            .unwrap_or_else(|| self.settings.duration_for(self.mode))
    }

    /// 0.0 .. 100.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        (100.0 * (1.0 - self.time_left as f64 / total as f64)).clamp(0.0, 100.0)
    }

    /// Serializable view of the observable state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            status: self.status,
            mode: self.mode,
            time_left: self.time_left,
            total_secs: self.total_secs(),
            progress: self.progress(),
            is_muted: self.muted,
            focus_sessions_since_long_break: self.focus_since_long_break,
            sessions_completed: self.sessions_completed,
        }
    }

    /// The audio cue to play for `event`, or `None` when muted.
    pub fn cue_for(&self, event: &Event) -> Option<Cue> {
        if self.muted {
            return None;
        }
        event.cue()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Vec<Event> {
        match self.status {
            TimerStatus::Idle => {
                let duration = self.settings.duration_for(self.mode);
                let session = TimerSession::begin(self.mode, duration, self.clock.now());
                debug!(mode = ?self.mode, duration, id = %session.id, "timer started");
                let event = Event::TimerStarted {
                    session_id: session.id.clone(),
                    mode: self.mode,
                    duration_secs: duration,
                    at: self.clock.now(),
                };
                self.in_flight = Some(session);
                self.status = TimerStatus::Running;
                vec![event]
            }
            TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                debug!(time_left = self.time_left, "timer resumed");
                vec![Event::TimerResumed {
                    time_left: self.time_left,
                    at: self.clock.now(),
                }]
            }
            TimerStatus::Running | TimerStatus::Completed => Vec::new(),
        }
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }
        self.status = TimerStatus::Paused;
        debug!(time_left = self.time_left, "timer paused");
        vec![Event::TimerPaused {
            time_left: self.time_left,
            at: self.clock.now(),
        }]
    }

    /// Abandon the current interval. The in-flight session is dropped.
    pub fn reset(&mut self) -> Vec<Event> {
        if let Some(session) = self.in_flight.take() {
            debug!(id = %session.id, "in-flight session discarded");
        }
        self.status = TimerStatus::Idle;
        self.time_left = self.settings.duration_for(self.mode);
        vec![Event::TimerReset {
            mode: self.mode,
            time_left: self.time_left,
            at: self.clock.now(),
        }]
    }

    /// Complete the current interval now, as if it had run out.
    pub fn skip(&mut self) -> Vec<Event> {
        match self.status {
            TimerStatus::Running | TimerStatus::Paused => self.complete(),
            _ => Vec::new(),
        }
    }

    /// Cycle focus -> break -> longBreak -> focus. Idle only.
    pub fn toggle_mode(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Idle {
            return Vec::new();
        }
        self.mode = self.mode.cycled();
        self.time_left = self.settings.duration_for(self.mode);
        vec![Event::ModeChanged {
            mode: self.mode,
            time_left: self.time_left,
            at: self.clock.now(),
        }]
    }

    /// One elapsed second. Completion runs within the same call.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            return self.complete();
        }
        Vec::new()
    }

    pub fn set_focus_duration(&mut self, secs: u64) {
        self.set_duration(TimerMode::Focus, secs);
    }

    pub fn set_break_duration(&mut self, secs: u64) {
        self.set_duration(TimerMode::Break, secs);
    }

    pub fn set_long_break_duration(&mut self, secs: u64) {
        self.set_duration(TimerMode::LongBreak, secs);
    }

    pub fn set_sessions_till_long_break(&mut self, n: u32) {
        if n == 0 {
            warn!("ignoring zero sessions-till-long-break");
            return;
        }
        self.settings.sessions_till_long_break = n;
    }

    pub fn toggle_mute(&mut self) -> Vec<Event> {
        self.muted = !self.muted;
        vec![Event::MuteToggled {
            muted: self.muted,
            at: self.clock.now(),
        }]
    }

    /// Empty the history. Streak and achievements are kept.
    pub fn clear_history(&mut self) -> Vec<Event> {
        let mut events = vec![Event::HistoryCleared { at: self.clock.now() }];
        if let Err(e) = self.store.clear_history() {
            events.push(persistence_failed("sessions", e, self.clock.now()));
        }
        info!("session history cleared");
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_duration(&mut self, mode: TimerMode, secs: u64) {
        if secs == 0 {
            warn!(?mode, "ignoring zero duration");
            return;
        }
        match mode {
            TimerMode::Focus => self.settings.focus_secs = secs,
            TimerMode::Break => self.settings.break_secs = secs,
            TimerMode::LongBreak => self.settings.long_break_secs = secs,
        }
        if self.status == TimerStatus::Idle && self.mode == mode {
            self.time_left = secs;
        }
    }

    fn complete(&mut self) -> Vec<Event> {
        self.status = TimerStatus::Completed;
        let finished = self.mode;
        let session = self.in_flight.take();
        let mut events = Vec::new();

        let next = match finished {
            TimerMode::Focus => {
                self.focus_since_long_break += 1;
                self.sessions_completed += 1;
                let long_break_next =
                    self.focus_since_long_break >= self.settings.sessions_till_long_break;
                let next = if long_break_next {
                    self.focus_since_long_break = 0;
                    TimerMode::LongBreak
                } else {
                    TimerMode::Break
                };
                info!(long_break_next, "focus session completed");
                events.push(Event::FocusCompleted {
                    session_id: session.as_ref().map(|s| s.id.clone()),
                    long_break_next,
                    next_mode: next,
                    at: self.clock.now(),
                });
                if let Some(session) = session {
                    self.record_focus(session, &mut events);
                }
                next
            }
            TimerMode::Break | TimerMode::LongBreak => {
                let was_long = finished == TimerMode::LongBreak;
                info!(was_long, "break completed");
                events.push(Event::BreakCompleted {
                    was_long,
                    at: self.clock.now(),
                });
                TimerMode::Focus
            }
        };

        self.mode = next;
        self.time_left = self.settings.duration_for(next);
        self.status = TimerStatus::Idle;
        events
    }

    /// Persist a finished focus session, then update streak and achievements.
    fn record_focus(&mut self, session: TimerSession, events: &mut Vec<Event>) {
        let session = TimerSession {
            completed: true,
            ..session
        };
        if let Err(e) = self.store.append_session(session) {
            events.push(persistence_failed("sessions", e, self.clock.now()));
        }

        let mut streak = self.store.streak().clone();
        if streak.record_activity(self.clock.today()) {
            debug!(current = streak.current_streak, longest = streak.longest_streak, "streak updated");
            if let Err(e) = self.store.save_streak(streak.clone()) {
                events.push(persistence_failed("streak", e, self.clock.now()));
            }
        }

        let before = self.store.achievements().to_vec();
        let after = evaluate_achievements(
            self.store.sessions(),
            streak.current_streak,
            &before,
            self.clock.now(),
        );
        let unlocked: Vec<Event> = newly_unlocked(&before, &after)
            .into_iter()
            .map(|a| {
                info!(id = %a.id, "achievement unlocked");
                Event::AchievementUnlocked {
                    id: a.id.clone(),
                    title: a.title.clone(),
                    description: a.description.clone(),
                    at: self.clock.now(),
                }
            })
            .collect();
        if unlocked.is_empty() {
            return;
        }
        if let Err(e) = self.store.save_achievements(after) {
            events.push(persistence_failed("achievements", e, self.clock.now()));
        }
        events.extend(unlocked);
    }
}

fn persistence_failed(record: &str, err: CoreError, at: DateTime<Utc>) -> Event {
    warn!(record, error = %err, "failed to persist record");
    Event::PersistenceFailed {
        record: record.to_string(),
        message: err.to_string(),
        at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::DatabaseError;
    use crate::storage::MemoryStore;
    use chrono::{NaiveDate, TimeZone};

    fn settings() -> TimerSettings {
        TimerSettings {
            focus_secs: 5,
            break_secs: 2,
            long_break_secs: 3,
            sessions_till_long_break: 2,
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
    }

    fn engine() -> TimerEngine<MemoryStore> {
        TimerEngine::with_clock(SessionStore::open(MemoryStore::new()), settings(), clock())
    }

    fn run_out<S: KvStore>(engine: &mut TimerEngine<S>) -> Vec<Event> {
        engine.start();
        let mut events = Vec::new();
        while engine.status() == TimerStatus::Running {
            events.extend(engine.tick());
        }
        events
    }

    /// Store whose writes always fail.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, DatabaseError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), DatabaseError> {
            Err(DatabaseError::Locked)
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = engine();
        assert_eq!(engine.status(), TimerStatus::Idle);

        assert!(matches!(engine.start().as_slice(), [Event::TimerStarted { .. }]));
        assert_eq!(engine.status(), TimerStatus::Running);

        assert!(matches!(engine.pause().as_slice(), [Event::TimerPaused { .. }]));
        assert_eq!(engine.status(), TimerStatus::Paused);

        assert!(matches!(engine.start().as_slice(), [Event::TimerResumed { .. }]));
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    #[test]
    fn start_twice_is_idempotent() {
        let mut engine = engine();
        engine.start();
        let id = engine.in_flight().unwrap().id.clone();
        assert!(engine.start().is_empty());
        assert_eq!(engine.in_flight().unwrap().id, id);
        assert_eq!(engine.status(), TimerStatus::Running);
    }

    #[test]
    fn resume_keeps_in_flight_session() {
        let mut engine = engine();
        engine.start();
        let id = engine.in_flight().unwrap().id.clone();
        engine.tick();
        engine.pause();
        engine.start();
        assert_eq!(engine.in_flight().unwrap().id, id);
        assert_eq!(engine.time_left(), 4);
    }

    #[test]
    fn paused_engine_ignores_ticks() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.pause();
        engine.tick();
        engine.tick();
        assert_eq!(engine.time_left(), 4);
    }

    #[test]
    fn progress_tracks_ticks() {
        let mut engine = engine();
        assert_eq!(engine.progress(), 0.0);
        engine.start();
        engine.tick();
        assert!((engine.progress() - 20.0).abs() < 1e-9);
        engine.tick();
        engine.tick();
        assert!((engine.progress() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn focus_completion_records_one_session() {
        let mut engine = engine();
        let events = run_out(&mut engine);

        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.mode(), TimerMode::Break);
        assert_eq!(engine.time_left(), 2);
        assert_eq!(engine.progress(), 0.0);
        assert!(engine.in_flight().is_none());
        assert_eq!(engine.sessions().len(), 1);
        assert!(engine.sessions()[0].completed);
        assert_eq!(engine.sessions()[0].duration, 5);
        assert!(matches!(
            events[0],
            Event::FocusCompleted {
                long_break_next: false,
                next_mode: TimerMode::Break,
                ..
            }
        ));
    }

    #[test]
    fn break_completion_records_nothing() {
        let mut engine = engine();
        engine.toggle_mode();
        let events = run_out(&mut engine);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::BreakCompleted { was_long: false, .. }));
        assert_eq!(engine.mode(), TimerMode::Focus);
        assert_eq!(engine.time_left(), 5);
        assert!(engine.sessions().is_empty());
        assert_eq!(engine.streak(), &DailyStreak::default());
    }

    #[test]
    fn reset_discards_in_flight_session() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.tick();
        engine.reset();
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.mode(), TimerMode::Focus);
        assert_eq!(engine.time_left(), 5);
        assert_eq!(engine.progress(), 0.0);
        assert!(engine.in_flight().is_none());
        assert!(engine.sessions().is_empty());
    }

    #[test]
    fn skip_completes_like_expiry() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.pause();
        let events = engine.skip();
        assert!(matches!(events[0], Event::FocusCompleted { .. }));
        assert_eq!(engine.sessions().len(), 1);
        assert_eq!(engine.sessions()[0].duration, 5);
        assert_eq!(engine.mode(), TimerMode::Break);
        assert_eq!(engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn skip_from_idle_is_noop() {
        let mut engine = engine();
        assert!(engine.skip().is_empty());
        assert_eq!(engine.mode(), TimerMode::Focus);
    }

    #[test]
    fn long_break_after_threshold() {
        let mut engine = engine();
        run_out(&mut engine);
        assert_eq!(engine.mode(), TimerMode::Break);
        assert_eq!(engine.focus_sessions_since_long_break(), 1);
        run_out(&mut engine);
        assert_eq!(engine.mode(), TimerMode::Focus);

        let events = run_out(&mut engine);
        assert!(matches!(
            events[0],
            Event::FocusCompleted {
                long_break_next: true,
                ..
            }
        ));
        assert_eq!(engine.mode(), TimerMode::LongBreak);
        assert_eq!(engine.focus_sessions_since_long_break(), 0);
        assert_eq!(engine.time_left(), 3);

        let events = run_out(&mut engine);
        assert!(matches!(events[0], Event::BreakCompleted { was_long: true, .. }));
        assert_eq!(engine.mode(), TimerMode::Focus);
    }

    #[test]
    fn toggle_mode_only_when_idle() {
        let mut engine = engine();
        engine.toggle_mode();
        assert_eq!(engine.mode(), TimerMode::Break);
        assert_eq!(engine.time_left(), 2);
        engine.toggle_mode();
        assert_eq!(engine.mode(), TimerMode::LongBreak);
        engine.start();
        assert!(engine.toggle_mode().is_empty());
        assert_eq!(engine.mode(), TimerMode::LongBreak);
        engine.pause();
        assert!(engine.toggle_mode().is_empty());
    }

    #[test]
    fn duration_setter_updates_idle_current_mode_only() {
        let mut engine = engine();
        engine.set_focus_duration(10);
        assert_eq!(engine.time_left(), 10);
        engine.set_break_duration(7);
        assert_eq!(engine.time_left(), 10);

        engine.start();
        engine.tick();
        engine.set_focus_duration(20);
        assert_eq!(engine.time_left(), 9);
        assert!((engine.progress() - 10.0).abs() < 1e-9);

        engine.reset();
        assert_eq!(engine.time_left(), 20);
    }

    #[test]
    fn zero_values_are_ignored() {
        let mut engine = engine();
        engine.set_focus_duration(0);
        engine.set_sessions_till_long_break(0);
        assert_eq!(engine.settings(), &settings());
        assert_eq!(engine.time_left(), 5);
    }

    #[test]
    fn first_focus_unlocks_and_starts_streak() {
        let mut engine = engine();
        let events = run_out(&mut engine);
        let unlocked: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::AchievementUnlocked { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(unlocked, ["first_focus"]);
        assert_eq!(engine.streak().current_streak, 1);
        assert_eq!(
            engine.streak().last_active_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert!(engine.achievements()[0].unlocked);

        // Second session on the same day unlocks nothing new.
        run_out(&mut engine);
        let events = run_out(&mut engine);
        assert!(!events.iter().any(|e| matches!(e, Event::AchievementUnlocked { .. })));
        assert_eq!(engine.streak().current_streak, 1);
    }

    #[test]
    fn streak_across_days_unlocks_streak_achievement() {
        let clock = clock();
        let mut engine = TimerEngine::with_clock(
            SessionStore::open(MemoryStore::new()),
            settings(),
            clock.clone(),
        );
        for _ in 0..3 {
            engine.start();
            engine.skip();
            engine.reset();
            engine.toggle_mode();
            engine.toggle_mode();
            clock.advance(chrono::Duration::days(1));
        }
        assert_eq!(engine.streak().current_streak, 3);
        assert_eq!(engine.streak().longest_streak, 3);
        assert!(engine.achievements().iter().any(|a| a.id == "focus_streak_3" && a.unlocked));
    }

    #[test]
    fn cues_are_suppressed_when_muted() {
        let mut engine = engine();
        let events = run_out(&mut engine);
        assert_eq!(engine.cue_for(&events[0]), Some(Cue::FocusComplete));
        engine.toggle_mute();
        assert!(engine.is_muted());
        assert!(events.iter().all(|e| engine.cue_for(e).is_none()));
    }

    #[test]
    fn clear_history_keeps_progress() {
        let mut engine = engine();
        run_out(&mut engine);
        let streak = engine.streak().clone();
        let achievements = engine.achievements().to_vec();
        engine.clear_history();
        assert!(engine.sessions().is_empty());
        assert_eq!(engine.streak(), &streak);
        assert_eq!(engine.achievements(), achievements.as_slice());
    }

    #[test]
    fn persistence_failure_does_not_roll_back() {
        let mut engine =
            TimerEngine::with_clock(SessionStore::open(BrokenStore), settings(), clock());
        let events = run_out(&mut engine);
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.mode(), TimerMode::Break);
        assert_eq!(engine.sessions().len(), 1);
        assert_eq!(engine.streak().current_streak, 1);
        let failed: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::PersistenceFailed { record, .. } => Some(record.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(failed, ["sessions", "streak", "achievements"]);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        let snap = engine.snapshot();
        assert_eq!(snap.status, TimerStatus::Running);
        assert_eq!(snap.mode, TimerMode::Focus);
        assert_eq!(snap.time_left, 4);
        assert_eq!(snap.total_secs, 5);
    }
}
