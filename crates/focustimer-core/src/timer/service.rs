//! Async driver for a shared [`TimerEngine`].
//!
//! The service owns the one-second tick source. A ticker task exists only
//! while the engine is running. A command that moves the engine into
//! `Running` replaces whatever ticker handle is stored; a command that leaves
//! it anywhere else aborts it. Ticks and commands take the same lock, so a
//! command issued at a tick boundary sees the post-tick state and a tick
//! never lands after the engine has left `Running`.
//!
//! Events are broadcast while the engine lock is still held. A subscriber
//! that takes the lock after receiving an event therefore finds the rest of
//! that batch already queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time;

use super::engine::TimerEngine;
use super::mode::TimerStatus;
use crate::events::{Event, TimerSnapshot};
use crate::storage::KvStore;

const EVENT_CAPACITY: usize = 64;
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

pub struct TimerService<S: KvStore + Send + 'static> {
    engine: Arc<Mutex<TimerEngine<S>>>,
    events: broadcast::Sender<Event>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
}

impl<S: KvStore + Send + 'static> TimerService<S> {
    pub fn new(engine: TimerEngine<S>) -> Self {
        Self::with_tick_interval(engine, Duration::from_secs(1))
    }

    /// Tick every `tick_interval` instead of every second. Intervals below
    /// one millisecond are raised to it.
    pub fn with_tick_interval(engine: TimerEngine<S>, tick_interval: Duration) -> Self {
        if tick_interval < MIN_TICK_INTERVAL {
            tracing::warn!(?tick_interval, "tick interval too small, using 1ms");
        }
        let tick_interval = tick_interval.max(MIN_TICK_INTERVAL);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            events,
            ticker: Mutex::new(None),
            tick_interval,
        }
    }

    /// Receive every event produced from now on, including tick completions.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Shared handle for read access from other presentation layers.
    pub fn engine(&self) -> Arc<Mutex<TimerEngine<S>>> {
        Arc::clone(&self.engine)
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn start(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::start).await
    }

    pub async fn pause(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::pause).await
    }

    pub async fn reset(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::reset).await
    }

    pub async fn skip(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::skip).await
    }

    pub async fn toggle_mode(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::toggle_mode).await
    }

    pub async fn toggle_mute(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::toggle_mute).await
    }

    pub async fn clear_history(&self) -> Vec<Event> {
        self.dispatch(TimerEngine::clear_history).await
    }

    pub async fn set_focus_duration(&self, secs: u64) {
        self.engine.lock().await.set_focus_duration(secs);
    }

    pub async fn set_break_duration(&self, secs: u64) {
        self.engine.lock().await.set_break_duration(secs);
    }

    pub async fn set_long_break_duration(&self, secs: u64) {
        self.engine.lock().await.set_long_break_duration(secs);
    }

    pub async fn set_sessions_till_long_break(&self, n: u32) {
        self.engine.lock().await.set_sessions_till_long_break(n);
    }

    /// Reset the engine and stop the tick source.
    pub async fn shutdown(&self) {
        self.dispatch(TimerEngine::reset).await;
        self.stop_ticker().await;
    }

    /// Whether a ticker task is currently live.
    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn dispatch(&self, command: impl FnOnce(&mut TimerEngine<S>) -> Vec<Event>) -> Vec<Event> {
        // Hold the ticker slot across the command so concurrent commands
        // cannot interleave their ticker adjustments.
        let mut ticker = self.ticker.lock().await;
        let mut engine = self.engine.lock().await;
        let before = engine.status();
        let events = command(&mut *engine);
        let after = engine.status();

        if after == TimerStatus::Running {
            // A finishing ticker may not have returned yet; never reuse it.
            if before != TimerStatus::Running || ticker.is_none() {
                if let Some(stale) = ticker.take() {
                    stale.abort();
                }
                *ticker = Some(self.spawn_ticker());
            }
        } else if let Some(handle) = ticker.take() {
            handle.abort();
        }

        publish(&self.events, &events);
        drop(engine);
        drop(ticker);
        events
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        let period = self.tick_interval;
        tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut guard = engine.lock().await;
                if guard.status() != TimerStatus::Running {
                    break;
                }
                let produced = guard.tick();
                publish(&events, &produced);
                if guard.status() != TimerStatus::Running {
                    break;
                }
            }
            tracing::debug!("ticker stopped");
        })
    }

    async fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

impl<S: KvStore + Send + 'static> Drop for TimerService<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

fn publish(sender: &broadcast::Sender<Event>, events: &[Event]) {
    for event in events {
        // No subscribers is fine.
        let _ = sender.send(event.clone());
    }
}
