//! # Focustimer Core Library
//!
//! This library provides the core logic for the Focustimer focus timer. The
//! CLI binary is a thin presentation layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine cycling focus, break and
//!   long-break intervals. The caller delivers one `tick()` per second.
//! - **Evaluator**: pure streak and achievement derivation.
//! - **Storage**: session history, streak and achievements persisted as JSON
//!   records in a key-value store (SQLite by default), plus TOML configuration.
//! - **Service**: tokio driver that owns the tick source and broadcasts events.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerService`]: Shared engine with a one-second ticker
//! - [`SessionStore`]: Durable records over a [`KvStore`]
//! - [`Config`]: Application configuration management

pub mod achievements;
pub mod clock;
pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use achievements::{Achievement, DailyStreak};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{Cue, Event, TimerSnapshot};
pub use storage::{Config, Database, KvStore, MemoryStore, SessionStore};
pub use timer::{TimerEngine, TimerMode, TimerService, TimerSession, TimerSettings, TimerStatus};
