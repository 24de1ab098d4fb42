pub mod config;
pub mod database;
mod memory;
pub mod session_store;

pub use config::{Config, NotificationsConfig, ScheduleConfig};
pub use database::Database;
pub use memory::MemoryStore;
pub use session_store::{LoadedState, SessionStore};

use std::path::PathBuf;

use crate::error::DatabaseError;

/// Minimal string key-value contract the session store persists through.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

/// Returns the data directory, creating it if needed.
///
/// `FOCUSTIMER_DATA_DIR` overrides the location outright. Otherwise the
/// directory is `~/.config/focustimer`, or `~/.config/focustimer-dev` when
/// `FOCUSTIMER_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("FOCUSTIMER_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focustimer-dev")
            } else {
                base_dir.join("focustimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
