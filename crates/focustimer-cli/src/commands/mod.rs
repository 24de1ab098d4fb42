pub mod achievements;
pub mod config;
pub mod history;
pub mod run;
pub mod stats;
pub mod streak;

use focustimer_core::{Database, SessionStore};

/// Open the on-disk store with its records loaded.
pub fn open_store() -> Result<SessionStore<Database>, Box<dyn std::error::Error>> {
    Ok(SessionStore::open(Database::open()?))
}
