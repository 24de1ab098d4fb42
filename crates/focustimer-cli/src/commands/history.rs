use chrono::Local;
use clap::Subcommand;
use focustimer_core::stats::format_time;
use focustimer_core::{Config, Event, TimerEngine};

use super::open_store;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete all recorded sessions (streak and achievements are kept)
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HistoryAction::List { json, limit } => {
            let store = open_store()?;
            let limit = limit.unwrap_or(usize::MAX);
            let sessions: Vec<_> = store.sessions().iter().take(limit).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }
            if sessions.is_empty() {
                println!("No sessions recorded yet.");
                return Ok(());
            }
            for session in sessions {
                println!(
                    "{}  {:<11}  {}  {}",
                    session.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    session.mode.label(),
                    format_time(session.duration),
                    if session.completed { "completed" } else { "incomplete" },
                );
            }
        }
        HistoryAction::Clear => {
            let config = Config::load()?;
            let mut engine = TimerEngine::from_config(open_store()?, &config);
            for event in engine.clear_history() {
                if let Event::PersistenceFailed { record, message, .. } = event {
                    return Err(format!("failed to save {record}: {message}").into());
                }
            }
            println!("history cleared");
        }
    }
    Ok(())
}
