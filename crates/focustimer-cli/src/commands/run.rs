use std::io::Write;

use clap::{Args, ValueEnum};
use focustimer_core::{
    Config, Cue, Database, Event, KvStore, TimerEngine, TimerMode, TimerService,
};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{info, warn};

use super::open_store;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Focus,
    Break,
    LongBreak,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Focus => TimerMode::Focus,
            ModeArg::Break => TimerMode::Break,
            ModeArg::LongBreak => TimerMode::LongBreak,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Interval to begin with
    #[arg(long, value_enum, default_value = "focus")]
    mode: ModeArg,
    /// Intervals to run before exiting (0 runs until interrupted)
    #[arg(long, default_value = "1")]
    cycles: u32,
    /// Focus length in minutes
    #[arg(long)]
    focus: Option<u64>,
    /// Short break length in minutes
    #[arg(long = "break")]
    short_break: Option<u64>,
    /// Long break length in minutes
    #[arg(long)]
    long_break: Option<u64>,
    /// Focus sessions before a long break
    #[arg(long)]
    sessions: Option<u32>,
    /// Suppress cues for this run
    #[arg(long)]
    mute: bool,
}

fn build_engine(args: &RunArgs) -> Result<TimerEngine<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut engine = TimerEngine::from_config(open_store()?, &config);

    if let Some(minutes) = args.focus {
        engine.set_focus_duration(minutes * 60);
    }
    if let Some(minutes) = args.short_break {
        engine.set_break_duration(minutes * 60);
    }
    if let Some(minutes) = args.long_break {
        engine.set_long_break_duration(minutes * 60);
    }
    if let Some(n) = args.sessions {
        engine.set_sessions_till_long_break(n);
    }
    if args.mute && !engine.is_muted() {
        engine.toggle_mute();
    }

    let mode = TimerMode::from(args.mode);
    while engine.mode() != mode {
        engine.toggle_mode();
    }
    Ok(engine)
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = TimerService::new(build_engine(&args)?);
    drive(&service, args.cycles, &mut std::io::stdout()).await
}

/// Run `cycles` intervals (0 for no limit), writing every event to `out`.
async fn drive<S, W>(
    service: &TimerService<S>,
    cycles: u32,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: KvStore + Send + 'static,
    W: Write,
{
    let mut events = service.subscribe();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut finished = 0u32;
    service.start().await;
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    let interval_done =
                        matches!(event, Event::FocusCompleted { .. } | Event::BreakCompleted { .. });
                    emit(service, &event, out).await?;
                    if !interval_done {
                        continue;
                    }
                    // emit took the engine lock, and batches are published
                    // under it, so the rest of this batch is queued.
                    drain(service, &mut events, out).await?;
                    finished += 1;
                    if cycles != 0 && finished >= cycles {
                        break;
                    }
                    service.start().await;
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                info!("interrupted, resetting timer");
                service.shutdown().await;
                drain(service, &mut events, out).await?;
                break;
            }
        }
    }
    out.flush()?;
    Ok(())
}

async fn drain<S: KvStore + Send + 'static, W: Write>(
    service: &TimerService<S>,
    events: &mut broadcast::Receiver<Event>,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match events.try_recv() {
            Ok(event) => emit(service, &event, out).await?,
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

/// Write one event as a JSON line, with its cue and toast when it has them.
async fn emit<S: KvStore + Send + 'static, W: Write>(
    service: &TimerService<S>,
    event: &Event,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let cue = service.engine().lock().await.cue_for(event);
    writeln!(out, "{}", render(event, cue)?)?;
    Ok(())
}

fn render(event: &Event, cue: Option<Cue>) -> Result<serde_json::Value, serde_json::Error> {
    let mut line = serde_json::to_value(event)?;
    if let Some(obj) = line.as_object_mut() {
        if let Some(cue) = cue {
            obj.insert("cue".to_string(), serde_json::to_value(cue)?);
        }
        if let Some((title, body)) = event.toast() {
            obj.insert("toast".to_string(), json!({ "title": title, "body": body }));
        }
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use focustimer_core::{ManualClock, MemoryStore, SessionStore, TimerSettings};
    use std::time::Duration;

    fn quick_service() -> TimerService<MemoryStore> {
        let settings = TimerSettings {
            focus_secs: 2,
            break_secs: 1,
            long_break_secs: 1,
            sessions_till_long_break: 4,
        };
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        let engine =
            TimerEngine::with_clock(SessionStore::open(MemoryStore::new()), settings, clock);
        TimerService::with_tick_interval(engine, Duration::from_millis(1))
    }

    fn event_types(out: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["type"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn single_focus_cycle_prints_unlock() {
        for _ in 0..20 {
            let service = quick_service();
            let mut out = Vec::new();
            drive(&service, 1, &mut out).await.unwrap();
            assert_eq!(
                event_types(&out),
                ["TimerStarted", "FocusCompleted", "AchievementUnlocked"]
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cycles_alternate_focus_and_break() {
        let service = quick_service();
        let mut out = Vec::new();
        drive(&service, 3, &mut out).await.unwrap();

        let types = event_types(&out);
        let completions: Vec<&str> = types
            .iter()
            .map(String::as_str)
            .filter(|t| t.ends_with("Completed"))
            .collect();
        assert_eq!(completions, ["FocusCompleted", "BreakCompleted", "FocusCompleted"]);
        assert_eq!(service.engine().lock().await.sessions().len(), 2);
    }

    #[test]
    fn render_adds_cue_and_toast() {
        let event = Event::BreakCompleted {
            was_long: true,
            at: Utc::now(),
        };
        let line = render(&event, event.cue()).unwrap();
        assert_eq!(line["type"], "BreakCompleted");
        assert_eq!(line["cue"], "long_break_complete");
        assert_eq!(line["toast"]["title"], "Long break completed!");
    }

    #[test]
    fn render_omits_cue_when_muted() {
        let event = Event::TimerPaused {
            time_left: 10,
            at: Utc::now(),
        };
        let line = render(&event, None).unwrap();
        assert!(line.get("cue").is_none());
        assert!(line.get("toast").is_none());
    }
}
