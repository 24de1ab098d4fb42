//! Statistics over session history.
//!
//! Read-only derivations used by dashboards: totals, a per-day series ending
//! today, a weekday distribution, and display formatting. Only completed
//! focus sessions count.

use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::achievements::DailyStreak;
use crate::timer::TimerSession;

/// Focus totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub focus_minutes: f64,
    pub sessions_completed: u32,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_focus_minutes: f64,
    pub focus_sessions: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub daily_average_minutes: f64,
    pub days: Vec<DayTotal>,
}

pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn completed_focus(sessions: &[TimerSession]) -> impl Iterator<Item = &TimerSession> {
    sessions.iter().filter(|s| s.is_completed_focus())
}

pub fn total_focus_secs(sessions: &[TimerSession]) -> u64 {
    completed_focus(sessions).map(|s| s.duration).sum()
}

pub fn focus_session_count(sessions: &[TimerSession]) -> usize {
    completed_focus(sessions).count()
}

/// One entry per day for the `days` days ending at `today`, oldest first.
/// Sessions are bucketed by their date in `tz`.
pub fn daily_totals<Tz: TimeZone>(
    sessions: &[TimerSession],
    today: NaiveDate,
    days: u32,
    tz: &Tz,
) -> Vec<DayTotal> {
    let mut totals: Vec<DayTotal> = (0..days)
        .rev()
        .map(|back| DayTotal {
            date: today - Duration::days(i64::from(back)),
            focus_minutes: 0.0,
            sessions_completed: 0,
        })
        .collect();

    for session in completed_focus(sessions) {
        let date = session.date.with_timezone(tz).date_naive();
        if let Some(day) = totals.iter_mut().find(|d| d.date == date) {
            day.focus_minutes += session.duration as f64 / 60.0;
            day.sessions_completed += 1;
        }
    }
    totals
}

/// Mean focus minutes over the days that had any focus time.
pub fn daily_average_minutes(days: &[DayTotal]) -> f64 {
    let active: Vec<&DayTotal> = days.iter().filter(|d| d.focus_minutes > 0.0).collect();
    if active.is_empty() {
        return 0.0;
    }
    active.iter().map(|d| d.focus_minutes).sum::<f64>() / active.len() as f64
}

/// Focus minutes per weekday, indexed Sunday (0) through Saturday (6).
pub fn weekday_distribution<Tz: TimeZone>(sessions: &[TimerSession], tz: &Tz) -> [f64; 7] {
    let mut minutes = [0.0; 7];
    for session in completed_focus(sessions) {
        let weekday = session.date.with_timezone(tz).weekday();
        minutes[weekday.num_days_from_sunday() as usize] += session.duration as f64 / 60.0;
    }
    minutes
}

pub fn summary<Tz: TimeZone>(
    sessions: &[TimerSession],
    streak: &DailyStreak,
    today: NaiveDate,
    days: u32,
    tz: &Tz,
) -> Summary {
    let days = daily_totals(sessions, today, days, tz);
    Summary {
        total_focus_minutes: total_focus_secs(sessions) as f64 / 60.0,
        focus_sessions: focus_session_count(sessions),
        current_streak: streak.current_streak,
        longest_streak: streak.longest_streak,
        daily_average_minutes: daily_average_minutes(&days),
        days,
    }
}

/// `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// "45 min", "2 hr", "1 hr 30 min".
pub fn format_total_time(minutes: f64) -> String {
    let whole = minutes.max(0.0).floor() as u64;
    if whole < 60 {
        return format!("{whole} min");
    }
    let hours = whole / 60;
    let rest = whole % 60;
    if rest > 0 {
        format!("{hours} hr {rest} min")
    } else {
        format!("{hours} hr")
    }
}
