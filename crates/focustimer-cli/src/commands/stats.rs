use chrono::Local;
use clap::Args;
use focustimer_core::stats::{self, format_total_time, WEEKDAY_NAMES};

use super::open_store;

#[derive(Args)]
pub struct StatsArgs {
    /// Number of days in the daily breakdown, ending today
    #[arg(long, default_value = "7")]
    days: u32,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let today = Local::now().date_naive();
    let summary = stats::summary(store.sessions(), store.streak(), today, args.days, &Local);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Total focus:    {}", format_total_time(summary.total_focus_minutes));
    println!("Sessions:       {}", summary.focus_sessions);
    println!("Current streak: {}", summary.current_streak);
    println!("Longest streak: {}", summary.longest_streak);
    println!("Daily average:  {}", format_total_time(summary.daily_average_minutes));

    println!();
    for day in &summary.days {
        println!(
            "{}  {:>3} sessions  {}",
            day.date.format("%a %Y-%m-%d"),
            day.sessions_completed,
            format_total_time(day.focus_minutes),
        );
    }

    println!();
    let by_weekday = stats::weekday_distribution(store.sessions(), &Local);
    for (name, minutes) in WEEKDAY_NAMES.iter().zip(by_weekday) {
        println!("{name}  {}", format_total_time(minutes));
    }
    Ok(())
}
