use chrono::Local;

use super::open_store;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let achievements = store.achievements();

    if json {
        println!("{}", serde_json::to_string_pretty(achievements)?);
        return Ok(());
    }

    let unlocked = achievements.iter().filter(|a| a.unlocked).count();
    println!("{unlocked}/{} unlocked", achievements.len());
    for a in achievements {
        let mark = if a.unlocked { "x" } else { " " };
        print!("[{mark}] {:<20} {}", a.title, a.description);
        if let Some(at) = a.unlocked_at {
            print!(" ({})", at.with_timezone(&Local).format("%Y-%m-%d"));
        }
        println!();
    }
    Ok(())
}
