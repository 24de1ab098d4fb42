use super::open_store;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    let streak = store.streak();
    let unit = |n: u32| if n == 1 { "day" } else { "days" };

    println!("Current streak: {} {}", streak.current_streak, unit(streak.current_streak));
    println!("Longest streak: {} {}", streak.longest_streak, unit(streak.longest_streak));
    match streak.last_active_date {
        Some(date) => println!("Last active:    {date}"),
        None => println!("Last active:    never"),
    }
    Ok(())
}
