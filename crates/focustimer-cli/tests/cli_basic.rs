//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focustimer"))
        .args(args)
        .env("FOCUSTIMER_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_empty_history() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["history", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No sessions recorded yet."));

    let sessions = run_json(&dir, &["history", "list", "--json"]);
    assert_eq!(sessions, serde_json::json!([]));
}

#[test]
fn test_achievements_start_locked() {
    let dir = TempDir::new().unwrap();
    let achievements = run_json(&dir, &["achievements", "--json"]);
    let list = achievements.as_array().unwrap();
    assert_eq!(list.len(), 5);
    assert_eq!(list[0]["id"], "first_focus");
    assert!(list.iter().all(|a| a["unlocked"] == false));

    let (stdout, _, code) = run_cli(&dir, &["achievements"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("0/5 unlocked"));
}

#[test]
fn test_streak_defaults() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["streak"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Current streak: 0 days"));
    assert!(stdout.contains("Last active:    never"));
}

#[test]
fn test_stats_json_window() {
    let dir = TempDir::new().unwrap();
    let summary = run_json(&dir, &["stats", "--days", "3", "--json"]);
    assert_eq!(summary["focus_sessions"], 0);
    assert_eq!(summary["days"].as_array().unwrap().len(), 3);
}

#[test]
fn test_config_show_get_set() {
    let dir = TempDir::new().unwrap();
    let config = run_json(&dir, &["config", "show"]);
    assert_eq!(config["schedule"]["focus_duration"], 25);
    assert!(dir.path().join("config.toml").exists());

    let (stdout, _, code) = run_cli(&dir, &["config", "set", "schedule.focus_duration", "30"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "schedule.focus_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "set", "schedule.focus_duration", "90"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, stderr, code) = run_cli(&dir, &["config", "get", "schedule.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (stdout, _, _) = run_cli(&dir, &["config", "get", "schedule.focus_duration"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_history_clear() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["history", "clear"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("history cleared"));
}

#[test]
fn test_unknown_command_fails() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["bogus"]);
    assert_ne!(code, 0);
}
