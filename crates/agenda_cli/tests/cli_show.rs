use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn agenda(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_agenda"))
        .args(args)
        .env("AGENDA_STORE_PATH", dir.join("todos.json"))
        .env("AGENDA_CONFIG_PATH", dir.join("config.json"))
        .env("AGENDA_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run agenda")
}

fn seed(dir: &Path) {
    let todos = serde_json::json!([
        {
            "id": "1706800000000",
            "text": "Buy milk",
            "completed": false,
            "date": "2024-02-01",
            "time": "5:00 PM"
        }
    ]);
    std::fs::write(dir.join("todos.json"), todos.to_string()).unwrap();
}

#[test]
fn show_command_prints_details() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["show", "1706800000000"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("id: 1706800000000"));
    assert!(stdout.contains("text: Buy milk"));
    assert!(stdout.contains("status: active"));
    assert!(stdout.contains("date: 2024-02-01"));
    assert!(stdout.contains("time: 5:00 PM"));
}

#[test]
fn show_command_json_has_no_durability_flag() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["show", "1706800000000", "--json"]);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["text"], "Buy milk");
    assert!(json.get("durable").is_none());
}

#[test]
fn show_command_reports_unknown_id() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["show", "1"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: not_found"));
}
