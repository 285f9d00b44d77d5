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

fn write_store(dir: &Path, todos: serde_json::Value) {
    std::fs::write(
        dir.join("todos.json"),
        serde_json::to_string_pretty(&todos).unwrap(),
    )
    .unwrap();
}

fn read_store(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(dir.join("todos.json")).unwrap()).unwrap()
}

fn seed(dir: &Path) {
    write_store(
        dir,
        serde_json::json!([
            {
                "id": "1706800000001",
                "text": "Buy milk",
                "completed": true,
                "date": "2024-02-01",
                "time": "5:00 PM"
            },
            {
                "id": "1706800000000",
                "text": "Call mum",
                "completed": false,
                "date": "2024-02-02",
                "time": "9:00 AM"
            }
        ]),
    );
}

#[test]
fn edit_command_updates_text_and_keeps_the_rest() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["edit", "1706800000001", "Buy oat milk"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Updated todo: Buy oat milk (1706800000001)"));

    let stored = read_store(dir.path());
    assert_eq!(stored[0]["id"], "1706800000001");
    assert_eq!(stored[0]["text"], "Buy oat milk");
    assert_eq!(stored[0]["completed"], true);
    assert_eq!(stored[0]["date"], "2024-02-01");
    assert_eq!(stored[0]["time"], "5:00 PM");
    assert_eq!(stored[1]["text"], "Call mum");
}

#[test]
fn edit_command_moves_schedule() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(
        dir.path(),
        &[
            "edit",
            "1706800000000",
            "Call mum",
            "--date",
            "2024-02-03",
            "--time",
            "18:30",
        ],
    );

    assert!(output.status.success());
    let stored = read_store(dir.path());
    assert_eq!(stored[1]["date"], "2024-02-03");
    assert_eq!(stored[1]["time"], "6:30 PM");
}

#[test]
fn edit_command_rejects_blank_text() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["edit", "1706800000001", "   "]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    assert_eq!(read_store(dir.path())[0]["text"], "Buy milk");
}

#[test]
fn edit_command_reports_unknown_id() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["edit", "42", "anything"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: not_found - todo not found"));
}

#[test]
fn delete_command_removes_todo() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    let output = agenda(dir.path(), &["delete", "1706800000001"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted todo: Buy milk"));

    let stored = read_store(dir.path());
    assert_eq!(stored.as_array().unwrap().len(), 1);
    assert_eq!(stored[0]["id"], "1706800000000");
}

#[test]
fn delete_command_twice_leaves_store_unchanged() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());

    assert!(agenda(dir.path(), &["delete", "1706800000000"]).status.success());
    let after_first = read_store(dir.path());

    let output = agenda(dir.path(), &["delete", "1706800000000"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No todo with id 1706800000000; nothing deleted."));
    assert_eq!(read_store(dir.path()), after_first);
}

#[test]
fn delete_command_unknown_id_reports_json_noop() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let before = read_store(dir.path());

    let output = agenda(dir.path(), &["delete", "42", "--json"]);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!({ "id": "42", "deleted": false }));
    assert_eq!(read_store(dir.path()), before);
}
