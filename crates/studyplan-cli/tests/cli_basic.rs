//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::process::Command;

use tempfile::TempDir;

const TODAY: &str = "2026-10-19";

struct Cli {
    dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Run a CLI command and return (stdout, stderr, exit code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(env!("CARGO_BIN_EXE_studyplan"))
            .args(args)
            .args(["--today", TODAY])
            .env("STUDYPLAN_DATA_DIR", self.dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        (stdout, stderr, code)
    }

    fn ok(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "{args:?} failed: {stderr}");
        stdout
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        serde_json::from_str(&self.ok(args)).expect("Failed to parse JSON output")
    }
}

#[test]
fn test_empty_plan_json() {
    let cli = Cli::new();
    let plan = cli.json(&["plan", "show", "--days", "3", "--json"]);
    let days = plan["days"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], TODAY);
    assert_eq!(days[0]["total_used"], 0);
    assert_eq!(days[0]["spare"], 150);
}

#[test]
fn test_recurring_task_appears_in_plan() {
    let cli = Cli::new();
    let task = cli.json(&["recurring", "add", "Piano", "--weekday", "mon", "--minutes", "45", "--json"]);
    assert_eq!(task["weekday"], 1);

    let plan = cli.json(&["plan", "show", "--days", "7", "--json"]);
    let monday = &plan["days"][0];
    assert_eq!(monday["weekly"]["minutes"], 45);
    assert_eq!(monday["weekly"]["items"][0]["name"], "Piano");
}

#[test]
fn test_homework_lifecycle() {
    let cli = Cli::new();
    let task = cli.json(&[
        "homework", "add", "Essay", "--due", "2026-10-22", "--minutes", "60", "--json",
    ]);
    let id = task["id"].as_str().unwrap().to_string();

    let listed = cli.json(&["homework", "list", "--json"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    cli.ok(&["homework", "log", &id, "20"]);
    cli.ok(&["homework", "complete", &id]);

    let active = cli.json(&["homework", "list", "--json"]);
    assert!(active.as_array().unwrap().is_empty());
    let all = cli.json(&["homework", "list", "--all", "--json"]);
    assert_eq!(all[0]["status"], "completed");
    assert_eq!(all[0]["completed_on"], TODAY);
}

#[test]
fn test_unknown_id_fails() {
    let cli = Cli::new();
    let (_, stderr, code) = cli.run(&["homework", "complete", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: homework not found"));
}

#[test]
fn test_capacity_override_is_used() {
    let cli = Cli::new();
    cli.ok(&["capacity", "default", "120"]);
    cli.ok(&["capacity", "override", "2026-10-20", "0", "--label", "Trip"]);

    let capacity = cli.json(&["capacity", "show", "--json"]);
    assert_eq!(capacity["default_minutes"], 120);

    let plan = cli.json(&["plan", "show", "--days", "2", "--json"]);
    assert_eq!(plan["days"][0]["base_capacity"], 120);
    assert_eq!(plan["days"][1]["base_capacity"], 0);
    assert_eq!(plan["days"][1]["label"], "Trip");

    cli.ok(&["capacity", "clear", "2026-10-20"]);
    let (_, _, code) = cli.run(&["capacity", "clear", "2026-10-20"]);
    assert_eq!(code, 1);
}

#[test]
fn test_exam_revision_and_sync() {
    let cli = Cli::new();
    cli.ok(&[
        "exam", "add", "--type", "internal", "--date", "2026-10-25", "--subject", "Maths", "--preparedness", "50",
    ]);

    let plan = cli.json(&["plan", "show", "--json"]);
    assert_eq!(plan["revision"][0]["total_minutes"], 120);

    let report = cli.json(&["sync", "run", "--json"]);
    assert_eq!(report["sync_from"], TODAY);
    let inserted = report["inserted_slots"].as_u64().unwrap();
    assert!(inserted > 0);

    let slots = cli.json(&["sync", "slots", "--json"]);
    assert_eq!(slots.as_array().unwrap().len() as u64, inserted);
    assert!(slots
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["label"] == "FINAL: Maths"));
}

#[test]
fn test_done_updates_progress() {
    let cli = Cli::new();
    let task = cli.json(&["recurring", "add", "Tutor", "--weekday", "1", "--minutes", "60", "--json"]);
    let key = format!("weekly:{}", task["id"].as_str().unwrap());

    cli.ok(&["done", &key]);
    let progress = cli.json(&["plan", "progress", "--json"]);
    assert_eq!(progress["done_minutes"], 60);
    assert_eq!(progress["percent"], 100);

    cli.ok(&["done", &key, "--undo"]);
    let progress = cli.json(&["plan", "progress", "--json"]);
    assert_eq!(progress["done_minutes"], 0);
}

#[test]
fn test_config_get_set() {
    let cli = Cli::new();
    assert_eq!(cli.ok(&["config", "get", "planner.horizon_days"]).trim(), "7");
    cli.ok(&["config", "set", "planner.horizon_days", "14"]);
    assert_eq!(cli.ok(&["config", "get", "planner.horizon_days"]).trim(), "14");

    let plan = cli.json(&["plan", "show", "--json"]);
    assert_eq!(plan["days"].as_array().unwrap().len(), 14);

    let (_, _, code) = cli.run(&["config", "set", "planner.nope", "1"]);
    assert_eq!(code, 1);
}

#[test]
fn test_bad_weekday_is_rejected_by_parser() {
    let cli = Cli::new();
    let (_, _, code) = cli.run(&["recurring", "add", "Gym", "--weekday", "9", "--minutes", "30"]);
    assert_ne!(code, 0);
}

#[test]
fn test_completions() {
    let cli = Cli::new();
    let script = cli.ok(&["completions", "bash"]);
    assert!(script.contains("studyplan"));
}

#[test]
fn test_progress_matches_shown_plan() {
    let cli = Cli::new();
    cli.ok(&[
        "exam", "add", "--type", "board", "--date", "2026-10-29", "--subject", "Physics", "--preparedness", "50",
    ]);
    cli.ok(&["homework", "add", "Report", "--due", "2026-10-29", "--minutes", "200"]);

    let plan = cli.json(&["plan", "show", "--json"]);
    let today = &plan["days"][0];
    let shown = today["total_used"].as_u64().unwrap();
    assert!(shown > 0);

    let progress = cli.json(&["plan", "progress", "--json"]);
    assert_eq!(progress["planned_minutes"].as_u64().unwrap(), shown);
    assert_eq!(progress["revision"]["planned_minutes"], today["revision"]["minutes"]);
    assert_eq!(progress["homework"]["planned_minutes"], today["homework"]["minutes"]);

    // keys shown by `plan show` are the ones progress counts
    let slot = &today["revision"]["items"][0];
    let key = format!("revision:{}:{}", slot["exam_id"].as_str().unwrap(), slot["seq"]);
    cli.ok(&["done", &key]);
    let progress = cli.json(&["plan", "progress", "--json"]);
    assert_eq!(progress["done_minutes"], slot["minutes"]);
}
