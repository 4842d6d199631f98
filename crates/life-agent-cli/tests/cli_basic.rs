//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temporary
//! directory, so the config file and database start empty.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(home: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_life-agent-cli"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("LIFE_AGENT_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &TempDir, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

#[test]
fn test_commit_add_and_complete() {
    let home = TempDir::new().unwrap();
    let logged = run_json(
        &home,
        &["commit", "add", "--user", "1", "--domain", "health", "Walk 30 minutes"],
    );
    assert_eq!(logged["commitment"]["domain"], "health");
    assert_eq!(logged["commitment"]["completed"], false);
    assert_eq!(logged["predicted_success"], 0.5);

    let id = logged["commitment"]["id"].as_i64().unwrap().to_string();
    let done = run_json(&home, &["commit", "complete", &id, "--user", "1"]);
    assert_eq!(done["commitment"]["completed"], true);
    assert!(done["resolved_intervention"].is_null());

    let list = run_json(&home, &["commit", "list", "--user", "1"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn test_complete_other_users_commitment_fails() {
    let home = TempDir::new().unwrap();
    let logged = run_json(
        &home,
        &["commit", "add", "--user", "1", "--domain", "work", "Ship report"],
    );
    let id = logged["commitment"]["id"].as_i64().unwrap().to_string();
    let (code, _, stderr) = run_cli(&home, &["commit", "complete", &id, "--user", "2"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_unknown_domain_rejected() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&home, &["commit", "add", "--user", "1", "--domain", "hobby", "x"]);
    assert_ne!(code, 0);
}

#[test]
fn test_scan_records_general_trigger() {
    let home = TempDir::new().unwrap();
    let scan = run_json(&home, &["scan", "--user", "3", "I might try to call clients later"]);
    assert_eq!(scan["avoidance_detected"], true);
    assert_eq!(scan["score"], 0.5);

    let triggers = run_json(&home, &["intervention", "triggers", "--user", "3"]);
    let rows = triggers.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["data"]["type"], "avoidance_language");
}

#[test]
fn test_check_on_empty_history() {
    let home = TempDir::new().unwrap();
    let report = run_json(&home, &["check", "--user", "9"]);
    let domains = report["domains"].as_array().unwrap();
    assert_eq!(domains.len(), 6);
    assert!(domains.iter().all(|d| d["level"] == 0));

    let open = run_json(&home, &["intervention", "list", "--user", "9"]);
    assert!(open.as_array().unwrap().is_empty());
}

#[test]
fn test_analyze_and_success_empty() {
    let home = TempDir::new().unwrap();
    let report = run_json(&home, &["analyze", "--user", "4", "--days", "14"]);
    assert_eq!(report["window_days"], 14);
    assert_eq!(report["avoidance_patterns"]["total_avoidance_rate"], 0.0);
    let success = run_json(&home, &["success", "--user", "4"]);
    assert!(success.as_array().unwrap().is_empty());
}

#[test]
fn test_resolve_missing_intervention_fails() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["intervention", "resolve", "77"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_get_set_reset() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["config", "get", "lifecycle.resolution_streak"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");

    let (code, _, _) = run_cli(&home, &["config", "set", "lifecycle.resolution_streak", "5"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(&home, &["config", "get", "lifecycle.resolution_streak"]);
    assert_eq!(stdout.trim(), "5");

    let (code, _, _) = run_cli(&home, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);

    let (code, _, _) = run_cli(&home, &["config", "reset"]);
    assert_eq!(code, 0);
    let listed = run_json(&home, &["config", "list"]);
    assert_eq!(listed["lifecycle"]["resolution_streak"], 3);
}

#[test]
fn test_oversized_windows_cover_all_history() {
    let home = TempDir::new().unwrap();
    run_json(
        &home,
        &["commit", "add", "--user", "6", "--domain", "finance", "Review budget"],
    );
    run_json(&home, &["scan", "--user", "6", "--domain", "finance", "I might do it later"]);

    let report = run_json(&home, &["analyze", "--user", "6", "--days", "4294967295"]);
    assert_eq!(report["completion_patterns"]["by_domain"]["finance"]["total_commitments"], 1);

    let listed = run_json(&home, &["commit", "list", "--user", "6", "--days", "4294967295"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let triggers = run_json(
        &home,
        &["intervention", "triggers", "--user", "6", "--domain", "finance", "--hours", "9000000000"],
    );
    assert_eq!(triggers.as_array().unwrap().len(), 1);

    let (code, _, _) = run_cli(
        &home,
        &["config", "set", "escalation.display_window_hours", "9223372036854775807"],
    );
    assert_eq!(code, 0);
    let check = run_json(&home, &["check", "--user", "6"]);
    assert_eq!(check["domains"].as_array().unwrap().len(), 6);
}
