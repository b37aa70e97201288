// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the compiled `alumnet` binary against throwaway configs.

use std::path::Path;
use std::process::{Command, Output};

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let db = dir.join("alumnet.db");
    let unreachable = "http://127.0.0.1:9";
    let content = format!(
        r#"
[services]
session_log_url = "{unreachable}/call-history"
presence_url = "{unreachable}/call-status"
payment_url = "{unreachable}/payments"
requests_url = "{unreachable}/mentorship"
timeout_secs = 2
max_retries = 0

[storage]
database_path = "{}"
{extra}
"#,
        db.display()
    );
    let path = dir.join("alumnet.toml");
    std::fs::write(&path, content).unwrap();
    path
}

fn alumnet(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_alumnet"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn help_lists_every_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_alumnet"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "view", "accept", "reject", "start-call", "end-call", "complete", "watch", "health",
    ] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn invalid_config_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[poller]\ninterval_secs = 0\n");

    let output = alumnet(&config, &["health"]);
    assert!(!output.status.success());
}

#[test]
fn health_reports_unreachable_services() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = alumnet(&config, &["health", "--json"]);
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    let sqlite = entries
        .iter()
        .find(|entry| entry["service"] == "fallback_store")
        .unwrap();
    assert_eq!(sqlite["status"], "healthy");
    assert!(
        entries
            .iter()
            .filter(|entry| entry["service"] != "fallback_store")
            .all(|entry| entry["status"] == "unhealthy")
    );
}

#[test]
fn view_of_unknown_request_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = alumnet(&config, &["view", "--user", "s1", "--request", "r1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr was: {stderr}");
}
