#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn deskhand(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("deskhand").unwrap();
    cmd.current_dir(dir.path())
        .env("DESKHAND_CONFIG", dir.path().join("deskhand.yaml"))
        .env_remove("DESKHAND_SERVER")
        .env_remove("DESKHAND_AGENT_ID")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) {
    std::fs::write(dir.path().join("deskhand.yaml"), yaml).unwrap();
}

fn write_batch(dir: &TempDir, json: &str) -> String {
    let path = dir.path().join("batch.json");
    std::fs::write(&path, json).unwrap();
    path.display().to_string()
}

/// Shell backend whose tools always succeed.
const NOOP_SHELL: &str = "server_url: ws://localhost:3000\ninput:\n  type: shell\n  hyprctl: \"true\"\n  ydotool: \"true\"\n";

// ---------------------------------------------------------------------------
// deskhand keys
// ---------------------------------------------------------------------------

#[test]
fn keys_lists_names() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .arg("keys")
        .assert()
        .success()
        .stdout(predicate::str::contains("enter"))
        .stdout(predicate::str::contains("ctrl"))
        .stdout(predicate::str::contains("pagedown"));
}

#[test]
fn keys_marks_modifiers() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .arg("keys")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^shift\s+\(modifier\)$").unwrap())
        .stdout(predicate::str::is_match(r"(?m)^enter$").unwrap());
}

#[test]
fn keys_resolves_given_names() {
    let dir = TempDir::new().unwrap();
    let output = deskhand(&dir)
        .args(["keys", "Return", "CTRL", "Q", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let keys: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        keys,
        serde_json::json!([
            {"key": "enter", "modifier": false},
            {"key": "control", "modifier": true},
            {"key": "q", "modifier": false},
        ])
    );
}

#[test]
fn keys_rejects_unknown_names() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .args(["keys", "hyperspace"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolvable key: 'hyperspace'"));
}

#[test]
fn keys_json_is_an_array() {
    let dir = TempDir::new().unwrap();
    let output = deskhand(&dir).args(["keys", "--json"]).output().unwrap();
    assert!(output.status.success());
    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(names.iter().any(|n| n == "escape"));
}

// ---------------------------------------------------------------------------
// deskhand config
// ---------------------------------------------------------------------------

#[test]
fn config_check_valid() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "server_url: wss://coord.example.com\nagent_id: desk-1\n");
    deskhand(&dir)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_check_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn config_check_reports_missing_server() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "agent_id: desk-1\n");
    deskhand(&dir)
        .args(["config", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] server_url is not set"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_check_warns_about_missing_tools() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "server_url: ws://localhost:3000\ninput:\n  type: shell\n  hyprctl: /nonexistent/hyprctl\n",
    );
    deskhand(&dir)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/nonexistent/hyprctl"));
}

#[test]
fn legacy_json_config_is_accepted() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, r#"{"wssServer": "https://coord.example.com"}"#);
    let output = deskhand(&dir)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["server_url"], "https://coord.example.com");
    assert_eq!(config["input"]["type"], "native");
}

#[test]
fn config_show_without_file_prints_defaults() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("initial_delay_ms: 1000"));
}

// ---------------------------------------------------------------------------
// deskhand exec
// ---------------------------------------------------------------------------

#[test]
fn exec_wait_only_batch() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, NOOP_SHELL);
    let batch = write_batch(&dir, r#"[{"type": "wait", "ms": 10}, {"type": "wait", "ms": 0}]"#);
    let output = deskhand(&dir)
        .args(["exec", &batch, "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["executed"], 2);
    assert_eq!(report["backend"], "shell");
    assert!(report["elapsed_ms"].as_u64().unwrap() >= 10);
}

#[test]
fn exec_full_batch_with_shell_tools() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, NOOP_SHELL);
    let batch = write_batch(
        &dir,
        r#"{"userId": "u-1", "actions": [
            {"type": "click", "x": 100, "y": 200},
            {"type": "key", "key": "Enter"},
            {"type": "key_combination", "keys": ["ctrl", "shift", "t"]},
            {"type": "type", "text": "say \"hi\""}
        ]}"#,
    );
    deskhand(&dir)
        .args(["exec", &batch])
        .assert()
        .success()
        .stdout(predicate::str::contains("Executed 4 action(s)"));
}

#[test]
fn exec_reads_stdin() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, NOOP_SHELL);
    deskhand(&dir)
        .args(["exec", "-"])
        .write_stdin(r#"[{"type": "wait", "ms": 1}]"#)
        .assert()
        .success();
}

#[test]
fn exec_unresolvable_key_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, NOOP_SHELL);
    let batch = write_batch(
        &dir,
        r#"[{"type": "wait", "ms": 1}, {"type": "key", "key": "hyperspace"}]"#,
    );
    deskhand(&dir)
        .args(["exec", &batch])
        .assert()
        .failure()
        .stderr(predicate::str::contains("action 1 (key) failed"))
        .stderr(predicate::str::contains("unresolvable key: 'hyperspace'"));
}

#[test]
fn exec_failure_is_reported_once() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, NOOP_SHELL);
    let batch = write_batch(&dir, r#"[{"type": "key", "key": "hyperspace"}]"#);
    let output = deskhand(&dir).args(["exec", &batch]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("unresolvable key").count(), 1, "{stderr}");
    assert!(stderr.starts_with("error: action 0 (key) failed"), "{stderr}");
}

#[test]
fn exec_failing_tool_fails() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "input:\n  type: shell\n  hyprctl: \"false\"\n  ydotool: \"false\"\n",
    );
    let batch = write_batch(&dir, r#"[{"type": "click", "x": 1, "y": 1}]"#);
    deskhand(&dir)
        .args(["exec", &batch])
        .assert()
        .failure()
        .stderr(predicate::str::contains("shell backend failed"));
}

#[test]
fn exec_malformed_batch_runs_nothing() {
    let dir = TempDir::new().unwrap();
    // `touch dispatch movecursor 1 1` would leave files behind in the cwd.
    write_config(&dir, "input:\n  type: shell\n  hyprctl: touch\n  ydotool: \"true\"\n");
    let batch = write_batch(
        &dir,
        r#"[{"type": "click", "x": 1, "y": 1}, {"type": "teleport"}]"#,
    );
    deskhand(&dir)
        .args(["exec", &batch])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid action batch"));
    assert!(!dir.path().join("movecursor").exists());
}

#[test]
fn exec_click_reaches_the_tool() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "input:\n  type: shell\n  hyprctl: touch\n  ydotool: \"true\"\n");
    let batch = write_batch(&dir, r#"[{"type": "click", "x": 1, "y": 1}]"#);
    deskhand(&dir).args(["exec", &batch]).assert().success();
    assert!(dir.path().join("movecursor").exists());
}

// ---------------------------------------------------------------------------
// deskhand run
// ---------------------------------------------------------------------------

#[test]
fn run_without_server_fails() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("server_url is not set"));
}

#[test]
fn run_rejects_bad_scheme_from_env() {
    let dir = TempDir::new().unwrap();
    deskhand(&dir)
        .arg("run")
        .env("DESKHAND_SERVER", "ftp://coord.example.com")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with"));
}
