use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command running inside `dir` with its database there too
fn reel_radar(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("reel-radar");
    cmd.current_dir(dir.path())
        .env(
            "REEL_RADAR__GENERAL__STATE_DB_PATH",
            dir.path().join("state.sqlite"),
        )
        .env_remove("BOT_TOKEN");
    cmd
}

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("nested").join("config.toml");

    reel_radar(&dir)
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("purge_policy = \"on_delivery\""));
    assert!(content.contains("bot_token_env = \"BOT_TOKEN\""));

    // Refuses to clobber without --force
    reel_radar(&dir)
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_show_prints_effective_values() {
    let dir = TempDir::new().expect("temp dir");
    write_config(dir.path(), "[report]\nhour = 9\nchannel_id = -100777\n");

    reel_radar(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hour = 9"))
        .stdout(predicate::str::contains("channel_id = -100777"));
}

#[test]
fn classify_outputs_valid_json() {
    let dir = TempDir::new().expect("temp dir");

    let output = reel_radar(&dir)
        .args([
            "classify",
            "--text",
            "need Inception and Interstellar please",
            "--json",
        ])
        .output()
        .expect("run classify");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["is_request"], true);
    assert_eq!(value["titles"], serde_json::json!(["Inception", "Interstellar"]));
}

#[test]
fn classify_plain_greeting_is_not_a_request() {
    let dir = TempDir::new().expect("temp dir");

    reel_radar(&dir)
        .args(["classify", "--text", "hi there"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Movie request: no"));
}

#[test]
fn chats_add_list_remove() {
    let dir = TempDir::new().expect("temp dir");

    reel_radar(&dir)
        .args(["chats", "add", "-1001234567890"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added to monitoring"));

    reel_radar(&dir)
        .args(["chats", "add", "-1001234567890"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already being monitored"));

    let output = reel_radar(&dir)
        .args(["chats", "list", "--json"])
        .output()
        .expect("run chats list");
    assert!(output.status.success());
    let chats: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(chats[0]["chat_id"], -1001234567890i64);
    assert_eq!(chats[0]["status"], "active");

    reel_radar(&dir)
        .args(["chats", "remove", "-1001234567890"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed from monitoring"));

    reel_radar(&dir)
        .args(["chats", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No monitored chats."));
}

#[test]
fn report_on_empty_store_is_empty() {
    let dir = TempDir::new().expect("temp dir");

    reel_radar(&dir)
        .args(["report", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No movie requests found for"))
        .stdout(predicate::str::contains("Dry run: nothing sent"));

    let output = reel_radar(&dir)
        .args(["report", "--dry-run", "--json", "--date", "2024-05-10"])
        .output()
        .expect("run report");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["delivery"]["status"], "dry_run");
    assert_eq!(value["report"]["window_record_count"], 0);
    assert!(value["purged"].is_null());
}

#[test]
fn report_writes_outbox_instead_of_sending() {
    let dir = TempDir::new().expect("temp dir");
    write_config(dir.path(), "[report]\nchannel_id = -100777\n");
    let outbox = dir.path().join("outbox.jsonl");

    reel_radar(&dir)
        .args(["report", "--outbox"])
        .arg(&outbox)
        .assert()
        .success()
        .stdout(predicate::str::contains("Delivered in 1 message(s)"));

    let line = fs::read_to_string(&outbox).expect("read outbox");
    let entry: Value = serde_json::from_str(line.trim()).expect("valid json");
    assert_eq!(entry["chat_id"], -100777);
    assert!(
        entry["text"]
            .as_str()
            .unwrap_or_default()
            .contains("Daily Movie Request Report")
    );
}

#[test]
fn report_rejects_bad_date() {
    let dir = TempDir::new().expect("temp dir");

    reel_radar(&dir)
        .args(["report", "--dry-run", "--date", "10/05/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn stats_outputs_json() {
    let dir = TempDir::new().expect("temp dir");

    reel_radar(&dir)
        .args(["chats", "add", "-100"])
        .assert()
        .success();

    let output = reel_radar(&dir)
        .args(["stats", "--json"])
        .output()
        .expect("run stats");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["active_chats"], 1);
    assert_eq!(value["messages_today"], 0);
    assert_eq!(value["requests_today"], 0);
}

#[test]
fn doctor_rejects_unknown_component() {
    let dir = TempDir::new().expect("temp dir");

    reel_radar(&dir)
        .args(["doctor", "--check", "llm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown component"));
}

#[test]
fn doctor_warns_on_fresh_setup() {
    let dir = TempDir::new().expect("temp dir");

    let output = reel_radar(&dir)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["config"]["status"], "ok");
    assert_eq!(value["store"]["status"], "warn");
    assert_eq!(value["telegram"]["status"], "warn");
    assert_eq!(value["overall"], "warn");
}
