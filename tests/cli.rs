//! CLI-level smoke tests (`SPEC_FULL.md` "Test tooling") driving the
//! compiled binary directly, the way the teacher's own `src/main.rs`
//! integration tests exercise argument parsing and exit codes rather than
//! calling library functions in-process.

use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

#[test]
fn clear_learning_exits_zero_and_empties_the_store() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("learning.json");
    fs::write(
        &store_path,
        r#"{"submit":{"selector":"button:has-text('Submit')","target":"Submit","action":"click","success_count":1,"first_learned":"2026-01-01T00:00:00Z","last_used":"2026-01-01T00:00:00Z"}}"#,
    )
    .unwrap();

    Command::cargo_bin("scenario-runner")
        .unwrap()
        .current_dir(dir.path())
        .env("SCENARIO_RUNNER__LEARNING_STORE_PATH", &store_path)
        .arg("clear-learning")
        .assert()
        .success();

    let on_disk = fs::read_to_string(&store_path).unwrap();
    assert_eq!(on_disk.trim(), "{}");
}

#[test]
fn run_without_required_steps_flag_exits_nonzero() {
    Command::cargo_bin("scenario-runner")
        .unwrap()
        .args(["run", "https://example.test/app"])
        .assert()
        .failure();
}
