// Non-interactive commands, run against the compiled binary with a throwaway
// HOME so nothing touches the real state directory.

use assert_cmd::Command;
use std::path::Path;
use tempfile::tempdir;

fn keyrush(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("keyrush").unwrap();
    cmd.env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_STATE_HOME")
        .env_remove("KEYRUSH_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn empty_history_and_bests() {
    let home = tempdir().unwrap();
    let out = stdout_of(keyrush(home.path()).args(["--history", "--bests", "--weak-keys"]));

    assert!(out.contains("no tests recorded yet"));
    assert!(out.contains("no personal bests yet"));
    assert!(out.contains("no missed keys recorded yet"));
}

#[test]
fn lists_recorded_history_and_bests() {
    let home = tempdir().unwrap();
    let state = home.path().join(".local").join("state").join("keyrush");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(
        state.join("typing-test-history.json"),
        r#"[{"id":"1-abc","wpm":55,"accuracy":97,"correctChars":280,"incorrectChars":8,
            "totalChars":288,"duration":60,"mode":"numbers","date":"2024-03-01T10:00:00+00:00"}]"#,
    )
    .unwrap();
    std::fs::write(
        state.join("typing-leaderboard.json"),
        r#"{"numbers-60":{"wpm":55,"accuracy":97,"date":"2024-03-01T10:00:00+00:00"}}"#,
    )
    .unwrap();

    let out = stdout_of(keyrush(home.path()).args(["--history", "--bests"]));
    assert!(out.contains("numbers"));
    assert!(out.contains("55 wpm"));
    assert!(out.contains("1 tests, average 55 wpm at 97% accuracy"));
    assert!(out.contains("2024-03-01"));
}

#[test]
fn export_and_clear_history() {
    let home = tempdir().unwrap();
    let export = home.path().join("out.csv");

    let out = stdout_of(keyrush(home.path()).arg("--export-history").arg(&export));
    assert!(out.contains("exported 0 tests"));
    let csv = std::fs::read_to_string(&export).unwrap();
    assert!(csv.starts_with("date,mode,duration,wpm,accuracy"));

    let out = stdout_of(keyrush(home.path()).args([
        "--clear-history",
        "--clear-bests",
        "--clear-weak-keys",
    ]));
    assert!(out.contains("history cleared"));
    assert!(out.contains("personal bests cleared"));
    assert!(out.contains("key statistics cleared"));
}

#[test]
fn interactive_mode_requires_a_tty() {
    let home = tempdir().unwrap();
    let output = keyrush(home.path()).assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8(output).unwrap().contains("stdin must be a tty"));
}

#[test]
fn unknown_mode_is_rejected() {
    let home = tempdir().unwrap();
    keyrush(home.path()).args(["--mode", "zen"]).assert().failure();
}
