//! Basic CLI integration tests. None of these reach a cover provider.

#![allow(deprecated)] // Command::cargo_bin deprecated for custom build-dir; still works for default

use assert_cmd::Command;
use pretty_assertions::assert_eq;

#[test]
fn help_prints_and_exits_success() {
    Command::cargo_bin("shelfwise")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn config_show_runs() {
    Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["config", "show"])
        .assert()
        .success();
}

#[test]
fn config_show_json_valid() {
    let out = Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["config", "show", "--json"])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout).expect("config show --json should output valid JSON");
    assert!(v["covers"]["placeholder_patterns"].is_array());
}

#[test]
fn blank_title_returns_fallback_without_lookup() {
    let out = Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["cover", "--title", "  ", "--fallback", "https://picsum.photos/400/600", "--json"])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout).unwrap();
    assert_eq!(v["coverUrl"], "https://picsum.photos/400/600");
    assert_eq!(v["isRealCover"], false);
    assert_eq!(v["isSearching"], false);
}

#[test]
fn own_cover_is_kept_without_lookup() {
    let out = Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["cover", "--title", "Dune", "--author", "Frank Herbert", "--fallback", "https://my.cdn/dune.png"])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    assert!(stdout.contains("Cover: https://my.cdn/dune.png"));
    assert!(stdout.contains("Real cover: no"));
}

#[test]
fn covers_missing_file_fails() {
    let out = Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["covers", "/nonexistent/books.json"])
        .assert()
        .failure();
    let stderr = std::str::from_utf8(&out.get_output().stderr).unwrap();
    assert!(stderr.contains("Input file not found"));
}

#[test]
fn covers_malformed_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");
    std::fs::write(&path, "{ not a list").unwrap();
    Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["covers", path.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn covers_with_only_owned_or_blank_entries_runs_offline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("books.json");
    std::fs::write(
        &path,
        r#"[
            {"id":"1","title":"Dune","author":"Frank Herbert","coverUrl":"https://my.cdn/dune.png"},
            {"id":"2","title":"  ","author":"Nobody"}
        ]"#,
    )
    .unwrap();
    let out = Command::cargo_bin("shelfwise")
        .unwrap()
        .args(["covers", path.to_str().unwrap(), "--json"])
        .assert()
        .success();
    let stdout = std::str::from_utf8(&out.get_output().stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout).unwrap();
    assert_eq!(v[0]["id"], "1");
    assert_eq!(v[0]["cover"]["coverUrl"], "https://my.cdn/dune.png");
    assert_eq!(v[1]["cover"]["coverUrl"], serde_json::Value::Null);
}

#[cfg(target_os = "linux")]
#[test]
fn config_init_set_show_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let run = |args: &[&str]| {
        Command::cargo_bin("shelfwise")
            .unwrap()
            .env("XDG_CONFIG_HOME", dir.path())
            .args(args)
            .assert()
            .success()
    };
    run(&["config", "init"]);
    assert!(dir.path().join("shelfwise").join("config.toml").exists());
    run(&["config", "set", "covers.prefetch_concurrency", "3"]);
    let out = run(&["config", "show", "--json"]);
    let v: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(v["covers"]["prefetch_concurrency"], 3);
}

#[cfg(target_os = "linux")]
#[test]
fn config_set_unknown_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("shelfwise")
        .unwrap()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "set", "covers.nope", "1"])
        .assert()
        .failure();
}
