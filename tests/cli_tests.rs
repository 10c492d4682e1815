//! E2E tests for the archive CLI

#![allow(deprecated)] // cargo_bin deprecation - will update when assert_cmd stabilizes replacement

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const POCKET: &str = r#"<!DOCTYPE html>
<html><body>
<ul>
<li><a href="https://b.example.com/post" time_added="1000" tags="news">B</a></li>
<li><a href="https://a.example.com/post" time_added="1000" tags="">A</a></li>
<li><a href="https://a.example.com/post" time_added="1000" tags="">A</a></li>
<li><a href="https://c.example.com/" time_added="9" tags="">C</a></li>
<li><a href="chrome://settings" time_added="5000" tags="">Settings</a></li>
</ul>
</body></html>"#;

fn archive() -> Command {
    let mut cmd = Command::cargo_bin("archive").unwrap();
    for var in [
        "FETCH_WGET",
        "FETCH_PDF",
        "FETCH_SCREENSHOT",
        "FETCH_FAVICON",
        "SUBMIT_ARCHIVE_DOT_ORG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn offline(cmd: &mut Command) -> &mut Command {
    cmd.env("FETCH_WGET", "False")
        .env("FETCH_PDF", "False")
        .env("FETCH_SCREENSHOT", "False")
        .env("FETCH_FAVICON", "False")
        .env("SUBMIT_ARCHIVE_DOT_ORG", "False")
}

#[test]
fn test_help() {
    archive()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("links"))
        .stdout(predicate::str::contains("check-deps"));
}

#[test]
fn test_version() {
    archive()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("archive"));
}

#[test]
fn test_run_help() {
    archive()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--resume"))
        .stdout(predicate::str::contains("--fetch-pdf"))
        .stdout(predicate::str::contains("--chrome-binary"))
        .stdout(predicate::str::contains("CHROME_BINARY"));
}

#[test]
fn test_run_no_args() {
    archive()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_run_file_not_found() {
    archive()
        .args(["run", "nonexistent.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_run_empty_export() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("empty.html");
    fs::write(&file, "<html><body>No bookmarks</body></html>").unwrap();

    offline(&mut archive())
        .args(["run", file.to_str().unwrap(), "--output"])
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No links found"));
}

#[test]
fn test_run_offline_builds_index() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("ril_export.html");
    fs::write(&file, POCKET).unwrap();
    let out = dir.path().join("pocket");

    offline(&mut archive())
        .args(["run", file.to_str().unwrap(), "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""format":"pocket""#))
        .stdout(predicate::str::contains(r#""links":3"#));

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("Saved Article (3)"));
    assert!(out.join("archive/1000").is_dir());
    assert!(out.join("archive/1000.1").is_dir());
    assert!(out.join("archive/9").is_dir());
    assert!(!out.join("archive/5000").exists());
}

#[test]
fn test_links_orders_and_dedupes() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("ril_export.html");
    fs::write(&file, POCKET).unwrap();

    let output = archive()
        .args(["links", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["format"], "pocket");
    assert_eq!(parsed["total"], 3);

    let timestamps: Vec<&str> = parsed["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["timestamp"].as_str().unwrap())
        .collect();
    // lexicographic descending: "9" before "1000"
    assert_eq!(timestamps, vec!["9", "1000", "1000.1"]);
    assert_eq!(parsed["links"][1]["url"], "https://b.example.com/post");
    assert_eq!(parsed["links"][2]["url"], "https://a.example.com/post");
}

#[test]
fn test_links_resume_and_yaml() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("ril_export.html");
    fs::write(&file, POCKET).unwrap();

    archive()
        .args([
            "links",
            file.to_str().unwrap(),
            "--resume",
            "1000",
            "--output-format",
            "yaml",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("total: 2"))
        .stdout(predicate::str::contains("c.example.com").not());
}

#[test]
fn test_links_invalid_resume() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("ril_export.html");
    fs::write(&file, POCKET).unwrap();

    archive()
        .args(["links", file.to_str().unwrap(), "--resume", "later"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid number"));
}

#[test]
fn test_invalid_format() {
    archive()
        .args(["links", "export.json", "--format", "delicious"])
        .assert()
        .failure();
}

#[test]
fn test_check_deps_missing_chrome() {
    archive()
        .args([
            "check-deps",
            "--fetch-wget",
            "false",
            "--chrome-binary",
            "no-such-chrome-binary",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing dependency"));
}

#[test]
fn test_check_deps_nothing_enabled() {
    offline(&mut archive())
        .arg("check-deps")
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}
