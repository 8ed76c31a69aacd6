//! Command-line tests that need no running cache service.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli(prefs: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("cache-browser").unwrap();
    cmd.env("CACHE_BROWSER_PREFERENCES", prefs)
        .env_remove("CACHE_BROWSER_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("prefs.json"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("namespaces"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("components"))
        .stdout(predicate::str::contains("width"));
}

#[test]
fn test_no_subcommand_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("prefs.json")).assert().failure().code(2);
}

#[test]
fn test_width_is_clamped_and_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs.json");

    cli(&prefs)
        .args(["width", "--set", "900"])
        .assert()
        .success()
        .stdout("600\n");
    cli(&prefs).arg("width").assert().success().stdout("600\n");

    cli(&prefs)
        .args(["width", "--set", "-5"])
        .assert()
        .success()
        .stdout("200\n");
}

#[test]
fn test_width_without_saved_value_fails() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("prefs.json"))
        .arg("width")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved width"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cli(&dir.path().join("prefs.json"))
        .args(["--base-url", "ftp://cache", "namespaces"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
}
