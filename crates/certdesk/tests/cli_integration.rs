//! CLI integration tests for the certdesk command-line interface.
//!
//! These tests cover argument parsing and help output only; nothing here
//! needs a running backend.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the certdesk binary.
fn certdesk() -> Command {
    Command::cargo_bin("certdesk").unwrap()
}

#[test]
fn test_help_displays() {
    certdesk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("certdesk"))
        .stdout(predicate::str::contains("edge gateway"));
}

#[test]
fn test_version_displays() {
    certdesk()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("certdesk"));
}

#[test]
fn test_help_lists_serve_subcommand() {
    certdesk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_serve_help_shows_gateway_options() {
    certdesk()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--backend-url"))
        .stdout(predicate::str::contains("--insecure-backend"))
        .stdout(predicate::str::contains("--no-cors"));
}

#[test]
fn test_verbose_flag_accepted() {
    certdesk().args(["--verbose", "--help"]).assert().success();
}

#[test]
fn test_unknown_subcommand_fails() {
    certdesk()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_flag_fails() {
    certdesk()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_serve_rejects_a_malformed_bind_address() {
    certdesk()
        .args(["serve", "--bind", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
