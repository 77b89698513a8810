//! Integration tests for the `kumly` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! config handling and error exit codes, all without a live server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `kumly` binary with env isolation.
///
/// Clears all `KUMLY_*` env vars and points config directories at `home`
/// so tests never touch the user's real configuration.
fn kumly_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("kumly");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    for var in [
        "KUMLY_PROFILE",
        "KUMLY_URL",
        "KUMLY_USERNAME",
        "KUMLY_PASSWORD",
        "KUMLY_TOKEN",
        "KUMLY_OUTPUT",
        "KUMLY_INSECURE",
        "KUMLY_TIMEOUT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(home: &Path, contents: &str) {
    let dir = home.join(".config").join("kumly");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const LAB_CONFIG: &str = r#"
default_profile = "lab"

[profiles.lab]
url = "http://127.0.0.1:3001"
username = "admin"
password = "hunter2"

[profiles.prod]
url = "https://status.example.com"
auth_mode = "token"
"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = kumly_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("Uptime Kuma")
            .and(predicate::str::contains("monitors"))
            .and(predicate::str::contains("tags"))
            .and(predicate::str::contains("status-pages")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kumly"));
}

#[test]
fn test_monitors_subcommands_exist() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .args(["monitors", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("add"))
                .and(predicate::str::contains("delete"))
                .and(predicate::str::contains("pause"))
                .and(predicate::str::contains("resume")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = kumly_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    let output = kumly_cmd(home.path())
        .args(["--output", "xml", "monitors", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("invalid value") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_monitors_list_without_config() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .args(["monitors", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No configuration found"));
}

#[test]
fn test_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    kumly_cmd(home.path())
        .args(["--profile", "staging", "monitors", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_token_profile_without_token() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    // Keyring lookups fail or miss in a sandbox; either way there is no token.
    kumly_cmd(home.path())
        .args(["--profile", "prod", "info"])
        .assert()
        .code(3);
}

#[test]
fn test_unreachable_server() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .args([
            "--url",
            "http://127.0.0.1:9",
            "--token",
            "jwt",
            "--timeout",
            "5",
            "monitors",
            "list",
        ])
        .assert()
        .code(7);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    let home = tempfile::tempdir().unwrap();
    kumly_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_show_masks_password() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    kumly_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.lab]")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_show_json() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    let output = kumly_cmd(home.path())
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["default_profile"], "lab");
    assert_eq!(value["profiles"]["lab"]["password"], "****");
    assert_eq!(value["profiles"]["prod"]["auth_mode"], "token");
}

#[test]
fn test_config_profiles_marks_default() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    kumly_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab *").and(predicate::str::contains("prod")));
}

#[test]
fn test_config_set_and_use() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);

    kumly_cmd(home.path())
        .args(["--profile", "prod", "config", "set", "update_timeout", "0"])
        .assert()
        .success();
    kumly_cmd(home.path())
        .args(["config", "use", "prod"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(home.path().join(".config/kumly/config.toml")).unwrap();
    assert!(saved.contains("default_profile = \"prod\""), "{saved}");
    assert!(saved.contains("update_timeout = 0"), "{saved}");
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    kumly_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    kumly_cmd(home.path())
        .args(["config", "use", "staging"])
        .assert()
        .code(4);
}
