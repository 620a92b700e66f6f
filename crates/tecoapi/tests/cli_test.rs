//! Integration tests for the `tecoapi` CLI binary.
//!
//! These cover argument parsing, help output, config handling and error
//! exit codes without a live PLC.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `tecoapi` binary with env isolation.
///
/// Clears all `TECOAPI_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn tecoapi_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tecoapi");
    cmd.env("HOME", "/tmp/tecoapi-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/tecoapi-cli-test-nonexistent")
        .env_remove("TECOAPI_CONFIG")
        .env_remove("TECOAPI_RESOURCE")
        .env_remove("TECOAPI_USERNAME")
        .env_remove("TECOAPI_PASSWORD")
        .env_remove("TECOAPI_PASSWORD_ENV")
        .env_remove("TECOAPI_TIMEOUT")
        .env_remove("TECOAPI_SETUP_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = tecoapi_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    tecoapi_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("TecoApi")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("get"))
            .and(predicate::str::contains("set"))
            .and(predicate::str::contains("entities")),
    );
}

#[test]
fn test_version_flag() {
    tecoapi_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tecoapi"));
}

#[test]
fn test_get_requires_path() {
    tecoapi_cmd()
        .arg("get")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("<PATH>"));
}

#[test]
fn test_unknown_subcommand() {
    tecoapi_cmd().arg("frobnicate").assert().failure().code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    tecoapi_cmd()
        .args(["--config", "/tmp/somewhere/tecoapi.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/somewhere/tecoapi.toml"));
}

#[test]
fn test_config_show_masks_password() {
    let file = config_file(
        r#"
resource = "https://plc.local/TecoApi/"
username = "admin"
password = "hunter2"

[[switches]]
object = "LIGHTS"
"#,
    );

    tecoapi_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("LIGHTS")
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_missing_config_is_reported() {
    let output = tecoapi_cmd()
        .args(["--config", "/tmp/tecoapi-cli-test-nonexistent/none.toml", "entities"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("Configuration file not found"),
        "Expected missing-config error in output:\n{text}"
    );
}

#[test]
fn test_missing_password_exits_with_auth_code() {
    let file = config_file(
        r#"
resource = "https://plc.local/TecoApi/"
username = "admin"
"#,
    );

    tecoapi_cmd()
        .arg("--config")
        .arg(file.path())
        .arg("entities")
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_invalid_json_value_is_usage_error() {
    let file = config_file(
        r#"
resource = "http://127.0.0.1:9/TecoApi/"
username = "admin"
password = "x"
"#,
    );

    tecoapi_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["set", "LIGHTS", "not json"])
        .assert()
        .failure()
        .code(2);
}
