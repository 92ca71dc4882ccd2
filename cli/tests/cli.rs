//! End-to-end checks of the `glia` binary that need no network

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn glia(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("glia").unwrap();
    cmd.env("GLIA_CONFIG_PATH", config_dir.path().join("config.json"))
        .env_remove("api_key_id")
        .env_remove("api_key_secret")
        .env_remove("site_id")
        .env_remove("GLIA_ENV");
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    glia(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("recent-logs"))
        .stdout(predicate::str::contains("kv-bulk"))
        .stdout(predicate::str::contains("mcp"));
}

#[test]
fn show_config_without_file() {
    let dir = TempDir::new().unwrap();
    glia(&dir)
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("API Key ID: Not set"))
        .stdout(predicate::str::contains("Environment: production"));
}

#[test]
fn function_commands_need_a_function() {
    let dir = TempDir::new().unwrap();
    glia(&dir)
        .arg("get-info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Function ID is required"));
}

#[test]
fn metadata_update_needs_a_field() {
    let dir = TempDir::new().unwrap();
    glia(&dir)
        .args(["update-metadata", "--function-id", "fn-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Either name or description must be provided",
        ));
}

#[test]
fn clear_is_idempotent() {
    let dir = TempDir::new().unwrap();
    glia(&dir)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("No function was selected"));
}

#[test]
fn unknown_environment_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    glia(&dir)
        .args(["--environment", "staging", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid environment 'staging'"));
}
