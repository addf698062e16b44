//! CLI options interaction tests
//!
//! These run the `nst` binary for every path that finishes without touching
//! the network: informational flags, argument validation and configuration
//! errors.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Command running in an empty directory with no speed test variables set
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nst").unwrap();
    cmd.current_dir(dir.path());
    for var in [
        "SPEEDTEST_SERVER",
        "DEFAULT_SERVER",
        "PROBE_TIMEOUT_MS",
        "TRANSFER_TIMEOUT_SECONDS",
        "UPLOAD_PAYLOAD_BYTES",
        "HISTORY_DISPLAY",
        "RUN_COUNT",
        "ENABLE_COLOR",
        "NST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_env_file(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_help_lists_main_options() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--transfer-timeout"))
        .stdout(predicate::str::contains("--list-servers"))
        .stdout(predicate::str::contains("Supported Environment Variables"));
}

#[test]
fn test_list_servers_shows_builtin_servers() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--list-servers", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auto"))
        .stdout(predicate::str::contains("hetzner"))
        .stdout(predicate::str::contains("cloudflare"))
        .stdout(predicate::str::contains("tele2"));
}

#[test]
fn test_list_servers_reflects_default_server() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--list-servers", "--no-color", "--default-server", "tele2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default server (tele2)"));
}

#[test]
fn test_version_info() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--version-info")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("Git commit:"));
}

#[test]
fn test_print_env_example() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--print-env-example")
        .assert()
        .success()
        .stdout(predicate::str::contains("SPEEDTEST_SERVER="))
        .stdout(predicate::str::contains("TRANSFER_TIMEOUT_SECONDS="));
}

#[test]
fn test_unknown_server_exits_with_config_error() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--server", "mars", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("mars"));
}

#[test]
fn test_unknown_server_from_env_file() {
    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "SPEEDTEST_SERVER=atlantis\n");

    create_test_cmd(&dir)
        .arg("--no-color")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("atlantis"));
}

#[test]
fn test_missing_explicit_env_file() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--env-file", "does-not-exist.env", "--no-color"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does-not-exist.env"));
}

#[test]
fn test_conflicting_color_flags() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--color", "--no-color", "--list-servers"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--color"));
}

#[test]
fn test_invalid_numeric_arguments_rejected() {
    let dir = TempDir::new().unwrap();

    for args in [
        vec!["--transfer-timeout", "0"],
        vec!["--transfer-timeout", "601"],
        vec!["--upload-size", "lots"],
        vec!["--runs", "-1"],
    ] {
        create_test_cmd(&dir).args(&args).assert().failure();
    }

    create_test_cmd(&dir)
        .args(["--runs", "0", "--no-color"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_default_server() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--default-server", "auto", "--list-servers", "--no-color"])
        .assert()
        .code(1);
}

#[test]
fn test_write_env_example_creates_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("sample.env");

    create_test_cmd(&dir)
        .args(["--write-env-example", target.to_str().unwrap(), "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote example settings"));

    let content = fs::read_to_string(&target).unwrap();
    assert!(content.contains("SPEEDTEST_SERVER="));
}

#[test]
fn test_write_env_example_ignores_broken_env_file() {
    let dir = TempDir::new().unwrap();
    write_env_file(&dir, ".env", "SPEEDTEST_SERVER=atlantis\n");

    create_test_cmd(&dir)
        .args(["--write-env-example", "fresh.env", "--no-color"])
        .assert()
        .success();
    assert!(dir.path().join("fresh.env").exists());
}
