use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Helper to get a temporary config directory
fn temp_config_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Helper to get config file path in the temp dir
fn config_file_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join(".storewatch").join("config.json")
}

const BINARY_NAME: &str = "storewatch";

// A port nothing listens on, so commands against it fail fast without any
// real network traffic.
const DEAD_BACKEND: &str = "http://127.0.0.1:9";

#[test]
/// Help command should display usage information.
fn cli_help_displays_usage() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("Command-line arguments"));
}

#[test]
/// Unknown subcommands should be rejected by the parser.
fn unknown_subcommand_is_rejected() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("observe");
    cmd.assert()
        .failure()
        .stderr(contains("unrecognized subcommand"));
}

#[test]
/// `--max-cycles 0` is meaningless and should fail argument validation.
fn zero_max_cycles_is_rejected() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args(["start", "--max-cycles", "0"]);
    cmd.assert().failure().stderr(contains("invalid value"));
}

#[test]
/// Status against a dead backend should exit nonzero with a readable error.
fn status_against_unreachable_backend_fails() {
    let tmp = temp_config_dir();

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args(["status", "--base-url", DEAD_BACKEND])
        .env("HOME", tmp.path())
        .timeout(Duration::from_secs(60));
    cmd.assert()
        .failure()
        .stdout(contains("Could not fetch dashboard data"));
}

#[test]
/// A bounded run should drive the refresh loop, count the (failed) cycle,
/// and shut itself down cleanly.
fn start_with_max_cycles_exits_after_bounded_run() {
    let tmp = temp_config_dir();

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args([
        "start",
        "--base-url",
        DEAD_BACKEND,
        "--interval",
        "1",
        "--max-cycles",
        "1",
    ])
    .env("HOME", tmp.path())
    .timeout(Duration::from_secs(60));
    cmd.assert()
        .success()
        .stdout(contains("exited successfully"));
}

#[test]
/// Disconnect command should delete an existing config file.
fn disconnect_deletes_config_file() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);
    fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    fs::write(&config_path, "{}").unwrap();

    // Ensure the file exists
    assert!(config_path.exists());

    // Run the command
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("disconnect")
        .env("HOME", tmp.path()) // simulate different $HOME
        .assert()
        .success()
        .stdout(contains("Disconnecting"));

    // Confirm the file was deleted
    assert!(!config_path.exists());
}

#[test]
/// Disconnecting when nothing is configured is not an error.
fn disconnect_without_config_succeeds() {
    let tmp = temp_config_dir();

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("disconnect")
        .env("HOME", tmp.path())
        .assert()
        .success()
        .stdout(contains("No config file found"));
}

#[test]
#[ignore] // Requires a backend listening on localhost:8069.
fn connect_command_creates_config_file() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);

    // Ensure the file does not exist initially
    assert!(!config_path.exists());

    // Run the command
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args(["connect", "--base-url", "http://localhost:8069"])
        .env("HOME", tmp.path()) // simulate different $HOME
        .assert()
        .success()
        .stdout(contains("Connected"));

    // Confirm the file was created
    assert!(config_path.exists());
}
