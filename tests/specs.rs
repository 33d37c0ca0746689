//! Black-box specs against the `appliance-daemon` binary. These exercise the
//! CLI boundary only — `check-config` loads and validates a real config file
//! without starting any workers, which is the only subcommand safe to run
//! as a short-lived child process in a test.

use assert_cmd::Command;
use std::io::Write;

fn appliance_daemon() -> Command {
    Command::cargo_bin("appliance-daemon").expect("binary built by this workspace")
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn check_config_accepts_minimal_yaml() {
    let config = write_config("site_id: site-1\napi_key: abc123\n");
    let output = appliance_daemon()
        .args(["--config", config.path().to_str().unwrap(), "check-config"])
        .output()
        .expect("spawn appliance-daemon");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("config OK"));
}

#[test]
fn check_config_rejects_missing_required_fields() {
    let config = write_config("state_dir: /tmp/x\n");
    let status = appliance_daemon()
        .args(["--config", config.path().to_str().unwrap(), "check-config"])
        .status()
        .expect("spawn appliance-daemon");
    assert!(!status.success());
}

#[test]
fn check_config_rejects_missing_file() {
    let status = appliance_daemon()
        .args(["--config", "/nonexistent/path/config.yaml", "check-config"])
        .status()
        .expect("spawn appliance-daemon");
    assert!(!status.success());
}

#[test]
fn run_is_the_default_subcommand_and_still_validates_config_first() {
    // With no subcommand given, `run` is selected; an invalid config must
    // still fail fast before any worker or HTTP listener starts.
    let status = appliance_daemon()
        .args(["--config", "/nonexistent/path/config.yaml"])
        .status()
        .expect("spawn appliance-daemon");
    assert!(!status.success());
}

#[test]
fn help_lists_both_subcommands() {
    let output = appliance_daemon().arg("--help").output().expect("spawn appliance-daemon");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check-config"));
}
