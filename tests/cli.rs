// ABOUTME: Integration tests for the caravan binary.
// ABOUTME: Covers help output, commands on empty workspaces and argument errors.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn caravan_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("caravan"))
}

#[test]
fn help_shows_commands() {
    caravan_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("bake"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn init_help_lists_provider_flags() {
    caravan_cmd()
        .args(["init", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--aws-profile"))
        .stdout(predicate::str::contains("--gcp-parent-project"))
        .stdout(predicate::str::contains("--azure-tenant-id"));
}

#[test]
fn clean_on_empty_workspace_is_already_clean() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("already clean"));

    assert!(!temp_dir.path().join(".caravan").exists());
}

#[test]
fn status_without_project_succeeds() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .arg("-C")
        .arg(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No project"));
}

#[test]
fn up_without_project_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .arg("up")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run init first"));
}

#[test]
fn init_rejects_unknown_provider() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "-p", "demo", "--provider", "openstack", "-r", "r1"])
        .args(["-d", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("openstack"));

    assert!(!temp_dir.path().join(".caravan/caravan.state").exists());
}

#[test]
fn init_requires_domain() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "-p", "demo", "--provider", "aws", "-r", "eu-west-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("domain"));

    assert!(!temp_dir.path().join(".caravan/caravan.state").exists());
}

#[test]
fn init_requires_identity_for_new_project() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--provider", "aws", "-r", "eu-west-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project"));
}

#[test]
fn malformed_settings_file_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("caravan.yml"), "probe: [not, a, map]").unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn json_mode_emits_events() {
    let temp_dir = tempfile::tempdir().unwrap();

    caravan_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"success""#));
}

#[test]
fn clean_help_separates_force_from_lock_breaking() {
    caravan_cmd()
        .args(["clean", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--break-lock"));
}
