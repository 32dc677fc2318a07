//! End-to-end tests of the certrefresh binary
//!
//! None of these reach the network: each case fails or finishes before the
//! first API call, or talks to a closed local port.

mod common;

use common::{certrefresh, write_cert_files, write_config};
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_cli_no_args() {
    certrefresh()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    certrefresh()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("--env-config"));
}

#[test]
fn test_version_command() {
    certrefresh()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("certrefresh"));
}

#[test]
fn test_completions() {
    certrefresh()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("certrefresh"));
}

#[test]
fn test_conflicting_config_flags() {
    certrefresh()
        .args(["-c", "certrefresh.toml", "-e", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "cannot force configuration from both",
        ));
}

#[test]
fn test_missing_default_config() {
    let dir = TempDir::new().unwrap();
    certrefresh()
        .current_dir(dir.path())
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("certrefresh.toml"));
}

#[test]
fn test_env_config_requires_secret_key() {
    certrefresh()
        .env("CERTREFRESH_NUM_ACCOUNTS", "1")
        .env("CERTREFRESH_ACCOUNT_1_AK", "AK0000000001")
        .env_remove("CERTREFRESH_ACCOUNT_1_SK")
        .args(["-e", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CERTREFRESH_ACCOUNT_1_SK"));
}

#[test]
fn test_invalid_config_value() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "[refresh]\nmax_concurrency = 0\n");
    certrefresh()
        .arg("-c")
        .arg(&config)
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refresh.max_concurrency"));
}

#[test]
fn test_upload_requires_key_and_pem() {
    certrefresh()
        .args(["upload", "www.example.com", "--cert", "fullchain.pem"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pem"));
}

#[test]
fn test_upload_rejects_empty_tracing_key() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    let (cert, key) = write_cert_files(dir.path(), "www.example.com");

    certrefresh()
        .arg("-c")
        .arg(&config)
        .args(["upload", ""])
        .arg("--cert")
        .arg(&cert)
        .arg("--pem")
        .arg(&key)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tracing key"));
}

#[test]
fn test_upload_missing_chain_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    certrefresh()
        .arg("-c")
        .arg(&config)
        .args(["u", "www.example.com", "--cert", "missing.pem", "--pem", "missing.key"])
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read certificate chain"));
}

#[test]
fn test_info_continues_past_unreachable_account() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    certrefresh()
        .arg("-c")
        .arg(&config)
        .arg("info")
        .assert()
        .success()
        .stderr(predicate::str::contains("Account test"));
}

#[test]
fn test_delete_reports_api_failure() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    certrefresh()
        .arg("-c")
        .arg(&config)
        .args(["delete", "cert-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to delete certificate cert-1"));
}
