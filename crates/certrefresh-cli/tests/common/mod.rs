//! Shared helpers for certrefresh CLI tests.
#![allow(dead_code)]

use assert_cmd::Command;
use rcgen::{CertificateParams, DnType, KeyPair};
use std::fs;
use std::path::{Path, PathBuf};

/// The `certrefresh` binary with configuration variables cleared
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn certrefresh() -> Command {
    let mut cmd = Command::cargo_bin("certrefresh").expect("certrefresh binary not found");
    cmd.env_remove("CERTREFRESH_NUM_ACCOUNTS")
        .env_remove("CERTREFRESH_TRACING_KEY_MATCH")
        .env_remove("RUST_LOG");
    cmd
}

/// Self-signed certificate and key for `common_name`, PEM encoded
pub fn self_signed(common_name: &str) -> (String, String) {
    let mut params = CertificateParams::new(vec![common_name.to_string()]).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    let key_pair = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key_pair).unwrap();
    (cert.pem(), key_pair.serialize_pem())
}

/// Write a chain file and a key file for `common_name` into `dir`
pub fn write_cert_files(dir: &Path, common_name: &str) -> (PathBuf, PathBuf) {
    let (cert, key) = self_signed(common_name);
    let cert_path = dir.join("fullchain.pem");
    let key_path = dir.join("privkey.pem");
    fs::write(&cert_path, cert).unwrap();
    fs::write(&key_path, key).unwrap();
    (cert_path, key_path)
}

/// Minimal valid config pointing at an unreachable API host
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let path = dir.join("certrefresh.toml");
    fs::write(
        &path,
        format!(
            r#"
[[accounts]]
ak = "AK0000000001"
sk = "SK1"
display_name = "test"

[api]
host = "http://127.0.0.1:9"
timeout_secs = 2
{}
"#,
            extra
        ),
    )
    .unwrap();
    path
}
