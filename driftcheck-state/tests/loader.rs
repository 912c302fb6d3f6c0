//! Snapshot file loading.

use camino::Utf8PathBuf;
use driftcheck_state::{DecodeError, load_snapshot};
use std::fs;
use tempfile::TempDir;

fn utf8(temp: &TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().join(name)).expect("utf8")
}

#[test]
fn loads_bytes_and_snapshot() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = utf8(&temp, "dev.tfstate");
    let body = r#"{"version": 4, "terraform_version": "1.7.5", "resources": []}"#;
    fs::write(&path, body).unwrap();

    let loaded = load_snapshot(&path).expect("load");
    assert_eq!(loaded.path, path);
    assert_eq!(loaded.bytes, body.as_bytes());
    assert_eq!(loaded.snapshot.expect("decoded").terraform_version, "1.7.5");
}

#[test]
fn decode_errors_are_carried_not_raised() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = utf8(&temp, "empty.tfstate");
    fs::write(&path, "").unwrap();

    let loaded = load_snapshot(&path).expect("io succeeded");
    assert_eq!(loaded.snapshot, Err(DecodeError::EmptyState));
}

#[test]
fn missing_file_is_an_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = load_snapshot(&utf8(&temp, "nope.tfstate")).expect_err("missing");
    assert!(format!("{err:#}").contains("read state file"));
}
