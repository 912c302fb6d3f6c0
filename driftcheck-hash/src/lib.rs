//! SHA-256 helpers shared by the integrity manager and the pipeline.

use fs_err as fs;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::Path;

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Hex-encoded SHA-256 of the file at `path`, streamed.
pub fn sha256_file_hex(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = fs::File::open(path.as_ref())?;
    let mut h = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }
    Ok(hex::encode(h.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn identical_content_hashes_identically() {
        assert_eq!(sha256_hex(b"state"), sha256_hex(b"state"));
        assert_ne!(sha256_hex(b"state"), sha256_hex(b"state\n"));
    }

    #[test]
    fn file_hash_matches_slice_hash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.tfstate");
        let body = vec![b'x'; 20_000];
        std::fs::write(&path, &body).expect("write");

        assert_eq!(sha256_file_hex(&path).expect("hash"), sha256_hex(&body));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(sha256_file_hex(dir.path().join("nope")).is_err());
    }
}
