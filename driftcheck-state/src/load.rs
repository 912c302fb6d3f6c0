use crate::decode::{DecodeError, decode_snapshot};
use crate::model::StateSnapshot;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use tracing::debug;

/// A snapshot file read from disk together with its decode result.
///
/// The raw bytes are kept so the pristine content can be backed up and
/// hashed exactly as it was read.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub path: Utf8PathBuf,
    pub bytes: Vec<u8>,
    pub snapshot: Result<StateSnapshot, DecodeError>,
}

/// Read and decode the snapshot at `path`.
///
/// I/O failures are returned as errors; decode failures are carried in
/// [`LoadedSnapshot::snapshot`] so the caller decides how to abort.
pub fn load_snapshot(path: &Utf8Path) -> anyhow::Result<LoadedSnapshot> {
    debug!(path = %path, "reading state snapshot");
    let bytes = fs::read(path).with_context(|| format!("read state file {}", path))?;
    let snapshot = decode_snapshot(&bytes);

    match &snapshot {
        Ok(s) => debug!(
            path = %path,
            version = s.version,
            resources = s.resources.len(),
            instances = s.instance_count(),
            "decoded state snapshot"
        ),
        Err(e) => debug!(path = %path, error = %e, "state snapshot rejected"),
    }

    Ok(LoadedSnapshot {
        path: path.to_path_buf(),
        bytes,
        snapshot,
    })
}
