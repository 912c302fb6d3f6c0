//! Backup and integrity artifacts for driftcheck runs.
//!
//! Every artifact lands at a deterministic, write-once path keyed by the run
//! timestamp, its role and the original snapshot name, with a sibling
//! `.sha256` file for independent verification.

mod manager;
mod paths;
mod writer;

pub use manager::{IntegrityManager, PublishGate, content_changed};
pub use paths::{RunStamp, artifact_path, clean_base_name, hash_path};
pub use writer::{ArtifactWriter, BackupWriteError, FsArtifactWriter, WriteStatus};
