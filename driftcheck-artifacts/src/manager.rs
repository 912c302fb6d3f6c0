use crate::paths::{RunStamp, artifact_path, hash_path};
use crate::writer::{ArtifactWriter, BackupWriteError};
use camino::{Utf8Path, Utf8PathBuf};
use driftcheck_hash::sha256_hex;
use driftcheck_types::artifact::{ArtifactRole, BackupArtifact};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Condition under which an updated snapshot may be published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishGate {
    /// Only when the snapshot bytes changed.
    #[default]
    ContentChanged,
    /// Also when a state-altering command ran, even if the local bytes did not change.
    MutationAttempted,
}

impl PublishGate {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishGate::ContentChanged => "content-changed",
            PublishGate::MutationAttempted => "mutation-attempted",
        }
    }

    pub fn allows(self, content_changed: bool, mutation_attempted: bool) -> bool {
        match self {
            PublishGate::ContentChanged => content_changed,
            PublishGate::MutationAttempted => content_changed || mutation_attempted,
        }
    }
}

impl fmt::Display for PublishGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishGate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content-changed" => Ok(PublishGate::ContentChanged),
            "mutation-attempted" => Ok(PublishGate::MutationAttempted),
            other => Err(format!(
                "unknown publish gate '{other}' (expected content-changed or mutation-attempted)"
            )),
        }
    }
}

/// Writes the artifacts of one run and tracks what was written.
pub struct IntegrityManager<'a> {
    writer: &'a dyn ArtifactWriter,
    base_dir: Utf8PathBuf,
    source: Utf8PathBuf,
    stamp: RunStamp,
    artifacts: Vec<BackupArtifact>,
    errors: Vec<String>,
}

impl<'a> IntegrityManager<'a> {
    /// `source` is the snapshot path; only its file name feeds artifact names.
    pub fn new(
        writer: &'a dyn ArtifactWriter,
        base_dir: impl Into<Utf8PathBuf>,
        source: impl Into<Utf8PathBuf>,
        stamp: RunStamp,
    ) -> Self {
        Self {
            writer,
            base_dir: base_dir.into(),
            source: source.into(),
            stamp,
            artifacts: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn stamp(&self) -> &RunStamp {
        &self.stamp
    }

    pub fn path_for(&self, role: ArtifactRole, extension: &str) -> Utf8PathBuf {
        artifact_path(&self.base_dir, &self.stamp, role, &self.source, extension)
    }

    /// Persist `contents` and its sibling hash file.
    pub fn store(
        &mut self,
        role: ArtifactRole,
        extension: &str,
        contents: &[u8],
    ) -> Result<BackupArtifact, BackupWriteError> {
        let path = self.path_for(role, extension);
        if let Some(parent) = path.parent() {
            self.writer.create_dir_all(parent)?;
        }

        let status = self.writer.write_new(&path, contents)?;
        let content_hash = sha256_hex(contents);
        let hash_path = hash_path(&path);
        self.writer
            .write_new(&hash_path, hash_line(&content_hash, &path).as_bytes())?;
        debug!(path = %path, ?status, hash = %content_hash, "stored artifact");

        let artifact = BackupArtifact {
            role,
            path,
            content_hash,
            hash_path,
            created_at: self.stamp.at(),
        };
        self.artifacts.push(artifact.clone());
        Ok(artifact)
    }

    /// Like [`store`](Self::store), but a failure is logged and recorded
    /// instead of returned.
    pub fn store_or_warn(
        &mut self,
        role: ArtifactRole,
        extension: &str,
        contents: &[u8],
    ) -> Option<BackupArtifact> {
        match self.store(role, extension, contents) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(role = role.as_str(), error = %e, "backup write failed");
                self.errors.push(e.to_string());
                None
            }
        }
    }

    pub fn artifacts(&self) -> &[BackupArtifact] {
        &self.artifacts
    }

    /// Messages of failed writes, in order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Whether the snapshot changed during the run.
///
/// An unknown current hash counts as changed.
pub fn content_changed(original_hash: &str, current_hash: Option<&str>) -> bool {
    current_hash != Some(original_hash)
}

/// `sha256sum`-compatible line.
fn hash_line(hash: &str, path: &Utf8Path) -> String {
    format!("{hash}  {}\n", path.file_name().unwrap_or(path.as_str()))
}
