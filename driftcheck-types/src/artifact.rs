use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a backup artifact within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// Pristine snapshot bytes, captured before any mutation.
    Original,
    /// Working snapshot after remediation.
    New,
    Report,
}

impl ArtifactRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactRole::Original => "original",
            ArtifactRole::New => "new",
            ArtifactRole::Report => "report",
        }
    }
}

/// A write-once file produced by the integrity manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub role: ArtifactRole,
    pub path: Utf8PathBuf,
    /// Hex SHA-256 of the artifact bytes.
    pub content_hash: String,
    /// Sibling file holding `content_hash`.
    pub hash_path: Utf8PathBuf,
    pub created_at: DateTime<Utc>,
}
