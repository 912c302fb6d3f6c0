use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use driftcheck_types::artifact::ArtifactRole;

/// Calendar bucket and timestamp shared by every artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    at: DateTime<Utc>,
}

impl RunStamp {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// `YYYY/MM`.
    pub fn bucket(&self) -> String {
        self.at.format("%Y/%m").to_string()
    }

    pub fn timestamp(&self) -> String {
        self.at.format("%Y%m%dT%H%M%SZ").to_string()
    }
}

/// Lowercased file name with `.tfstate` and then any other extension removed.
///
/// A leading dot does not start an extension. Falls back to `state` when
/// nothing is left.
pub fn clean_base_name(source: &Utf8Path) -> String {
    let base = source.file_name().unwrap_or(source.as_str());
    let lower = base.to_lowercase();
    let without_state = lower.strip_suffix(".tfstate").unwrap_or(&lower);
    let clean = match without_state.rfind('.') {
        Some(dot) if dot > 0 => &without_state[..dot],
        _ => without_state,
    };

    if clean.is_empty() {
        "state".to_string()
    } else {
        clean.to_string()
    }
}

/// `<base>/YYYY/MM/<timestamp>/<role>.<clean-name><extension>`
pub fn artifact_path(
    base_dir: &Utf8Path,
    stamp: &RunStamp,
    role: ArtifactRole,
    source: &Utf8Path,
    extension: &str,
) -> Utf8PathBuf {
    base_dir
        .join(stamp.bucket())
        .join(stamp.timestamp())
        .join(format!(
            "{}.{}{}",
            role.as_str(),
            clean_base_name(source),
            extension
        ))
}

/// Sibling hash file for an artifact.
pub fn hash_path(artifact: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{artifact}.sha256"))
}
