use crate::model::StateSnapshot;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// The only snapshot format version this crate decodes.
pub const SUPPORTED_FORMAT_VERSION: u64 = 4;

/// Fatal snapshot decoding failures. Any of these aborts the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no state: the snapshot is empty")]
    EmptyState,

    #[error(
        "the state is stored in a legacy binary format that is not supported since Terraform v0.7; \
         upgrade it using Terraform 0.6.16 or earlier"
    )]
    LegacyBinaryFormat,

    #[error(
        "the state file does not have a \"version\" attribute, which is required to identify the format version"
    )]
    MissingVersion,

    #[error(
        "the state file uses JSON syntax but has a version number of zero; \
         there was never a JSON-based format zero, so this state file is invalid"
    )]
    ZeroVersion,

    #[error(
        "the state file uses format version {version}, which is not supported (only version {supported}){}",
        created_by(.tool_version),
        supported = SUPPORTED_FORMAT_VERSION
    )]
    UnsupportedVersion {
        version: u64,
        tool_version: Option<String>,
    },

    #[error("the state file could not be parsed: {message}")]
    Malformed { message: String },
}

fn created_by(tool_version: &Option<String>) -> String {
    match tool_version {
        Some(v) => format!("; it was created by Terraform {v}"),
        None => String::new(),
    }
}

#[derive(Deserialize)]
struct VersionSniff {
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    terraform_version: Option<serde_json::Value>,
}

/// Decode raw snapshot bytes into the canonical model.
pub fn decode_snapshot(bytes: &[u8]) -> Result<StateSnapshot, DecodeError> {
    let first = bytes.iter().copied().find(|b| !b.is_ascii_whitespace());
    match first {
        None => return Err(DecodeError::EmptyState),
        Some(b'{') => {}
        Some(b'[') => {
            return Err(DecodeError::Malformed {
                message: "expected a JSON object at the top level".to_string(),
            });
        }
        Some(_) => return Err(DecodeError::LegacyBinaryFormat),
    }

    let sniff: VersionSniff = serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed {
        message: e.to_string(),
    })?;

    let version = sniff.version.ok_or(DecodeError::MissingVersion)?;
    debug!(version, "sniffed snapshot format version");

    match version {
        0 => Err(DecodeError::ZeroVersion),
        SUPPORTED_FORMAT_VERSION => {
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed {
                message: format!("invalid version {SUPPORTED_FORMAT_VERSION} document: {e}"),
            })
        }
        other => Err(DecodeError::UnsupportedVersion {
            version: other,
            tool_version: sniff
                .terraform_version
                .as_ref()
                .and_then(serde_json::Value::as_str)
                .filter(|v| looks_like_version(v))
                .map(str::to_string),
        }),
    }
}

/// Accept `1.5.7`-style strings so garbage never ends up in error messages.
fn looks_like_version(s: &str) -> bool {
    let core = s.split(['-', '+']).next().unwrap_or_default();
    !core.is_empty()
        && core
            .split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}
