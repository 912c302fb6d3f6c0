use crate::category::Category;
use crate::item::ResourceMode;
use serde::{Deserialize, Serialize};

/// Result of asking the inventory provider about one work item.
///
/// Either `error` is set, or `exists` is meaningful (with `live_id` when true).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub live_id: String,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationOutcome {
    pub fn found(live_id: impl Into<String>) -> Self {
        Self {
            live_id: live_id.into(),
            exists: true,
            error: None,
        }
    }

    pub fn missing() -> Self {
        Self {
            live_id: String::new(),
            exists: false,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            live_id: String::new(),
            exists: false,
            error: Some(message.into()),
        }
    }
}

/// Terminal classification of one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub address: String,
    /// Resource type, e.g. `aws_security_group`.
    pub kind: String,
    pub mode: ResourceMode,
    pub category: Category,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub declared_id: String,

    #[serde(default)]
    pub live_id: String,

    /// Region the snapshot claims, for region mismatches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_region: Option<String>,
}
