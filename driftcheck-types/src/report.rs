use crate::category::Category;
use crate::exec::CommandExecutionLog;
use crate::outcome::ClassifiedResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Machine-readable summary of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub schema: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// State location as given by the operator.
    pub state: String,

    /// Hash of the snapshot bytes as loaded, before any command ran.
    pub original_state_checksum: String,

    /// Hash of the working snapshot after the run; absent when it could not be computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_checksum: Option<String>,

    pub region: String,
    pub local_statefile: String,
    pub tf_version: String,
    pub state_version: u64,
    pub concurrency: usize,

    #[serde(default)]
    pub backups_dir: String,

    #[serde(default)]
    pub backup: ReportBackup,

    #[serde(default)]
    pub commands: Vec<String>,

    #[serde(default)]
    pub execution_logs: Vec<CommandExecutionLog>,

    #[serde(default)]
    pub results: BTreeMap<Category, Vec<ReportItem>>,

    #[serde(default)]
    pub content_changed: bool,

    #[serde(default)]
    pub published: bool,

    #[serde(default)]
    pub region_mismatches: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backup_errors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_error: Option<String>,
}

impl DriftReport {
    pub fn count(&self, category: Category) -> usize {
        self.results.get(&category).map_or(0, Vec::len)
    }
}

/// Paths and checksums of the artifacts written for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBackup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_report_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_report_checksum: Option<String>,
}

/// One classified resource in the machine-readable report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    pub resource: String,
    /// `resource` or `data`.
    pub kind: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub tf_id: String,
    #[serde(default)]
    pub aws_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub message: String,
}

impl From<&ClassifiedResult> for ReportItem {
    fn from(r: &ClassifiedResult) -> Self {
        Self {
            resource: r.address.clone(),
            kind: r.mode.report_kind().to_string(),
            resource_type: r.kind.clone(),
            tf_id: r.declared_id.clone(),
            aws_id: r.live_id.clone(),
            command: r.command.clone(),
            message: r.message.clone(),
        }
    }
}
