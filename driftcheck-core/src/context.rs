//! Explicit per-run context shared by the pipeline and its failure handler.

use crate::settings::RunSettings;
use chrono::{DateTime, Utc};
use driftcheck_artifacts::RunStamp;
use driftcheck_state::StateSnapshot;
use driftcheck_types::report::DriftReport;

/// Identity and settings of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub stamp: RunStamp,
    pub settings: RunSettings,
    /// Frozen clock; every timestamp of the run reads this when set.
    pub frozen_at: Option<DateTime<Utc>>,
}

impl RunContext {
    pub fn new(settings: RunSettings) -> Self {
        let started_at = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            stamp: RunStamp::new(started_at),
            settings,
            frozen_at: None,
        }
    }

    /// Context with a frozen clock and fixed id. Reruns with the same
    /// inputs render byte-identical reports.
    pub fn at(settings: RunSettings, started_at: DateTime<Utc>, run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
            stamp: RunStamp::new(started_at),
            settings,
            frozen_at: Some(started_at),
        }
    }

    /// Current time on this run's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.frozen_at.unwrap_or_else(Utc::now)
    }

    /// Report skeleton for a decoded snapshot; results are filled in later.
    pub fn new_report(
        &self,
        snapshot: &StateSnapshot,
        local_statefile: &str,
        original_hash: &str,
    ) -> DriftReport {
        DriftReport {
            schema: driftcheck_types::schema::DRIFTCHECK_REPORT_V1.to_string(),
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            ended_at: None,
            state: self.settings.state_path.to_string(),
            original_state_checksum: original_hash.to_string(),
            state_checksum: None,
            region: self.settings.region.clone(),
            local_statefile: local_statefile.to_string(),
            tf_version: snapshot.terraform_version.clone(),
            state_version: snapshot.version,
            concurrency: self.settings.concurrency,
            backups_dir: self.settings.backups_dir.to_string(),
            backup: Default::default(),
            commands: Vec::new(),
            execution_logs: Vec::new(),
            results: Default::default(),
            content_changed: false,
            published: false,
            region_mismatches: 0,
            backup_errors: Vec::new(),
            publish_error: None,
            application_error: None,
        }
    }
}
