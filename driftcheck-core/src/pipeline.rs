//! Core reconciliation pipeline, extracted from the CLI.
//!
//! The entry point is I/O-agnostic: snapshot access, command execution,
//! artifact writes and publishing all go through the port traits.

use crate::context::RunContext;
use crate::exec::execute_commands;
use crate::ports::{CommandRunner, SnapshotPublisher, SnapshotSource};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use driftcheck_artifacts::{ArtifactWriter, IntegrityManager, content_changed};
use driftcheck_domain::{Aggregation, Dispatcher, VerifierRegistry, enumerate};
use driftcheck_hash::sha256_hex;
use driftcheck_render::render_report_text;
use driftcheck_state::{DecodeError, StateSnapshot};
use driftcheck_types::artifact::ArtifactRole;
use driftcheck_types::exec::ExecutionReport;
use driftcheck_types::report::{DriftReport, ReportItem};
use std::sync::Arc;
use tracing::{error, info, warn};

const STATE_EXT: &str = ".tfstate";

/// Error type for pipeline results. Exit code 2 = remediation commands failed, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to decode state snapshot: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("{failed} remediation command(s) failed")]
    CommandsFailed { failed: usize },

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::CommandsFailed { .. } => 2,
            _ => 1,
        }
    }
}

/// I/O collaborators for one run.
pub struct RunPorts<'a> {
    pub source: &'a dyn SnapshotSource,
    pub runner: &'a dyn CommandRunner,
    pub writer: &'a dyn ArtifactWriter,
    pub publisher: Option<&'a dyn SnapshotPublisher>,
}

/// Outcome of `run_reconcile`.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: DriftReport,
    /// Rendered text report, as written to the report artifact.
    pub text: String,
    pub aggregation: Aggregation,
    pub execution: ExecutionReport,
}

impl RunOutcome {
    pub fn commands_failed(&self) -> usize {
        self.execution.failed_count()
    }
}

/// Run the reconciliation pipeline.
///
/// A snapshot that fails to decode aborts the run before any artifact is
/// written. Once decoding succeeds, the report artifacts are always written,
/// including when a later step fails.
pub async fn run_reconcile(
    ctx: &RunContext,
    registry: Arc<VerifierRegistry>,
    ports: &RunPorts<'_>,
) -> Result<RunOutcome, ToolError> {
    ctx.settings
        .validate()
        .map_err(ToolError::InvalidSettings)?;

    let loaded = ports.source.load()?;
    let snapshot = loaded.snapshot?;
    info!(
        path = %loaded.path,
        version = snapshot.version,
        terraform_version = %snapshot.terraform_version,
        resources = snapshot.resources.len(),
        "decoded state snapshot"
    );

    let original_hash = sha256_hex(&loaded.bytes);
    let mut manager = IntegrityManager::new(
        ports.writer,
        ctx.settings.backups_dir.clone(),
        loaded.path.clone(),
        ctx.stamp.clone(),
    );
    let mut report = ctx.new_report(&snapshot, loaded.path.as_str(), &original_hash);

    if let Some(artifact) =
        manager.store_or_warn(ArtifactRole::Original, STATE_EXT, &loaded.bytes)
    {
        report.backup.original_path = Some(artifact.path.to_string());
        report.backup.original_checksum = Some(artifact.content_hash);
    }

    let reconciled = reconcile(
        ctx,
        registry,
        ports,
        &snapshot,
        &loaded.path,
        &original_hash,
        &mut manager,
        &mut report,
    )
    .await;

    let (aggregation, execution) = match reconciled {
        Ok(v) => v,
        Err(err) => return Err(handle_failure(ctx, &mut manager, report, err)),
    };

    report.ended_at = Some(ctx.now());
    let text = write_run_artifacts(&mut manager, &mut report)?;
    info!(
        run_id = %ctx.run_id,
        total = aggregation.total(),
        commands = aggregation.commands().len(),
        content_changed = report.content_changed,
        "reconciliation finished"
    );

    Ok(RunOutcome {
        report,
        text,
        aggregation,
        execution,
    })
}

#[allow(clippy::too_many_arguments)]
async fn reconcile(
    ctx: &RunContext,
    registry: Arc<VerifierRegistry>,
    ports: &RunPorts<'_>,
    snapshot: &StateSnapshot,
    local_path: &Utf8Path,
    original_hash: &str,
    manager: &mut IntegrityManager<'_>,
    report: &mut DriftReport,
) -> anyhow::Result<(Aggregation, ExecutionReport)> {
    let settings = &ctx.settings;

    let items = enumerate(snapshot);
    let dispatcher = Dispatcher::new(registry, settings.region.clone(), settings.concurrency);
    let dispatched = dispatcher
        .dispatch(items)
        .await
        .context("verify resources")?;

    report.region_mismatches = dispatched.region_mismatches;
    let aggregation = Aggregation::from_results(dispatched.results);
    report.results = aggregation
        .iter()
        .map(|(category, bucket)| {
            let items: Vec<ReportItem> = bucket.iter().map(ReportItem::from).collect();
            (category, items)
        })
        .collect();
    report.commands = aggregation.commands().to_vec();

    let execution = if settings.execute {
        let state_arg = absolute_state_path(local_path);
        execute_commands(aggregation.commands(), state_arg.as_str(), ports.runner)
    } else {
        ExecutionReport::default()
    };
    report.execution_logs = execution.logs.clone();
    if let Some(first) = &execution.first_error {
        report.application_error = Some(format!(
            "{} remediation command(s) failed; first error: {first}",
            execution.failed_count()
        ));
    }

    let current = match ports.source.read_current() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "cannot re-read snapshot; treating content as changed");
            None
        }
    };
    report.state_checksum = current.as_deref().map(sha256_hex);
    report.content_changed = content_changed(original_hash, report.state_checksum.as_deref());

    if report.content_changed
        && let Some(bytes) = &current
        && let Some(artifact) = manager.store_or_warn(ArtifactRole::New, STATE_EXT, bytes)
    {
        report.backup.new_path = Some(artifact.path.to_string());
        report.backup.new_checksum = Some(artifact.content_hash);
    }

    if let Some(publisher) = ports.publisher {
        let gate = settings.publish_on;
        if gate.allows(report.content_changed, execution.state_altering_attempted) {
            match publisher.publish(local_path) {
                Ok(()) => {
                    info!(path = %local_path, "published updated snapshot");
                    report.published = true;
                }
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "publishing snapshot failed");
                    report.publish_error = Some(format!("{e:#}"));
                }
            }
        } else {
            info!(gate = %gate, "snapshot not published");
        }
    }

    Ok((aggregation, execution))
}

/// Resolve the snapshot path against the current directory.
///
/// Remediation commands run in the terraform working directory, so a
/// relative `-state=` would point at a different file.
fn absolute_state_path(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(resolved) = path.canonicalize_utf8() {
        return resolved;
    }
    match std::env::current_dir().map(Utf8PathBuf::try_from) {
        Ok(Ok(cwd)) => cwd.join(path),
        _ => {
            warn!(path = %path, "cannot resolve working directory; using state path as given");
            path.to_path_buf()
        }
    }
}

/// Render and write the text and JSON report artifacts.
///
/// Returns the rendered text report. Write failures are recorded in
/// `report.backup_errors`, never returned.
pub fn write_run_artifacts(
    manager: &mut IntegrityManager<'_>,
    report: &mut DriftReport,
) -> anyhow::Result<String> {
    report.ended_at.get_or_insert_with(Utc::now);
    report.backup_errors = manager.errors().to_vec();

    let text = render_report_text(report);
    if let Some(artifact) = manager.store_or_warn(ArtifactRole::Report, ".txt", text.as_bytes()) {
        report.backup.report_path = Some(artifact.path.to_string());
        report.backup.report_checksum = Some(artifact.content_hash);
    }

    report.backup.json_report_path = Some(manager.path_for(ArtifactRole::Report, ".json").to_string());
    let json = render_report_json(report)?;
    if let Some(artifact) = manager.store_or_warn(ArtifactRole::Report, ".json", json.as_bytes()) {
        report.backup.json_report_checksum = Some(artifact.content_hash);
    }

    report.backup_errors = manager.errors().to_vec();
    Ok(text)
}

/// Machine-readable summary.
pub fn render_report_json(report: &DriftReport) -> anyhow::Result<String> {
    serde_json::to_string_pretty(report).context("serialize report")
}

/// Record `err` on the report, write what can still be written, and convert
/// the failure into a [`ToolError`].
pub fn handle_failure(
    ctx: &RunContext,
    manager: &mut IntegrityManager<'_>,
    mut report: DriftReport,
    err: anyhow::Error,
) -> ToolError {
    error!(run_id = %ctx.run_id, error = %format!("{err:#}"), "reconciliation failed");
    report.application_error = Some(format!("{err:#}"));
    report.ended_at = Some(ctx.now());

    if let Err(e) = write_run_artifacts(manager, &mut report) {
        warn!(error = %format!("{e:#}"), "could not write failure report");
    }
    ToolError::Internal(err)
}
