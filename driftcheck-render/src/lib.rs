//! Rendering helpers for the human-readable reconciliation report.

use driftcheck_types::Category;
use driftcheck_types::exec::CommandExecutionLog;
use driftcheck_types::report::DriftReport;

const RULE: &str = "-------------------------------------------\n";

/// Full text report, as written to the `report.*.txt` artifact.
pub fn render_report_text(report: &DriftReport) -> String {
    let mut out = render_header(report);

    out.push_str(&format!(
        "Original State File Hash (SHA256): {}\n",
        report.original_state_checksum
    ));
    if let Some(hash) = &report.state_checksum {
        out.push_str(&format!("Modified State File Hash (SHA256): {}\n", hash));
    }
    out.push_str(&format!(
        "State File Content Changed: {}\n",
        if report.content_changed { "YES" } else { "NO" }
    ));
    out.push_str(RULE);
    out.push('\n');

    out.push_str(&render_results(report));
    out
}

/// Run parameters block at the top of every report.
pub fn render_header(report: &DriftReport) -> String {
    let mut out = String::new();
    out.push_str("--- Terraform State Reconciliation Report ---\n");
    out.push_str(&format!(
        "State File: {} (State Version: {}, Terraform Version: {})\n",
        report.state, report.state_version, report.tf_version
    ));
    out.push_str(&format!("AWS Region: {}\n", report.region));
    out.push_str(&format!("Concurrency: {}\n", report.concurrency));
    out.push_str(&format!("Backups Directory: {}\n", report.backups_dir));
    out.push_str(RULE);
    out.push('\n');
    out
}

/// Category sections, remediation commands, execution logs and any
/// application error. Empty sections are omitted.
pub fn render_results(report: &DriftReport) -> String {
    let mut out = String::new();

    for category in Category::ALL {
        let items = match report.results.get(&category) {
            Some(items) if !items.is_empty() => items,
            _ => continue,
        };
        out.push_str(&format!(
            "\n--- {} Results ({}) ---\n",
            category.title(),
            items.len()
        ));
        for item in items {
            out.push_str(&format!("{}: {}\n", category, item.message));
        }
    }

    if !report.commands.is_empty() {
        out.push_str(&format!(
            "\n--- SUGGESTED REMEDIATION COMMANDS ({}) ---\n",
            report.commands.len()
        ));
        for cmd in &report.commands {
            out.push_str(&format!("   {}\n", cmd));
        }
    }

    if !report.execution_logs.is_empty() {
        out.push_str(&format!(
            "\n--- COMMAND EXECUTION LOGS ({}) ---\n",
            report.execution_logs.len()
        ));
        for log in &report.execution_logs {
            render_execution_log(&mut out, log);
        }
    }

    if !report.backup_errors.is_empty() {
        out.push_str(&format!(
            "\n--- BACKUP WARNINGS ({}) ---\n",
            report.backup_errors.len()
        ));
        for e in &report.backup_errors {
            out.push_str(&format!("{}\n", e));
        }
    }

    if let Some(err) = &report.publish_error {
        out.push_str(&format!("\n--- PUBLISH ERROR ---\n{}\n", err));
    }

    if let Some(err) = &report.application_error {
        out.push_str(&format!("\n--- APPLICATION ERROR ---\n{}\n", err));
    }

    out
}

fn render_execution_log(out: &mut String, log: &CommandExecutionLog) {
    out.push_str(&format!("Command: {}\n", log.command));
    out.push_str(&format!("Exit Code: {}\n", log.exit_code));
    if let Some(err) = &log.error {
        out.push_str(&format!("Error: {}\n", err));
    }
    if !log.stdout.is_empty() {
        out.push_str(&format!("Stdout:\n{}\n", log.stdout));
    }
    if !log.stderr.is_empty() {
        out.push_str(&format!("Stderr:\n{}\n", log.stderr));
    }
    out.push_str("---\n");
}
