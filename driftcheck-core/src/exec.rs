//! Preparation and sequential execution of remediation commands.

use crate::ports::CommandRunner;
use driftcheck_types::exec::{CommandExecutionLog, ExecutionReport};
use tracing::{info, warn};

/// A remediation command split into program and arguments, with the
/// state path already injected where required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub program: String,
    pub args: Vec<String>,
    /// `terraform import` or `terraform state ...`.
    pub state_altering: bool,
}

impl PreparedCommand {
    /// Command line as it is recorded in execution logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrepareCommandError {
    #[error("empty command")]
    Empty,

    #[error("malformed terraform import command: expects ADDR and ID")]
    MalformedImport,

    #[error("malformed terraform state command: missing subcommand")]
    MalformedState,
}

impl PrepareCommandError {
    /// Rejected terraform commands still count as attempted mutations.
    pub fn state_altering(&self) -> bool {
        !matches!(self, PrepareCommandError::Empty)
    }
}

/// Split `command` on whitespace and inject `-state=<state_path>` after the
/// terraform subcommand unless a `-state=` flag is already present.
pub fn prepare_command(
    command: &str,
    state_path: &str,
) -> Result<PreparedCommand, PrepareCommandError> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or(PrepareCommandError::Empty)?;
    let args: Vec<String> = parts.collect();

    if program != "terraform" {
        return Ok(PreparedCommand {
            program,
            args,
            state_altering: false,
        });
    }

    let has_state_flag = args.iter().any(|a| a.starts_with("-state="));
    let state_flag = format!("-state={state_path}");

    let (args, state_altering) = match args.first().map(String::as_str) {
        Some("import") => {
            if args.len() < 3 {
                return Err(PrepareCommandError::MalformedImport);
            }
            let mut out = vec![args[0].clone()];
            if !has_state_flag {
                out.push(state_flag);
            }
            out.extend(args[1..].iter().cloned());
            (out, true)
        }
        Some("state") => {
            if args.len() < 2 {
                return Err(PrepareCommandError::MalformedState);
            }
            let mut out = vec![args[0].clone(), args[1].clone()];
            if !has_state_flag {
                out.push(state_flag);
            }
            out.extend(args[2..].iter().cloned());
            (out, true)
        }
        _ => (args, false),
    };

    Ok(PreparedCommand {
        program,
        args,
        state_altering,
    })
}

/// Run `commands` in order. A failed command never stops the ones after it.
///
/// Logs are returned ordered by command text.
pub fn execute_commands(
    commands: &[String],
    state_path: &str,
    runner: &dyn CommandRunner,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for raw in commands {
        let raw = raw.trim();
        let log = match prepare_command(raw, state_path) {
            Ok(prepared) => {
                report.state_altering_attempted |= prepared.state_altering;
                info!(command = %prepared.display(), "executing remediation command");
                let log = runner.run(&prepared);
                if !log.succeeded() {
                    let reason = log
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("exit code {}", log.exit_code));
                    report
                        .first_error
                        .get_or_insert_with(|| format!("command '{}' failed: {reason}", log.command));
                }
                log
            }
            Err(PrepareCommandError::Empty) => continue,
            Err(e) => {
                report.state_altering_attempted |= e.state_altering();
                warn!(command = %raw, error = %e, "rejected remediation command");
                report.first_error.get_or_insert_with(|| e.to_string());
                CommandExecutionLog {
                    command: raw.to_string(),
                    error: Some(e.to_string()),
                    exit_code: 1,
                    ..Default::default()
                }
            }
        };
        report.logs.push(log);
    }

    report.logs.sort_by(|a, b| a.command.cmp(&b.command));
    report
}
