use serde::{Deserialize, Serialize};

/// Outcome of running one remediation command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandExecutionLog {
    pub command: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub exit_code: i32,
}

impl CommandExecutionLog {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.exit_code == 0
    }
}

/// Everything the command runner reports back for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub logs: Vec<CommandExecutionLog>,
    /// True when any state-altering command was attempted, even if it failed.
    pub state_altering_attempted: bool,
    pub first_error: Option<String>,
}

impl ExecutionReport {
    pub fn failed_count(&self) -> usize {
        self.logs.iter().filter(|l| !l.succeeded()).count()
    }
}
