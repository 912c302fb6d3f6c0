//! Port traits abstracting all I/O away from the pipeline.

use crate::exec::PreparedCommand;
use camino::Utf8Path;
use driftcheck_state::LoadedSnapshot;
use driftcheck_types::exec::CommandExecutionLog;

/// Source of the state snapshot under reconciliation.
pub trait SnapshotSource {
    /// Read and decode the snapshot as it is at the start of the run.
    fn load(&self) -> anyhow::Result<LoadedSnapshot>;

    /// Current bytes of the working snapshot, after any remediation.
    fn read_current(&self) -> anyhow::Result<Vec<u8>>;
}

/// Runs one prepared remediation command to completion.
///
/// Failures are reported in the returned log, never as a panic or error.
pub trait CommandRunner {
    fn run(&self, command: &PreparedCommand) -> CommandExecutionLog;
}

/// Makes an updated snapshot visible outside the run.
pub trait SnapshotPublisher {
    fn publish(&self, snapshot: &Utf8Path) -> anyhow::Result<()>;
}
