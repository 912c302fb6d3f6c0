//! Default filesystem and process-backed port implementations.

use crate::exec::PreparedCommand;
use crate::ports::{CommandRunner, SnapshotPublisher, SnapshotSource};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use driftcheck_hash::sha256_file_hex;
use driftcheck_state::{LoadedSnapshot, decode_snapshot};
use driftcheck_types::exec::CommandExecutionLog;
use fs_err as fs;
use std::process::Command;
use std::sync::Mutex;
use tracing::debug;

/// Reads the snapshot from a local file.
#[derive(Debug, Clone)]
pub struct FsSnapshotSource {
    pub path: Utf8PathBuf,
}

impl FsSnapshotSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl SnapshotSource for FsSnapshotSource {
    fn load(&self) -> anyhow::Result<LoadedSnapshot> {
        driftcheck_state::load_snapshot(&self.path)
    }

    fn read_current(&self) -> anyhow::Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("re-read state file {}", self.path))
    }
}

/// In-memory snapshot for embedding and testing.
///
/// [`replace`](Self::replace) stands in for an out-of-process mutation of
/// the working snapshot.
#[derive(Debug)]
pub struct InMemorySnapshotSource {
    label: Utf8PathBuf,
    original: Vec<u8>,
    current: Mutex<Vec<u8>>,
}

impl InMemorySnapshotSource {
    pub fn new(label: impl Into<Utf8PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            label: label.into(),
            current: Mutex::new(bytes.clone()),
            original: bytes,
        }
    }

    pub fn replace(&self, bytes: impl Into<Vec<u8>>) {
        *self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = bytes.into();
    }
}

impl SnapshotSource for InMemorySnapshotSource {
    fn load(&self) -> anyhow::Result<LoadedSnapshot> {
        Ok(LoadedSnapshot {
            path: self.label.clone(),
            bytes: self.original.clone(),
            snapshot: decode_snapshot(&self.original),
        })
    }

    fn read_current(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }
}

/// Runs commands as child processes in a fixed working directory.
#[derive(Debug, Clone)]
pub struct ProcessCommandRunner {
    pub working_dir: Utf8PathBuf,
    /// Executable used for `terraform` commands.
    pub terraform_bin: String,
}

impl ProcessCommandRunner {
    pub fn new(working_dir: Utf8PathBuf, terraform_bin: impl Into<String>) -> Self {
        Self {
            working_dir,
            terraform_bin: terraform_bin.into(),
        }
    }

    fn program<'a>(&'a self, command: &'a PreparedCommand) -> &'a str {
        if command.program == "terraform" {
            &self.terraform_bin
        } else {
            &command.program
        }
    }
}

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, command: &PreparedCommand) -> CommandExecutionLog {
        let mut log = CommandExecutionLog {
            command: command.display(),
            ..Default::default()
        };

        let output = Command::new(self.program(command))
            .args(&command.args)
            .current_dir(&self.working_dir)
            .output();

        match output {
            Ok(output) => {
                log.stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                log.stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                log.exit_code = output.status.code().unwrap_or(-1);
                if !output.status.success() {
                    log.error = Some(output.status.to_string());
                }
            }
            Err(e) => {
                log.exit_code = -1;
                log.error = Some(format!("failed to start {}: {e}", self.program(command)));
            }
        }

        debug!(command = %log.command, exit_code = log.exit_code, "command finished");
        log
    }
}

/// Copies the updated snapshot to a destination path.
#[derive(Debug, Clone)]
pub struct FsSnapshotPublisher {
    pub destination: Utf8PathBuf,
}

impl FsSnapshotPublisher {
    pub fn new(destination: Utf8PathBuf) -> Self {
        Self { destination }
    }
}

impl SnapshotPublisher for FsSnapshotPublisher {
    fn publish(&self, snapshot: &Utf8Path) -> anyhow::Result<()> {
        if let Some(parent) = self.destination.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", self.destination))?;
        }
        fs::copy(snapshot, &self.destination)
            .with_context(|| format!("publish {} to {}", snapshot, self.destination))?;
        let checksum = verify_copy(snapshot, &self.destination)?;
        debug!(destination = %self.destination, checksum = %checksum, "published copy verified");
        Ok(())
    }
}

/// Hash both files and fail unless they match. Returns the shared checksum.
fn verify_copy(source: &Utf8Path, destination: &Utf8Path) -> anyhow::Result<String> {
    let expected =
        sha256_file_hex(source).with_context(|| format!("hash published source {source}"))?;
    let actual = sha256_file_hex(destination)
        .with_context(|| format!("hash published copy {destination}"))?;
    if expected != actual {
        anyhow::bail!(
            "published copy {destination} does not match {source} (sha256 {actual} != {expected})"
        );
    }
    Ok(actual)
}
