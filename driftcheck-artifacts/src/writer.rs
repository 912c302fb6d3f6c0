use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::io::{self, Write};

/// Failure to persist a backup or report artifact.
///
/// Never fatal to a run: callers log it and continue with a weaker
/// integrity guarantee.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackupWriteError {
    #[error("failed to write {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },

    #[error("refusing to overwrite {path}: existing content differs")]
    Conflict { path: Utf8PathBuf },
}

impl BackupWriteError {
    fn io(path: &Utf8Path, err: io::Error) -> Self {
        BackupWriteError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Created,
    /// The path already held identical bytes.
    AlreadyPresent,
}

/// Write-once file operations.
pub trait ArtifactWriter {
    fn create_dir_all(&self, path: &Utf8Path) -> Result<(), BackupWriteError>;

    /// Write `contents` to a path that must not exist yet.
    ///
    /// An existing file with identical contents is accepted so that a rerun
    /// within the same timestamp bucket is a no-op.
    fn write_new(&self, path: &Utf8Path, contents: &[u8])
    -> Result<WriteStatus, BackupWriteError>;
}

#[derive(Debug, Clone, Default)]
pub struct FsArtifactWriter;

impl ArtifactWriter for FsArtifactWriter {
    fn create_dir_all(&self, path: &Utf8Path) -> Result<(), BackupWriteError> {
        fs::create_dir_all(path).map_err(|e| BackupWriteError::io(path, e))
    }

    fn write_new(
        &self,
        path: &Utf8Path,
        contents: &[u8],
    ) -> Result<WriteStatus, BackupWriteError> {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path.as_std_path())
        {
            Ok(mut file) => {
                file.write_all(contents)
                    .and_then(|()| file.flush())
                    .map_err(|e| BackupWriteError::io(path, e))?;
                Ok(WriteStatus::Created)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let existing = fs::read(path).map_err(|e| BackupWriteError::io(path, e))?;
                if existing == contents {
                    Ok(WriteStatus::AlreadyPresent)
                } else {
                    Err(BackupWriteError::Conflict {
                        path: path.to_path_buf(),
                    })
                }
            }
            Err(e) => Err(BackupWriteError::io(path, e)),
        }
    }
}
