//! Exclusive lock on an output directory.
//!
//! Two builds writing the same output would race on staging and publish.
//! A build holds `<parent>/.<output-name>.lock` for its whole duration. The
//! file is created with `create_new`, so a second build fails immediately
//! instead of waiting. The lock is released when [`OutputLock`] is dropped.
//!
//! A build killed hard leaves the file behind; it records the owning
//! process id so the stale lock can be identified and removed by hand.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("output {output} is locked by another build (remove {lock} if no build is running)")]
    Locked { output: String, lock: String },
    #[error("cannot create lock file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Guard for an acquired output lock.
#[derive(Debug)]
pub struct OutputLock {
    path: PathBuf,
}

/// Lock file path for an output directory.
pub fn lock_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    parent.join(format!(".{name}.lock"))
}

impl OutputLock {
    pub fn acquire(output: &Path) -> Result<Self, LockError> {
        let path = lock_path(output);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LockError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(LockError::Locked {
                    output: output.display().to_string(),
                    lock: path.display().to_string(),
                });
            }
            Err(source) => {
                return Err(LockError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        // The pid is informational only.
        let _ = writeln!(file, "{}", std::process::id());
        debug!(lock = %path.display(), "acquired output lock");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(lock = %self.path.display(), error = %e, "could not remove lock file");
        }
    }
}
