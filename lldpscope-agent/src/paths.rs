//! Runtime file locations shared by the CLI and the capture worker

use lldpscope_core::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const PID_FILE_NAME: &str = "capture.pid";
pub const LOG_FILE_NAME: &str = "lldpscope_capture.log";

/// Files every lldpscope process derives from one runtime directory.
///
/// Readers and the capture worker must agree on these paths, so the worker is
/// always handed them explicitly instead of resolving its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    runtime_dir: PathBuf,
    neighbors_file: PathBuf,
    pid_file: PathBuf,
    log_file: PathBuf,
}

impl RuntimePaths {
    /// Paths under `runtime_dir`; a relative `neighbors_file` is joined to it
    pub fn new(runtime_dir: impl Into<PathBuf>, neighbors_file: &Path) -> Self {
        let runtime_dir = runtime_dir.into();
        let neighbors_file = if neighbors_file.is_absolute() {
            neighbors_file.to_path_buf()
        } else {
            runtime_dir.join(neighbors_file)
        };

        Self {
            pid_file: runtime_dir.join(PID_FILE_NAME),
            log_file: runtime_dir.join(LOG_FILE_NAME),
            neighbors_file,
            runtime_dir,
        }
    }

    /// Use `runtime_dir` when given, otherwise the executable's directory
    pub fn resolve(runtime_dir: Option<PathBuf>, neighbors_file: &Path) -> Result<Self> {
        let dir = match runtime_dir {
            Some(dir) => dir,
            None => executable_dir()?,
        };
        Ok(Self::new(dir, neighbors_file))
    }

    /// Explicit paths, as passed to the capture worker
    pub fn from_parts(neighbors_file: PathBuf, pid_file: PathBuf, log_file: PathBuf) -> Self {
        let runtime_dir = pid_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            runtime_dir,
            neighbors_file,
            pid_file,
            log_file,
        }
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    pub fn neighbors_file(&self) -> &Path {
        &self.neighbors_file
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::NotFound(format!("directory of {}", exe.display())))
}
