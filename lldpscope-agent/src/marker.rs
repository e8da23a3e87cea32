//! Pid file marking a live capture worker

use lldpscope_core::Result;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::warn;

/// File holding the decimal pid of the capture worker.
///
/// Presence alone proves nothing; callers pair it with a process table
/// check.
#[derive(Debug, Clone)]
pub struct LivenessMarker {
    path: PathBuf,
}

impl LivenessMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// When the marker was last written
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Recorded pid; `None` when the file is missing or holds no pid
    pub fn read_pid(&self) -> Result<Option<u32>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match text.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(Some(pid)),
            _ => {
                warn!(path = %self.path.display(), "Liveness marker holds no valid pid");
                Ok(None)
            }
        }
    }

    pub fn write(&self, pid: u32) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        write!(tmp, "{}", pid)?;
        tmp.persist(&self.path)
            .map_err(|e| lldpscope_core::Error::Io(e.error))?;
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the marker only if it still names `pid`
    pub fn remove_if_owned(&self, pid: u32) -> Result<bool> {
        if self.read_pid()? == Some(pid) {
            self.remove()?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Removes the marker on drop if it still names this process
pub struct MarkerGuard {
    marker: LivenessMarker,
    pid: u32,
}

impl MarkerGuard {
    /// Write our own pid and arm the guard
    pub fn acquire(marker: LivenessMarker) -> Result<Self> {
        let pid = std::process::id();
        marker.write(pid)?;
        Ok(Self { marker, pid })
    }
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        if let Err(e) = self.marker.remove_if_owned(self.pid) {
            warn!(error = %e, "Could not remove liveness marker");
        }
    }
}
