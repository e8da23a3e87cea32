//! Lifecycle of the out-of-process capture worker
//!
//! The worker is a separate OS process. The only shared state is the
//! liveness marker and the neighbor store on disk, so any process holding
//! the same [`RuntimePaths`] can start, stop or inspect it.

use lldpscope_core::{Error, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::marker::LivenessMarker;
use crate::paths::RuntimePaths;
use crate::process::{force_kill, pid_exists, start_time, ProcessStats};
use crate::session::Session;

/// Hidden CLI subcommand that runs the worker
pub const WORKER_SUBCOMMAND: &str = "capture-worker";

/// How long a freshly spawned worker must survive to count as started
pub const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Tolerance between a worker's start and the write of its marker
const MARKER_CLOCK_SLACK: Duration = Duration::from_secs(2);

/// Program and arguments used to spawn the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl WorkerCommand {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-invoke the running executable as
    /// `capture-worker <neighbors> <pid file> <log file>`
    pub fn current_exe(paths: &RuntimePaths) -> Result<Self> {
        let program = std::env::current_exe()?;
        Ok(Self::new(
            program,
            [
                OsString::from(WORKER_SUBCOMMAND),
                paths.neighbors_file().as_os_str().to_owned(),
                paths.pid_file().as_os_str().to_owned(),
                paths.log_file().as_os_str().to_owned(),
            ],
        ))
    }
}

/// Result of [`CaptureOrchestrator::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureStatus {
    pub running: bool,
    pub pid: Option<u32>,
    /// `HH:MM:SS` or `unknown`
    pub uptime: String,
    pub memory_mb: f64,
    pub cpu_percent: f64,
}

impl CaptureStatus {
    fn stopped() -> Self {
        Self {
            running: false,
            pid: None,
            uptime: "unknown".to_string(),
            memory_mb: 0.0,
            cpu_percent: 0.0,
        }
    }
}

/// Starts, stops and inspects the capture worker
pub struct CaptureOrchestrator {
    paths: RuntimePaths,
    marker: LivenessMarker,
    command: WorkerCommand,
    grace: Duration,
}

impl CaptureOrchestrator {
    /// Orchestrator that spawns this executable as the worker
    pub fn new(session: &Session) -> Result<Self> {
        let command = WorkerCommand::current_exe(session.paths())?;
        Ok(Self::with_command(session.paths().clone(), command))
    }

    pub fn with_command(paths: RuntimePaths, command: WorkerCommand) -> Self {
        let marker = LivenessMarker::new(paths.pid_file());
        Self {
            paths,
            marker,
            command,
            grace: STARTUP_GRACE,
        }
    }

    pub fn paths(&self) -> &RuntimePaths {
        &self.paths
    }

    /// Pid of the live worker, if any
    pub fn running_pid(&self) -> Result<Option<u32>> {
        let Some(pid) = self.marker.read_pid()? else {
            return Ok(None);
        };
        if !pid_exists(pid)? {
            return Ok(None);
        }

        // A process started after the marker was written reused the pid
        if let (Some(started), Some(written)) = (start_time(pid), self.marker.modified()) {
            if started > written + MARKER_CLOCK_SLACK {
                debug!(pid, "Marker pid now belongs to another process");
                return Ok(None);
            }
        }
        Ok(Some(pid))
    }

    fn remove_stale_marker(&self) -> Result<()> {
        self.remove_stale_marker()?;
        Ok(())
    }

    /// Marker present and its pid alive
    pub fn is_running(&self) -> Result<bool> {
        Ok(self.running_pid()?.is_some())
    }

    /// Spawn the worker and wait out the startup grace period
    pub fn start(&self) -> Result<u32> {
        if let Some(pid) = self.running_pid()? {
            return Err(Error::AlreadyRunning { pid });
        }
        if self.marker.exists() {
            warn!(path = %self.marker.path().display(), "Removing stale liveness marker");
            self.marker.remove()?;
        }

        // Worker stderr goes to the log; a failed start is diagnosed from
        // whatever it appended
        let log_file = self.paths.log_file();
        if let Some(dir) = log_file.parent() {
            fs::create_dir_all(dir)?;
        }
        let log = OpenOptions::new().create(true).append(true).open(log_file)?;
        let log_offset = log.metadata()?.len();

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .process_group(0)
            .spawn()
            .map_err(|e| {
                Error::process_control(format!(
                    "spawning {}: {}",
                    self.command.program.display(),
                    e
                ))
            })?;

        let pid = child.id();
        self.marker.write(pid)?;
        debug!(pid, "Capture worker spawned, probing");

        thread::sleep(self.grace);

        if let Some(status) = child.try_wait()? {
            self.marker.remove_if_owned(pid)?;
            let output = read_from(log_file, log_offset).unwrap_or_default();
            let diagnostics = if output.trim().is_empty() {
                format!("worker {}", status)
            } else {
                output.trim().to_string()
            };
            return Err(Error::WorkerExitedImmediately { diagnostics });
        }

        // Reap the worker if it dies while this process is still around
        thread::Builder::new()
            .name("capture-reaper".to_string())
            .spawn(move || {
                let _ = child.wait();
            })?;

        info!(pid, log = %log_file.display(), "Capture started");
        Ok(pid)
    }

    /// Forcefully terminate the worker and remove its marker.
    ///
    /// Only a live worker is signalled; a stale marker is removed and
    /// reported as not running.
    pub fn stop(&self) -> Result<u32> {
        let Some(pid) = self.running_pid()? else {
            self.remove_stale_marker()?;
            return Err(Error::NotFound("no capture is running".to_string()));
        };

        force_kill(pid)?;
        self.marker.remove()?;

        info!(pid, "Capture stopped");
        Ok(pid)
    }

    /// Liveness plus best-effort resource usage
    pub fn status(&self) -> Result<CaptureStatus> {
        let Some(pid) = self.running_pid()? else {
            return Ok(CaptureStatus::stopped());
        };

        let stats = ProcessStats::collect(pid);
        Ok(CaptureStatus {
            running: true,
            pid: Some(pid),
            uptime: stats.uptime_string(),
            memory_mb: stats.memory_mb(),
            cpu_percent: stats.cpu_percent,
        })
    }

    /// Last `lines` lines of the worker log
    pub fn log_tail(&self, lines: usize) -> Result<Vec<String>> {
        let text = match fs::read_to_string(self.paths.log_file()) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "log file {}",
                    self.paths.log_file().display()
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let all: Vec<&str> = text.lines().collect();
        let skip = all.len().saturating_sub(lines);
        Ok(all[skip..].iter().map(|l| l.to_string()).collect())
    }
}

fn read_from(path: &std::path::Path, offset: u64) -> Result<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn orchestrator(dir: &Path, script: &str) -> CaptureOrchestrator {
        let paths = RuntimePaths::new(dir, Path::new("neighbors.json"));
        CaptureOrchestrator::with_command(paths, WorkerCommand::new("sh", ["-c", script]))
    }

    #[test]
    fn test_start_status_stop() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "sleep 30");

        assert!(!orch.is_running().unwrap());
        let pid = orch.start().unwrap();
        assert!(orch.is_running().unwrap());
        assert_eq!(orch.running_pid().unwrap(), Some(pid));

        let status = orch.status().unwrap();
        assert!(status.running);
        assert_eq!(status.pid, Some(pid));

        match orch.start() {
            Err(Error::AlreadyRunning { pid: running }) => assert_eq!(running, pid),
            other => panic!("Expected AlreadyRunning, got {:?}", other),
        }

        assert_eq!(orch.stop().unwrap(), pid);
        assert!(!orch.is_running().unwrap());
        assert!(!orch.paths().pid_file().exists());
    }

    #[test]
    fn test_worker_exits_immediately() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "echo 'no capture permission' >&2; exit 3");

        match orch.start() {
            Err(Error::WorkerExitedImmediately { diagnostics }) => {
                assert!(diagnostics.contains("no capture permission"))
            }
            other => panic!("Expected WorkerExitedImmediately, got {:?}", other),
        }
        assert!(!orch.paths().pid_file().exists());
    }

    #[test]
    fn test_silent_exit_reports_status() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "exit 7");

        match orch.start() {
            Err(Error::WorkerExitedImmediately { diagnostics }) => {
                assert!(diagnostics.contains('7'))
            }
            other => panic!("Expected WorkerExitedImmediately, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_marker_is_not_running() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "sleep 30");
        LivenessMarker::new(orch.paths().pid_file())
            .write(i32::MAX as u32)
            .unwrap();

        assert!(!orch.is_running().unwrap());
        assert_eq!(orch.status().unwrap(), CaptureStatus::stopped());

        // start replaces the stale marker
        let pid = orch.start().unwrap();
        assert_eq!(orch.running_pid().unwrap(), Some(pid));
        orch.stop().unwrap();
    }

    #[test]
    fn test_stop_with_dead_pid_clears_marker() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "sleep 30");

        let mut gone = Command::new("true").spawn().unwrap();
        let pid = gone.id();
        gone.wait().unwrap();
        let marker = LivenessMarker::new(orch.paths().pid_file());
        marker.write(pid).unwrap();

        assert!(matches!(orch.stop(), Err(Error::NotFound(_))));
        assert!(!marker.exists());
    }

    #[test]
    fn test_stop_spares_process_newer_than_marker() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "sleep 30");

        // Same pid, but the process started long after the marker was written
        let mut bystander = Command::new("sleep").arg("30").spawn().unwrap();
        let marker = LivenessMarker::new(orch.paths().pid_file());
        marker.write(bystander.id()).unwrap();
        OpenOptions::new()
            .write(true)
            .open(marker.path())
            .unwrap()
            .set_modified(std::time::SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        assert!(!orch.is_running().unwrap());
        assert!(matches!(orch.stop(), Err(Error::NotFound(_))));
        assert!(!marker.exists());
        assert!(pid_exists(bystander.id()).unwrap());

        force_kill(bystander.id()).unwrap();
        bystander.wait().unwrap();
    }

    #[test]
    fn test_stop_without_marker() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "sleep 30");
        assert!(matches!(orch.stop(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_log_tail() {
        let dir = tempdir().unwrap();
        let orch = orchestrator(dir.path(), "sleep 30");
        assert!(matches!(orch.log_tail(5), Err(Error::NotFound(_))));

        fs::write(orch.paths().log_file(), "one\ntwo\nthree\n").unwrap();
        assert_eq!(orch.log_tail(2).unwrap(), vec!["two", "three"]);
        assert_eq!(orch.log_tail(10).unwrap().len(), 3);
    }

    #[test]
    fn test_worker_command_args() {
        let paths = RuntimePaths::new("/srv/lldp", Path::new("neighbors.json"));
        let command = WorkerCommand::current_exe(&paths).unwrap();
        assert_eq!(command.args[0], OsString::from(WORKER_SUBCOMMAND));
        assert_eq!(command.args[1], OsString::from("/srv/lldp/neighbors.json"));
        assert_eq!(command.args[2], OsString::from("/srv/lldp/capture.pid"));
        assert_eq!(command.args[3], OsString::from("/srv/lldp/lldpscope_capture.log"));
    }
}
