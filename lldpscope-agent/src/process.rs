//! OS process inspection and control for the capture worker

use lldpscope_core::{Error, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::time::{Duration, SystemTime};

fn to_pid(pid: u32) -> Option<Pid> {
    // 0 and negative values address process groups
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

/// Whether `pid` names a live process.
///
/// Zombies count as dead.
pub fn pid_exists(pid: u32) -> Result<bool> {
    let Some(target) = to_pid(pid) else {
        return Ok(false);
    };

    match kill(target, None) {
        Ok(()) => Ok(!is_zombie(pid)),
        Err(Errno::ESRCH) => Ok(false),
        // Exists, owned by someone else
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(Error::process_control(format!("probing PID {}: {}", pid, e))),
    }
}

/// Send SIGKILL; a process that is already gone is not an error
pub fn force_kill(pid: u32) -> Result<()> {
    let target = to_pid(pid)
        .ok_or_else(|| Error::process_control(format!("invalid PID {}", pid)))?;

    match kill(target, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(Error::process_control(format!("killing PID {}: {}", pid, e))),
    }
}

/// Wall-clock start of `pid`, when `/proc` exposes it
pub fn start_time(pid: u32) -> Option<SystemTime> {
    let uptime = ProcessStats::collect(pid).uptime?;
    SystemTime::now().checked_sub(uptime)
}

fn stat_fields(pid: u32) -> Option<Vec<String>> {
    let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // comm may contain spaces and parens; fields resume after the last ')'
    let rest = &stat[stat.rfind(')')? + 1..];
    Some(rest.split_whitespace().map(str::to_string).collect())
}

fn is_zombie(pid: u32) -> bool {
    stat_fields(pid)
        .and_then(|fields| fields.first().cloned())
        .map(|state| state == "Z" || state == "X")
        .unwrap_or(false)
}

/// Resource usage of a process, as far as the OS exposes it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessStats {
    pub uptime: Option<Duration>,
    /// Resident set size in bytes
    pub memory_bytes: u64,
    /// Average CPU use over the process lifetime
    pub cpu_percent: f64,
}

impl ProcessStats {
    /// Read `/proc`; anything unavailable stays at its default
    pub fn collect(pid: u32) -> Self {
        let Some(fields) = stat_fields(pid) else {
            return Self::default();
        };

        // Offsets are relative to field 3 (state) of proc(5)
        let field = |idx: usize| fields.get(idx).and_then(|v| v.parse::<u64>().ok());
        let utime = field(11).unwrap_or(0);
        let stime = field(12).unwrap_or(0);
        let start_ticks = field(19);
        let rss_pages = field(21).unwrap_or(0);

        let ticks = clock_ticks();
        let uptime = match (start_ticks, system_uptime()) {
            (Some(start), Some(sys)) if ticks > 0.0 => {
                let secs = sys - start as f64 / ticks;
                (secs >= 0.0).then(|| Duration::from_secs_f64(secs))
            }
            _ => None,
        };

        let cpu_percent = match uptime {
            Some(up) if up.as_secs_f64() > 0.0 && ticks > 0.0 => {
                let cpu_secs = (utime + stime) as f64 / ticks;
                (cpu_secs / up.as_secs_f64() * 100.0 * 10.0).round() / 10.0
            }
            _ => 0.0,
        };

        Self {
            uptime,
            memory_bytes: rss_pages * page_size(),
            cpu_percent,
        }
    }

    pub fn memory_mb(&self) -> f64 {
        (self.memory_bytes as f64 / (1024.0 * 1024.0) * 10.0).round() / 10.0
    }

    /// Uptime as `HH:MM:SS`, or `unknown`
    pub fn uptime_string(&self) -> String {
        match self.uptime {
            Some(up) => {
                let secs = up.as_secs();
                format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
            }
            None => "unknown".to_string(),
        }
    }
}

fn system_uptime() -> Option<f64> {
    fs::read_to_string("/proc/uptime")
        .ok()?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

fn clock_ticks() -> f64 {
    use nix::unistd::{sysconf, SysconfVar};
    match sysconf(SysconfVar::CLK_TCK) {
        Ok(Some(t)) if t > 0 => t as f64,
        _ => 100.0,
    }
}

fn page_size() -> u64 {
    use nix::unistd::{sysconf, SysconfVar};
    match sysconf(SysconfVar::PAGE_SIZE) {
        Ok(Some(p)) if p > 0 => p as u64,
        _ => 4096,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_own_pid_exists() {
        assert!(pid_exists(std::process::id()).unwrap());
    }

    #[test]
    fn test_invalid_pids() {
        assert!(!pid_exists(0).unwrap());
        assert!(!pid_exists(u32::MAX).unwrap());
        assert!(force_kill(0).is_err());
    }

    #[test]
    fn test_reaped_child_is_gone() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(!pid_exists(pid).unwrap());
        // Killing something already gone succeeds
        force_kill(pid).unwrap();
    }

    #[test]
    fn test_force_kill_running_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        assert!(pid_exists(pid).unwrap());

        force_kill(pid).unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
        assert!(!pid_exists(pid).unwrap());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_collect_self() {
        let stats = ProcessStats::collect(std::process::id());
        assert!(stats.memory_bytes > 0);
        assert!(stats.uptime.is_some());
        assert!(stats.cpu_percent >= 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_start_time_of_child() {
        let before = SystemTime::now() - Duration::from_secs(2);
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();

        let started = start_time(child.id()).unwrap();
        assert!(started >= before);
        assert!(started <= SystemTime::now() + Duration::from_secs(2));
        assert!(start_time(u32::MAX).is_none());

        force_kill(child.id()).unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_unknown_process_stats() {
        let stats = ProcessStats::collect(u32::MAX);
        assert_eq!(stats, ProcessStats::default());
        assert_eq!(stats.uptime_string(), "unknown");
        assert_eq!(stats.memory_mb(), 0.0);
    }

    #[test]
    fn test_uptime_string() {
        let stats = ProcessStats {
            uptime: Some(Duration::from_secs(3725)),
            ..Default::default()
        };
        assert_eq!(stats.uptime_string(), "01:02:05");
    }
}
