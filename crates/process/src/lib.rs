//! Process restart capability: terminate by name, relaunch detached.
//!
//! Restarting launchers is only supported on Windows; [`platform_restarter`]
//! hands other platforms a warning no-op so callers never branch on the
//! platform themselves. All waits are blocking — call through
//! `spawn_blocking` from async contexts.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, Signal, System};

/// Grace period before a stubborn process is force-killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(30);

/// Pause after terminating before relaunching.
const SETTLE_AFTER_KILL: Duration = Duration::from_secs(3);

/// Errors from process operations.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: String,
        source: std::io::Error,
    },
}

/// Restart capability for an external launcher process.
pub trait Restart {
    /// Terminates any running instance of the executable and relaunches it.
    fn restart(&self, exe_path: &Path) -> Result<(), ProcessError>;
}

/// Returns the restart implementation for the current platform.
pub fn platform_restarter(startup_wait: Duration) -> Box<dyn Restart + Send + Sync> {
    #[cfg(target_os = "windows")]
    {
        Box::new(SystemRestarter::new(startup_wait))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = startup_wait;
        Box::new(NoopRestarter)
    }
}

/// Real restarter: terminate by process name, then relaunch detached.
pub struct SystemRestarter {
    /// Wait after relaunch so the process can finish starting up.
    startup_wait: Duration,
}

impl SystemRestarter {
    pub fn new(startup_wait: Duration) -> Self {
        Self { startup_wait }
    }
}

impl Restart for SystemRestarter {
    fn restart(&self, exe_path: &Path) -> Result<(), ProcessError> {
        if !exe_path.exists() {
            tracing::warn!(
                path = %exe_path.display(),
                "executable not found, skipping restart"
            );
            return Ok(());
        }

        let Some(proc_name) = exe_path.file_name() else {
            tracing::warn!(path = %exe_path.display(), "no file name, skipping restart");
            return Ok(());
        };

        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let pids: Vec<Pid> = sys
            .processes()
            .iter()
            .filter(|(_, p)| p.name().eq_ignore_ascii_case(proc_name))
            .map(|(pid, _)| *pid)
            .collect();

        let mut terminated = false;
        for pid in pids {
            if let Some(process) = sys.process(pid) {
                tracing::debug!(pid = pid.as_u32(), "terminating process");
                // Graceful stop first; platforms without SIGTERM get a kill.
                if process.kill_with(Signal::Term).is_none() {
                    process.kill();
                }
            }

            if wait_for_exit(&mut sys, pid, TERMINATE_GRACE) {
                terminated = true;
            } else {
                tracing::warn!(pid = pid.as_u32(), "process did not terminate gracefully");
                if let Some(process) = sys.process(pid) {
                    process.kill();
                }
            }
        }

        if terminated {
            std::thread::sleep(SETTLE_AFTER_KILL);
        }

        tracing::info!(path = %exe_path.display(), "starting process");
        Command::new(exe_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessError::Spawn {
                path: exe_path.display().to_string(),
                source: e,
            })?;

        if !self.startup_wait.is_zero() {
            std::thread::sleep(self.startup_wait);
        }

        tracing::info!(path = %exe_path.display(), "restart completed");
        Ok(())
    }
}

/// No-op restarter for platforms without restart support.
pub struct NoopRestarter;

impl Restart for NoopRestarter {
    fn restart(&self, exe_path: &Path) -> Result<(), ProcessError> {
        tracing::warn!(
            path = %exe_path.display(),
            "process restart is only supported on Windows, restart it manually if needed"
        );
        Ok(())
    }
}

/// Polls until the process disappears or the grace period elapses.
fn wait_for_exit(sys: &mut System, pid: Pid, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;

    loop {
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        if sys.process(pid).is_none() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_restarter_succeeds() {
        let restarter = NoopRestarter;
        assert!(restarter.restart(Path::new("/opt/steam/steam.exe")).is_ok());
    }

    #[test]
    fn system_restarter_skips_missing_executable() {
        let restarter = SystemRestarter::new(Duration::ZERO);
        assert!(
            restarter
                .restart(Path::new("/nonexistent/launcher.exe"))
                .is_ok()
        );
    }

    #[test]
    fn platform_restarter_missing_path_is_noop() {
        let restarter = platform_restarter(Duration::ZERO);
        assert!(
            restarter
                .restart(Path::new("/nonexistent/launcher.exe"))
                .is_ok()
        );
    }

    #[test]
    fn spawn_error_names_the_path() {
        let err = ProcessError::Spawn {
            path: "/bin/missing".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/bin/missing"));
    }
}
