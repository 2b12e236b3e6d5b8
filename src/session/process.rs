//! Spawning and signalling of the external player process.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::PlayerSettings;

use super::types::ExitOutcome;

/// Flags passed on every spawn: audio only, no terminal UI, quiet.
const BASE_ARGS: [&str; 4] = ["--no-video", "--quiet", "--no-terminal", "--audio-display=no"];

/// A freshly spawned player: its pid plus a receiver that resolves
/// exactly once with the terminal outcome. Dropping the receiver does
/// not kill the process; the controller signals it by pid.
pub(super) struct SpawnedPlayer {
    pub(super) pid: Option<u32>,
    pub(super) outcome: oneshot::Receiver<ExitOutcome>,
}

/// Seam between the controller and the actual player binary. Tests
/// substitute a recording double.
pub(super) trait PlayerLauncher: Send + Sync + 'static {
    fn launch(&self, url: &str) -> io::Result<SpawnedPlayer>;
}

/// Launches the configured mpv-compatible binary.
pub(super) struct MpvLauncher {
    settings: PlayerSettings,
}

impl MpvLauncher {
    pub(super) fn new(settings: PlayerSettings) -> Self {
        Self { settings }
    }
}

impl PlayerLauncher for MpvLauncher {
    fn launch(&self, url: &str) -> io::Result<SpawnedPlayer> {
        let mut cmd = Command::new(&self.settings.binary);
        cmd.args(BASE_ARGS)
            .arg(format!("--user-agent={}", self.settings.user_agent))
            .args(&self.settings.extra_args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        debug!(?pid, url, "player process spawned");

        // The waiter owns the child so it always gets reaped; the
        // controller keeps only the pid.
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) => ExitOutcome::Exited(status.code()),
                Err(e) => ExitOutcome::Runtime {
                    message: e.to_string(),
                },
            };
            let _ = tx.send(outcome);
        });

        Ok(SpawnedPlayer { pid, outcome: rx })
    }
}

/// Ask a player process to terminate; `force` escalates to SIGKILL.
pub(crate) fn signal_process(pid: u32, force: bool) {
    #[cfg(unix)]
    {
        let sig = if force { libc::SIGKILL } else { libc::SIGTERM };
        unsafe {
            libc::kill(pid as libc::pid_t, sig);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (pid, force);
    }
}

/// Resolve `binary` against `PATH`. Explicit paths (anything with a
/// separator) are checked directly.
pub fn resolve_on_path(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|p| p.is_file())
}
