use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::{PlayerSettings, TimingSettings};

use super::controller::Controller;
use super::process::{MpvLauncher, PlayerLauncher, signal_process};
use super::types::{PlaybackSnapshot, SessionCmd, SessionEvent, SnapshotHandle};

/// Owning handle to the session controller task.
pub struct Session {
    tx: UnboundedSender<SessionEvent>,
    snapshot: SnapshotHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Spawn the controller with the production mpv launcher.
    pub fn spawn(player: PlayerSettings, timing: TimingSettings) -> Self {
        Self::spawn_with(Arc::new(MpvLauncher::new(player)), timing)
    }

    pub(super) fn spawn_with(launcher: Arc<dyn PlayerLauncher>, timing: TimingSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<SessionEvent>();
        let snapshot: SnapshotHandle = Arc::new(Mutex::new(PlaybackSnapshot::default()));
        let controller = Controller::new(launcher, timing, tx.clone(), snapshot.clone());
        let join = tokio::spawn(controller.run(rx));

        Self {
            tx,
            snapshot,
            join: Mutex::new(Some(join)),
        }
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    /// Cheap read-only copy of the current session state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn send(&self, cmd: SessionCmd) {
        let _ = self.tx.send(SessionEvent::Cmd(cmd));
    }

    /// Request cleanup and wait for the controller task to finish.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SessionEvent::Cmd(SessionCmd::Shutdown));
        let join = self.join.lock().ok().and_then(|mut j| j.take());
        if let Some(join) = join {
            if let Err(e) = join.await {
                warn!("session controller task failed: {e}");
            }
        }
    }

    #[cfg(test)]
    pub(super) fn event_sender(&self) -> UnboundedSender<SessionEvent> {
        self.tx.clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Safety net for exit paths that skipped shutdown(): never
        // leave a player process behind.
        let _ = self.tx.send(SessionEvent::Cmd(SessionCmd::Shutdown));
        if let Ok(snap) = self.snapshot.lock() {
            if let Some(pid) = snap.child_pid {
                signal_process(pid, false);
            }
        }
    }
}
