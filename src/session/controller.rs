//! The session controller: single owner of the playlist, the playback
//! flags and the live player process.
//!
//! It runs as one task draining one event channel. User commands,
//! process terminal events and timer expirations all land on that
//! queue, so each handler runs to completion against a consistent view
//! of the session. Handlers never wait on process shutdown: a replaced
//! process is signalled and forgotten, with a scheduled SIGKILL
//! escalation that its own terminal event cancels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossterm::style::Stylize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::catalog::{Track, playable_url};
use crate::config::TimingSettings;

use super::process::{PlayerLauncher, signal_process};
use super::types::{ExitOutcome, SessionCmd, SessionEvent, SnapshotHandle};

/// Identity of the tracked player process. Terminal events carry the
/// generation they belong to; anything else is stale.
struct ActiveProcess {
    generation: u64,
    pid: Option<u32>,
}

pub(super) struct Controller {
    launcher: Arc<dyn PlayerLauncher>,
    timing: TimingSettings,
    tx: UnboundedSender<SessionEvent>,
    snapshot: SnapshotHandle,

    playlist: Vec<Track>,
    current: usize,
    playing: bool,
    auto_advance: bool,
    transitioning: bool,
    active: Option<ActiveProcess>,
    /// Generation of the most recent spawn attempt.
    generation: u64,
    /// Doomed processes awaiting confirmation, keyed by generation. An
    /// entry is removed when its terminal event arrives, which cancels
    /// the scheduled SIGKILL escalation.
    pending_kills: HashMap<u64, u32>,
}

impl Controller {
    pub(super) fn new(
        launcher: Arc<dyn PlayerLauncher>,
        timing: TimingSettings,
        tx: UnboundedSender<SessionEvent>,
        snapshot: SnapshotHandle,
    ) -> Self {
        Self {
            launcher,
            timing,
            tx,
            snapshot,
            playlist: Vec::new(),
            current: 0,
            playing: false,
            auto_advance: true,
            transitioning: false,
            active: None,
            generation: 0,
            pending_kills: HashMap::new(),
        }
    }

    pub(super) async fn run(mut self, mut rx: UnboundedReceiver<SessionEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Cmd(SessionCmd::Shutdown) => {
                    self.cleanup();
                    break;
                }
                SessionEvent::Cmd(cmd) => self.handle_command(cmd),
                SessionEvent::ProcessEnded { generation, outcome } => {
                    self.on_process_ended(generation, outcome);
                }
                SessionEvent::TransitionExpired { generation } => {
                    if generation == self.generation {
                        self.transitioning = false;
                    }
                }
                SessionEvent::AdvanceDue { generation } => self.on_advance_due(generation),
                SessionEvent::EscalateKill { generation } => {
                    if let Some(pid) = self.pending_kills.remove(&generation) {
                        warn!(generation, pid, "player ignored SIGTERM, escalating");
                        signal_process(pid, true);
                    }
                }
            }
        }
        debug!("session controller stopped");
    }

    fn handle_command(&mut self, cmd: SessionCmd) {
        match cmd {
            SessionCmd::SetPlaylist { tracks, start } => self.set_playlist(tracks, start),
            SessionCmd::PlayCurrent => self.play_current(),
            SessionCmd::Next => self.next(),
            SessionCmd::Prev => self.prev(),
            SessionCmd::Stop => self.stop(),
            // Handled in run() before dispatch.
            SessionCmd::Shutdown => {}
        }
    }

    fn set_playlist(&mut self, tracks: Vec<Track>, start: usize) {
        if tracks.is_empty() || start >= tracks.len() {
            warn!(
                start,
                len = tracks.len(),
                "rejecting playlist replacement with invalid bounds"
            );
            return;
        }
        self.playlist = tracks;
        self.current = start;
        self.publish_snapshot();
        self.play_current();
    }

    fn play_current(&mut self) {
        if self.transitioning {
            warn!(current = self.current, "track switch already in flight, rejecting");
            println!("{}", "Track transition in progress, please wait...".yellow());
            return;
        }
        let Some(track) = self.playlist.get(self.current).cloned() else {
            return;
        };

        self.transitioning = true;

        // Replace, never wait: the old process is doomed and any
        // terminal event it still emits will be stale by generation.
        if let Some(old) = self.active.take() {
            self.doom(old);
        }

        self.generation += 1;
        let generation = self.generation;
        let url = playable_url(&track.id);

        println!(
            "\n{} {} - {}",
            "Now playing:".green().bold(),
            track.title.as_str().white(),
            track.artist.as_str().white()
        );
        println!("{}", format!("Duration: {}", track.duration).grey());

        match self.launcher.launch(&url) {
            Ok(spawned) => {
                self.active = Some(ActiveProcess {
                    generation,
                    pid: spawned.pid,
                });
                let tx = self.tx.clone();
                let outcome_rx = spawned.outcome;
                tokio::spawn(async move {
                    if let Ok(outcome) = outcome_rx.await {
                        let _ = tx.send(SessionEvent::ProcessEnded { generation, outcome });
                    }
                });
            }
            Err(e) => {
                // Spawn failures are synchronous here; route them
                // through the queue so the handling stays uniform with
                // runtime failures.
                let missing = e.kind() == std::io::ErrorKind::NotFound;
                self.active = Some(ActiveProcess {
                    generation,
                    pid: None,
                });
                let _ = self.tx.send(SessionEvent::ProcessEnded {
                    generation,
                    outcome: ExitOutcome::SpawnFailed {
                        missing_binary: missing,
                        message: e.to_string(),
                    },
                });
            }
        }

        self.playing = true;
        self.auto_advance = true;
        self.publish_snapshot();

        self.schedule(
            SessionEvent::TransitionExpired { generation },
            self.timing.transition_guard_ms,
        );
    }

    fn next(&mut self) {
        if self.playlist.is_empty() {
            println!("{}", "Playlist is empty".yellow());
            return;
        }
        if self.playlist.len() == 1 {
            println!("{}", "Only one track in playlist".yellow());
            return;
        }
        self.current = (self.current + 1) % self.playlist.len();
        self.publish_snapshot();
        self.play_current();
    }

    fn prev(&mut self) {
        if self.playlist.is_empty() {
            println!("{}", "Playlist is empty".yellow());
            return;
        }
        if self.playlist.len() == 1 {
            println!("{}", "Only one track in playlist".yellow());
            return;
        }
        self.current = (self.current + self.playlist.len() - 1) % self.playlist.len();
        self.publish_snapshot();
        self.play_current();
    }

    fn stop(&mut self) {
        if self.active.is_none() {
            return;
        }
        self.auto_advance = false;
        self.cleanup();
    }

    /// Idempotent teardown: signal the active process if any, reset the
    /// transient flags, keep the playlist.
    fn cleanup(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(generation = active.generation, "cleaning up active player");
            self.doom(active);
        }
        self.playing = false;
        self.transitioning = false;
        self.publish_snapshot();
    }

    /// Fire-and-forget termination: SIGTERM now, SIGKILL after the
    /// grace period unless the terminal event lands first.
    fn doom(&mut self, active: ActiveProcess) {
        let Some(pid) = active.pid else { return };
        signal_process(pid, false);
        self.pending_kills.insert(active.generation, pid);
        self.schedule(
            SessionEvent::EscalateKill {
                generation: active.generation,
            },
            self.timing.kill_grace_ms,
        );
    }

    fn on_process_ended(&mut self, generation: u64, outcome: ExitOutcome) {
        // A doomed process confirming its exit cancels the escalation.
        self.pending_kills.remove(&generation);

        let tracked = self.active.as_ref().map(|a| a.generation);
        if tracked != Some(generation) {
            debug!(generation, "ignoring terminal event from superseded player");
            return;
        }

        self.active = None;
        self.playing = false;
        // The switch settled on its own; do not hold the guard against
        // the auto-advance that may follow.
        self.transitioning = false;

        match outcome {
            ExitOutcome::Exited(Some(0)) => {
                println!("{}", "\nTrack finished playing".grey());
                if self.auto_advance && self.playlist.len() > 1 {
                    self.schedule(
                        SessionEvent::AdvanceDue { generation },
                        self.timing.advance_delay_ms,
                    );
                }
            }
            ExitOutcome::Exited(Some(code)) => {
                println!("{}", format!("\nTrack stopped with code: {code}").red());
            }
            ExitOutcome::Exited(None) => {
                // Killed by a signal, usually our own SIGTERM.
                debug!(generation, "player terminated by signal");
            }
            ExitOutcome::SpawnFailed {
                missing_binary: true,
                message,
            } => {
                println!("{}", format!("Player error: {message}").red());
                println!(
                    "{}",
                    "mpv was not found. It may have been uninstalled or removed from PATH.".red()
                );
                println!(
                    "{}",
                    "Install mpv (https://mpv.io/installation/) and try again.".yellow()
                );
            }
            ExitOutcome::SpawnFailed { message, .. } | ExitOutcome::Runtime { message } => {
                println!("{}", format!("Player error: {message}").red());
                if self.auto_advance && self.playlist.len() > 1 {
                    self.schedule(
                        SessionEvent::AdvanceDue { generation },
                        self.timing.error_advance_delay_ms,
                    );
                }
            }
        }
        self.publish_snapshot();
    }

    fn on_advance_due(&mut self, generation: u64) {
        // Only advance past the playback that actually ended; a manual
        // switch in the meantime supersedes the pending advance.
        if generation != self.generation {
            return;
        }
        if self.auto_advance && self.playlist.len() > 1 {
            self.next();
        }
    }

    fn schedule(&self, event: SessionEvent, delay_ms: u64) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = tx.send(event);
        });
    }

    fn publish_snapshot(&self) {
        if let Ok(mut snap) = self.snapshot.lock() {
            snap.playlist = self.playlist.clone();
            snap.current = self.current;
            snap.playing = self.playing;
            snap.child_pid = self.active.as_ref().and_then(|a| a.pid);
        }
    }
}
