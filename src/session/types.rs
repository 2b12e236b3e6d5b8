use std::sync::{Arc, Mutex};

use crate::catalog::Track;

/// Commands callers may issue against the session controller.
#[derive(Debug)]
pub enum SessionCmd {
    /// Replace the playlist wholesale and start playing at `start`.
    /// Rejected without side effects if `tracks` is empty or `start`
    /// is out of bounds.
    SetPlaylist { tracks: Vec<Track>, start: usize },
    /// Start playback of the current playlist entry.
    PlayCurrent,
    /// Advance to the next track, wrapping at the end.
    Next,
    /// Go back to the previous track, wrapping at the start.
    Prev,
    /// Stop playback and disable auto-advance.
    Stop,
    /// Tear down playback and end the controller task.
    Shutdown,
}

/// Terminal outcome of one player process, reported exactly once.
#[derive(Debug, Clone)]
pub enum ExitOutcome {
    /// The process ran and exited; `None` means it was killed by a signal.
    Exited(Option<i32>),
    /// The spawn itself failed. `missing_binary` marks a vanished executable.
    SpawnFailed { missing_binary: bool, message: String },
    /// Waiting on the process failed.
    Runtime { message: String },
}

/// Everything the controller loop reacts to, in arrival order. Timers
/// and process waiters feed these back onto the same queue as commands,
/// so handlers never race each other.
#[derive(Debug)]
pub(super) enum SessionEvent {
    Cmd(SessionCmd),
    /// The process spawned as `generation` reached its terminal state.
    ProcessEnded { generation: u64, outcome: ExitOutcome },
    /// The switch-rejection window opened for `generation` elapsed.
    TransitionExpired { generation: u64 },
    /// The auto-advance pause scheduled after `generation` ended elapsed.
    AdvanceDue { generation: u64 },
    /// The grace period after asking `generation` to terminate elapsed.
    EscalateKill { generation: u64 },
}

/// Read-only view of session state, shared with the menu and the
/// process-fault hooks.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSnapshot {
    pub playlist: Vec<Track>,
    pub current: usize,
    pub playing: bool,
    /// Pid of the live player process, kept here so exit paths that
    /// cannot reach the controller (panic hook, `Drop`) can still
    /// terminate it.
    pub child_pid: Option<u32>,
}

pub type SnapshotHandle = Arc<Mutex<PlaybackSnapshot>>;
