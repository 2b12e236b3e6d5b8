use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::catalog::{Track, playable_url};
use crate::config::TimingSettings;

use super::handle::Session;
use super::process::{PlayerLauncher, SpawnedPlayer, resolve_on_path};
use super::types::{ExitOutcome, SessionCmd, SessionEvent};

fn track(id: &str, title: &str) -> Track {
    Track {
        id: id.into(),
        title: title.into(),
        artist: "Tester".into(),
        duration: "3:00".into(),
    }
}

fn timings() -> TimingSettings {
    TimingSettings {
        transition_guard_ms: 10,
        advance_delay_ms: 10,
        error_advance_delay_ms: 10,
        kill_grace_ms: 20,
        exit_grace_ms: 0,
    }
}

/// Long enough for every 10ms timer above to have fired.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(80)).await;
}

fn end_process(session: &Session, generation: u64, outcome: ExitOutcome) {
    let _ = session
        .event_sender()
        .send(SessionEvent::ProcessEnded { generation, outcome });
}

/// Records every successful launch and keeps the outcome senders alive
/// so the fake processes never end on their own.
#[derive(Default)]
struct FakeLauncher {
    urls: Mutex<Vec<String>>,
    pending: Mutex<Vec<oneshot::Sender<ExitOutcome>>>,
    /// Error for every launch while set.
    fail_with: Mutex<Option<io::ErrorKind>>,
    /// Error for the next launch only.
    fail_once: Mutex<Option<io::ErrorKind>>,
}

impl FakeLauncher {
    fn launches(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    fn launch_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

impl PlayerLauncher for FakeLauncher {
    fn launch(&self, url: &str) -> io::Result<SpawnedPlayer> {
        if let Some(kind) = self.fail_once.lock().unwrap().take() {
            return Err(io::Error::new(kind, "spawn refused"));
        }
        if let Some(kind) = *self.fail_with.lock().unwrap() {
            return Err(io::Error::new(kind, "spawn refused"));
        }
        self.urls.lock().unwrap().push(url.to_string());
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push(tx);
        Ok(SpawnedPlayer {
            pid: None,
            outcome: rx,
        })
    }
}

fn start(launcher: &Arc<FakeLauncher>, timing: TimingSettings) -> Session {
    Session::spawn_with(launcher.clone(), timing)
}

#[tokio::test]
async fn set_playlist_rejects_empty_and_out_of_bounds() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![],
        start: 0,
    });
    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A")],
        start: 5,
    });
    settle().await;

    assert_eq!(launcher.launch_count(), 0);
    let snap = session.snapshot();
    assert!(snap.playlist.is_empty());
    assert!(!snap.playing);
}

#[tokio::test]
async fn set_playlist_starts_playback_at_the_requested_index() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B"), track("c", "C")],
        start: 1,
    });
    settle().await;

    assert_eq!(launcher.launches(), vec![playable_url("b")]);
    let snap = session.snapshot();
    assert_eq!(snap.current, 1);
    assert!(snap.playing);
}

#[tokio::test]
async fn play_current_on_empty_playlist_is_a_no_op() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::PlayCurrent);
    settle().await;

    assert_eq!(launcher.launch_count(), 0);
    assert!(!session.snapshot().playing);
}

#[tokio::test]
async fn next_and_prev_on_empty_playlist_do_nothing() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::Next);
    session.send(SessionCmd::Prev);
    settle().await;

    assert_eq!(launcher.launch_count(), 0);
    assert_eq!(session.snapshot().current, 0);
}

#[tokio::test]
async fn single_track_next_and_prev_never_restart_playback() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("solo", "Solo")],
        start: 0,
    });
    settle().await;
    session.send(SessionCmd::Next);
    session.send(SessionCmd::Prev);
    settle().await;

    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(session.snapshot().current, 0);
}

#[tokio::test]
async fn next_cycles_forward_and_wraps() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B"), track("c", "C")],
        start: 0,
    });
    settle().await;
    for _ in 0..3 {
        session.send(SessionCmd::Next);
        settle().await;
    }

    assert_eq!(
        launcher.launches(),
        vec![
            playable_url("a"),
            playable_url("b"),
            playable_url("c"),
            playable_url("a"),
        ]
    );
    assert_eq!(session.snapshot().current, 0);
}

#[tokio::test]
async fn prev_cycles_backward_and_wraps() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B"), track("c", "C")],
        start: 0,
    });
    settle().await;
    session.send(SessionCmd::Prev);
    settle().await;
    session.send(SessionCmd::Prev);
    settle().await;

    assert_eq!(
        launcher.launches(),
        vec![playable_url("a"), playable_url("c"), playable_url("b")]
    );
    assert_eq!(session.snapshot().current, 1);
}

#[tokio::test]
async fn switch_during_transition_window_is_rejected() {
    let launcher = Arc::new(FakeLauncher::default());
    let mut timing = timings();
    timing.transition_guard_ms = 500;
    let session = start(&launcher, timing);

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    session.send(SessionCmd::PlayCurrent);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The second request fell inside the guard window: no second
    // process, no state change.
    assert_eq!(launcher.launch_count(), 1);
    let snap = session.snapshot();
    assert_eq!(snap.current, 0);
    assert!(snap.playing);
}

#[tokio::test]
async fn switch_is_accepted_after_the_guard_expires() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;
    session.send(SessionCmd::PlayCurrent);
    settle().await;

    assert_eq!(
        launcher.launches(),
        vec![playable_url("a"), playable_url("a")]
    );
}

#[tokio::test]
async fn stop_clears_flags_and_keeps_the_playlist() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;
    session.send(SessionCmd::Stop);
    // Stop with nothing playing must also be a harmless no-op.
    session.send(SessionCmd::Stop);
    settle().await;

    let snap = session.snapshot();
    assert!(!snap.playing);
    assert_eq!(snap.playlist.len(), 2);
    assert_eq!(snap.current, 0);
    assert!(snap.child_pid.is_none());
    assert_eq!(launcher.launch_count(), 1);
}

#[tokio::test]
async fn clean_exit_auto_advances_to_the_next_track() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B"), track("c", "C")],
        start: 0,
    });
    settle().await;
    end_process(&session, 1, ExitOutcome::Exited(Some(0)));
    settle().await;

    assert_eq!(
        launcher.launches(),
        vec![playable_url("a"), playable_url("b")]
    );
    let snap = session.snapshot();
    assert_eq!(snap.current, 1);
    assert!(snap.playing);
}

#[tokio::test]
async fn exit_inside_the_guard_window_still_advances() {
    let launcher = Arc::new(FakeLauncher::default());
    let mut timing = timings();
    // Guard far longer than the test: the terminal event itself must
    // close the transition, or the scheduled advance gets rejected.
    timing.transition_guard_ms = 5_000;
    let session = start(&launcher, timing);

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    end_process(&session, 1, ExitOutcome::Exited(Some(0)));
    settle().await;

    assert_eq!(
        launcher.launches(),
        vec![playable_url("a"), playable_url("b")]
    );
    let snap = session.snapshot();
    assert_eq!(snap.current, 1);
    assert!(snap.playing);
}

#[tokio::test]
async fn nonzero_exit_reports_and_stays_put() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;
    end_process(&session, 1, ExitOutcome::Exited(Some(2)));
    settle().await;

    assert_eq!(launcher.launch_count(), 1);
    let snap = session.snapshot();
    assert_eq!(snap.current, 0);
    assert!(!snap.playing);
}

#[tokio::test]
async fn clean_exit_on_single_track_playlist_does_not_advance() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("solo", "Solo")],
        start: 0,
    });
    settle().await;
    end_process(&session, 1, ExitOutcome::Exited(Some(0)));
    settle().await;

    assert_eq!(launcher.launch_count(), 1);
    assert!(!session.snapshot().playing);
}

#[tokio::test]
async fn stop_suppresses_a_late_clean_exit() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;
    session.send(SessionCmd::Stop);
    settle().await;
    end_process(&session, 1, ExitOutcome::Exited(Some(0)));
    settle().await;

    // The terminated process finishing must not resurrect playback.
    assert_eq!(launcher.launch_count(), 1);
    assert!(!session.snapshot().playing);
    assert_eq!(session.snapshot().current, 0);
}

#[tokio::test]
async fn stale_terminal_event_is_discarded() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;
    session.send(SessionCmd::Next);
    settle().await;
    // Generation 1 was replaced by the manual switch; its clean exit
    // arrives late and must not advance or stop anything.
    end_process(&session, 1, ExitOutcome::Exited(Some(0)));
    settle().await;

    assert_eq!(launcher.launch_count(), 2);
    let snap = session.snapshot();
    assert_eq!(snap.current, 1);
    assert!(snap.playing);
}

#[tokio::test]
async fn missing_binary_reports_without_advancing() {
    let launcher = Arc::new(FakeLauncher::default());
    *launcher.fail_with.lock().unwrap() = Some(io::ErrorKind::NotFound);
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;

    assert_eq!(launcher.launch_count(), 0);
    let snap = session.snapshot();
    assert_eq!(snap.current, 0);
    assert!(!snap.playing);
}

#[tokio::test]
async fn transient_spawn_error_advances_past_the_bad_track() {
    let launcher = Arc::new(FakeLauncher::default());
    *launcher.fail_once.lock().unwrap() = Some(io::ErrorKind::PermissionDenied);
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A"), track("b", "B")],
        start: 0,
    });
    settle().await;

    assert_eq!(launcher.launches(), vec![playable_url("b")]);
    let snap = session.snapshot();
    assert_eq!(snap.current, 1);
    assert!(snap.playing);
}

#[tokio::test]
async fn shutdown_ends_the_controller_task() {
    let launcher = Arc::new(FakeLauncher::default());
    let session = start(&launcher, timings());

    session.send(SessionCmd::SetPlaylist {
        tracks: vec![track("a", "A")],
        start: 0,
    });
    settle().await;
    session.shutdown().await;

    let snap = session.snapshot();
    assert!(!snap.playing);
    assert!(snap.child_pid.is_none());
}

#[test]
fn resolve_on_path_checks_explicit_paths_directly() {
    assert!(resolve_on_path("/definitely/not/here/mpv-xyz").is_none());

    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    assert_eq!(resolve_on_path(&path), Some(file.path().to_path_buf()));
}
