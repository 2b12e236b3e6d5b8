//! Startup and shutdown wiring: settings, logging, signal handling,
//! fault hooks, and the final cleanup path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::Stylize;
use tokio::sync::Notify;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::catalog::CatalogClient;
use crate::config::Settings;
use crate::menu;
use crate::session::{Session, SnapshotHandle, resolve_on_path, signal_process};

/// Run the player to completion; the returned value is the process
/// exit code.
pub async fn run() -> Result<i32> {
    init_tracing();
    let settings = load_settings();

    // Check the player binary up front so the user gets guidance before
    // investing in a search. A binary that disappears later is still
    // handled per spawn.
    if resolve_on_path(&settings.player.binary).is_none() {
        println!(
            "{}",
            format!("{} was not found on PATH.", settings.player.binary)
                .red()
                .bold()
        );
        println!(
            "{}",
            "An mpv-compatible player is required for audio playback.".yellow()
        );
        println!(
            "{}",
            "See https://mpv.io/installation/ for install instructions.".grey()
        );
        return Ok(1);
    }

    let session = Session::spawn(settings.player.clone(), settings.timing.clone());
    let catalog = CatalogClient::new(&settings.search);

    install_panic_hook(session.snapshot_handle());

    let shutdown = Arc::new(Notify::new());
    spawn_signal_watchers(shutdown.clone());

    println!("\n{}", "CLI Music Player".blue().bold());
    menu::run(&session, &catalog, shutdown).await;

    println!("\n{}", "Cleaning up...".yellow());
    session.shutdown().await;

    // Leave the graceful SIGTERM a moment to land before this process
    // goes away with it.
    tokio::time::sleep(Duration::from_millis(settings.timing.exit_grace_ms)).await;
    println!("{}", "Goodbye!".green());
    Ok(0)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load settings, falling back to defaults when the config is missing
/// or malformed. The player should still start with a broken config.
fn load_settings() -> Settings {
    match Settings::load() {
        Ok(settings) => match settings.validate() {
            Ok(()) => settings,
            Err(msg) => {
                eprintln!("encore: invalid config, using defaults: {msg}");
                Settings::default()
            }
        },
        Err(e) => {
            eprintln!("encore: failed to load config, using defaults: {e}");
            Settings::default()
        }
    }
}

/// One watcher task per shutdown signal; each one funnels into the
/// same notification the menu loop selects on, so the normal cleanup
/// path runs and the process exits 0.
fn spawn_signal_watchers(shutdown: Arc<Notify>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        for kind in [
            SignalKind::interrupt(),
            SignalKind::terminate(),
            SignalKind::hangup(),
            SignalKind::quit(),
        ] {
            match signal(kind) {
                Ok(mut sig) => {
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        sig.recv().await;
                        warn!("termination signal received, shutting down");
                        shutdown.notify_one();
                    });
                }
                Err(e) => warn!("failed to install signal handler: {e}"),
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.notify_one();
            }
        });
    }
}

/// On a panic anywhere in the program, make a best-effort attempt to
/// terminate the player process before exiting with a failure code.
/// This path cannot reach the controller, so it signals the pid
/// recorded in the snapshot directly.
fn install_panic_hook(snapshot: SnapshotHandle) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        if let Ok(snap) = snapshot.lock() {
            if let Some(pid) = snap.child_pid {
                signal_process(pid, false);
            }
        }
        std::process::exit(1);
    }));
}
