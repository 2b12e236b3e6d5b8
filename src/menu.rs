//! The interactive command surface: a numbered menu where each choice
//! maps to exactly one session command or read-only query. All playback
//! state lives behind the session handle; this module only renders.

use std::io::Write;
use std::sync::Arc;

use crossterm::style::Stylize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Notify;
use tracing::warn;

use crate::catalog::CatalogClient;
use crate::session::{Session, SessionCmd};

const MENU: &str = "  1) Search and play
  2) Show playlist
  3) Now playing
  4) Next track
  5) Previous track
  6) Stop playback
  7) Exit";

/// Outcome of waiting on one line of input.
enum Prompted {
    Line(String),
    /// Input closed or failed; nothing more will arrive.
    Closed,
    /// A shutdown notification interrupted the wait.
    Shutdown,
}

/// Run the menu loop until the user exits, stdin closes or a shutdown
/// notification arrives.
pub async fn run(session: &Session, catalog: &CatalogClient, shutdown: Arc<Notify>) {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    run_with(session, catalog, shutdown, lines).await
}

async fn run_with<R>(
    session: &Session,
    catalog: &CatalogClient,
    shutdown: Arc<Notify>,
    mut lines: Lines<R>,
) where
    R: AsyncBufRead + Unpin,
{
    loop {
        println!("\n{}", "Music Player Menu".blue().bold());
        println!("{MENU}");

        let choice = match prompt(&mut lines, "> ", &shutdown).await {
            Prompted::Line(line) => line,
            Prompted::Closed | Prompted::Shutdown => break,
        };

        match choice.trim() {
            "1" => {
                // A shutdown arriving at a nested prompt must end the
                // loop, not just the search flow.
                if !search_and_play(session, catalog, &mut lines, &shutdown).await {
                    break;
                }
            }
            "2" => show_playlist(session),
            "3" => now_playing(session),
            "4" => session.send(SessionCmd::Next),
            "5" => session.send(SessionCmd::Prev),
            "6" => {
                session.send(SessionCmd::Stop);
                println!("{}", "Playback stopped".yellow());
            }
            "7" | "q" | "exit" => break,
            "" => {}
            other => println!("{}", format!("Unknown choice: {other}").red()),
        }
    }
}

/// Print a prompt and wait for one line.
async fn prompt<R>(lines: &mut Lines<R>, label: &str, shutdown: &Notify) -> Prompted
where
    R: AsyncBufRead + Unpin,
{
    print!("{label}");
    let _ = std::io::stdout().flush();

    tokio::select! {
        line = lines.next_line() => match line {
            Ok(Some(l)) => Prompted::Line(l),
            Ok(None) => Prompted::Closed,
            Err(e) => {
                warn!("input read failed: {e}");
                Prompted::Closed
            }
        },
        _ = shutdown.notified() => Prompted::Shutdown,
    }
}

/// Returns false when the menu loop should end (shutdown notification
/// or closed input while prompting).
async fn search_and_play<R>(
    session: &Session,
    catalog: &CatalogClient,
    lines: &mut Lines<R>,
    shutdown: &Notify,
) -> bool
where
    R: AsyncBufRead + Unpin,
{
    let query = match prompt(lines, "Enter search query: ", shutdown).await {
        Prompted::Line(line) => line,
        Prompted::Closed | Prompted::Shutdown => return false,
    };
    let query = query.trim();
    if query.is_empty() {
        return true;
    }

    let results = match catalog.search(query).await {
        Ok(results) => results,
        Err(e) => {
            println!("{}", format!("Error searching tracks: {e}").red());
            return true;
        }
    };
    if results.is_empty() {
        println!("\n{}", "No results found".red());
        return true;
    }

    println!("\n{}", "Select a track to play:".blue().bold());
    for (i, track) in results.iter().enumerate() {
        println!(
            "  {}) {} - {} {}",
            i + 1,
            track.title,
            track.artist,
            format!("({})", track.duration).grey()
        );
    }
    println!("  0) Cancel");

    let choice = match prompt(lines, "> ", shutdown).await {
        Prompted::Line(line) => line,
        Prompted::Closed | Prompted::Shutdown => return false,
    };
    let Ok(selected) = choice.trim().parse::<usize>() else {
        println!("{}", "Not a number, cancelling".yellow());
        return true;
    };
    if selected == 0 || selected > results.len() {
        return true;
    }

    session.send(SessionCmd::SetPlaylist {
        tracks: results,
        start: selected - 1,
    });
    true
}

fn show_playlist(session: &Session) {
    let snap = session.snapshot();
    if snap.playlist.is_empty() {
        println!("\n{}", "Playlist is empty".yellow());
        return;
    }

    println!("\n{}", "Current playlist:".blue().bold());
    for (i, track) in snap.playlist.iter().enumerate() {
        let marker = if i == snap.current { "▶" } else { " " };
        println!(
            "{} {} - {} {}",
            marker.green(),
            track.title,
            track.artist,
            format!("({})", track.duration).grey()
        );
    }
}

fn now_playing(session: &Session) {
    let snap = session.snapshot();
    let track = snap.playlist.get(snap.current);
    match track {
        Some(track) if snap.playing => {
            println!("\n{}", "Now playing:".green().bold());
            println!("Title: {}", track.title);
            println!("Artist: {}", track.artist);
            println!("Duration: {}", track.duration);
        }
        _ => println!("\n{}", "No track is currently playing".yellow()),
    }
}
