//! Playback session: the controller task that owns the playlist, the
//! live player process and every state transition.

mod controller;
mod handle;
mod process;
mod types;

pub use handle::Session;
pub use process::resolve_on_path;
pub use types::{SessionCmd, SnapshotHandle};

pub(crate) use process::signal_process;

#[cfg(test)]
mod tests;
