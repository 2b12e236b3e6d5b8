//! Remote track catalog: the search client and the track model it
//! produces for the playback session.

mod client;
mod model;

pub use client::{CatalogClient, CatalogError};
pub use model::{Track, playable_url};

#[cfg(test)]
mod tests;
