use serde::Deserialize;

/// One playable catalog entry, already normalized for display.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Pre-rendered `M:SS` duration string.
    pub duration: String,
}

/// A raw search result as the catalog serves it. Entries without a
/// usable id are dropped before they reach a playlist.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
}

impl RawResult {
    pub(super) fn into_track(self) -> Option<Track> {
        if self.id.trim().is_empty() {
            return None;
        }
        let artist = self
            .artist
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| "Unknown Artist".to_string());
        Some(Track {
            title: self.title,
            artist,
            duration: format_duration(self.duration_seconds.unwrap_or(0)),
            id: self.id,
        })
    }
}

/// Render a duration in whole seconds as `M:SS` (minutes unbounded,
/// seconds zero-padded). Unknown durations come through as zero.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Derive the URL handed to the player process for a track id.
pub fn playable_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}
