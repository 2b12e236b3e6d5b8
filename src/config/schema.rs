use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/encore/config.toml` or `~/.config/encore/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ENCORE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player: PlayerSettings,
    pub search: SearchSettings,
    pub timing: TimingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player: PlayerSettings::default(),
            search: SearchSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Name (resolved on `PATH`) or absolute path of the player binary.
    pub binary: String,
    /// User agent handed to the player for its network requests.
    pub user_agent: String,
    /// Extra arguments appended verbatim before the track URL.
    ///
    /// Example: ["--volume=70"]
    pub extra_args: Vec<String>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            binary: "mpv".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Catalog search endpoint; queried as `GET {endpoint}?q=<query>`.
    pub endpoint: String,
    /// Whole-request timeout for a search call (seconds).
    pub timeout_secs: u64,
    /// Cap on the number of results offered in the picker.
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://catalog.encore-player.dev/api/search".to_string(),
            timeout_secs: 10,
            max_results: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Window during which a second track switch is rejected (milliseconds).
    pub transition_guard_ms: u64,
    /// Pause before auto-advancing after a clean track finish (milliseconds).
    pub advance_delay_ms: u64,
    /// Pause before auto-advancing past a failed track (milliseconds).
    pub error_advance_delay_ms: u64,
    /// How long a terminated player gets to exit before SIGKILL (milliseconds).
    pub kill_grace_ms: u64,
    /// Delay before the process exits on shutdown paths (milliseconds).
    pub exit_grace_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            transition_guard_ms: 1000,
            advance_delay_ms: 500,
            error_advance_delay_ms: 1000,
            kill_grace_ms: 2000,
            exit_grace_ms: 1000,
        }
    }
}
