// ABOUTME: Per-user JSON documents: play records, favorites and per-episode skip markers.
// ABOUTME: The store persists these opaquely as JSON text keyed by owner and record key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Playback progress for one title from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    pub title: String,
    pub source_name: String,
    pub cover: String,
    pub year: String,
    /// 1-based episode index currently being watched.
    pub index: u32,
    pub total_episodes: u32,
    /// Seconds into the current episode.
    pub play_time: u64,
    /// Length of the current episode in seconds.
    pub total_time: u64,
    /// Milliseconds since epoch.
    pub save_time: i64,
    #[serde(default)]
    pub search_title: String,
}

/// A title the user has starred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub source_name: String,
    pub total_episodes: u32,
    pub title: String,
    pub year: String,
    pub cover: String,
    pub save_time: i64,
    #[serde(default)]
    pub search_title: String,
    /// `vod` or `live`; absent on favorites saved before live channels existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Intro/outro skip markers for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipConfig {
    pub enable: bool,
    /// Seconds to skip at the start.
    pub intro_time: f64,
    /// Seconds before the end at which the outro begins.
    pub outro_time: f64,
}

/// Structured key for a skip config. Both parts are stored in separate
/// columns, so a `+` inside either part never collides with another pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipKey {
    pub source: String,
    pub episode_id: String,
}

impl SkipKey {
    pub fn new(source: impl Into<String>, episode_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            episode_id: episode_id.into(),
        }
    }
}

// Display form is for logs only; it is ambiguous when either part contains '+'.
impl fmt::Display for SkipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.source, self.episode_id)
    }
}
