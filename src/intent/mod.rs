//! Intent recognition
//!
//! Maps recognized text onto a closed set of command intents using an
//! ordered pattern table. Resolution is greedy: the first pattern that
//! matches, scanning intents in table order, wins.

mod resolver;
mod table;

pub use resolver::{IntentResolver, Resolution};
pub use table::{BUILTIN_PATTERNS, IntentPatterns, PatternTable};

use std::fmt;

/// A recognized command category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Play a track on the music service
    PlaySpotify,
    /// Pause playback
    PauseSpotify,
    /// Resume paused playback
    ResumeSpotify,
    /// Skip to the next track
    NextSong,
    /// Go back to the previous track
    PreviousSong,
    /// Search the video site
    SearchYoutube,
    /// Current weather for a location
    Weather,
    /// Current local time
    Time,
    /// Current local date
    Date,
    /// Web search
    SearchGoogle,
    /// Encyclopedia summary
    Wikipedia,
    /// Open a news site
    News,
    /// Launch a desktop or web application
    OpenApp,
    /// Raise system volume
    VolumeUp,
    /// Lower system volume
    VolumeDown,
    /// Toggle system mute
    Mute,
    /// Stop the assistant
    Shutdown,
    /// Nothing matched
    Unknown,
}

impl Intent {
    /// Stable identifier used in logs and the `resolve` subcommand
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlaySpotify => "play_spotify",
            Self::PauseSpotify => "pause_spotify",
            Self::ResumeSpotify => "resume_spotify",
            Self::NextSong => "next_song",
            Self::PreviousSong => "previous_song",
            Self::SearchYoutube => "search_youtube",
            Self::Weather => "weather",
            Self::Time => "time",
            Self::Date => "date",
            Self::SearchGoogle => "search_google",
            Self::Wikipedia => "wikipedia",
            Self::News => "news",
            Self::OpenApp => "open_app",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::Mute => "mute",
            Self::Shutdown => "shutdown",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
