//! Static intent pattern table

use regex::{Regex, RegexBuilder};

use super::Intent;
use crate::Result;

/// Built-in patterns in priority order
///
/// Weather, time and date come before the generic web search and
/// encyclopedia intents because those also claim `what is (.*)`.
/// `Shutdown` is last so that "stop music" still pauses playback.
pub const BUILTIN_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::PlaySpotify,
        &[
            r"play (.*) on spotify",
            r"spotify play (.*)",
            r"play song (.*)",
            r"play music (.*)",
            r"play (.*) by .*",
            r"put on (.*)",
            r"start playing (.*)",
        ],
    ),
    (
        Intent::PauseSpotify,
        // Word-bounded so "unpause music" reaches `ResumeSpotify`
        &[
            r"\bpause music",
            r"\bpause spotify",
            r"stop music",
            r"stop playing",
        ],
    ),
    (
        Intent::ResumeSpotify,
        &[r"resume music", r"resume spotify", r"resume playback", r"unpause"],
    ),
    (
        Intent::NextSong,
        &[r"next song", r"skip song", r"next track", r"skip this"],
    ),
    (
        Intent::PreviousSong,
        &[r"previous song", r"last song", r"go back", r"previous track"],
    ),
    (
        Intent::SearchYoutube,
        &[
            r"search youtube for (.*)",
            r"youtube search (.*)",
            r"search for (.*) on youtube",
            r"find (.*) on youtube",
            r"play (.*) on youtube",
            r"show me (.*) on youtube",
            r"youtube (.*)",
            r"watch (.*) on youtube",
            r"search youtube (.*)$",
        ],
    ),
    (
        Intent::Weather,
        &[
            r"weather in (.*)",
            r"what is the weather like in (.*)",
            r"weather forecast for (.*)",
            r"how is the weather in (.*)",
            r"weather today in (.*)",
            r"temperature in (.*)",
        ],
    ),
    (
        Intent::Time,
        &[
            r"what time is it",
            r"current time",
            r"tell me the time",
            r"time please",
            r"what's the time",
        ],
    ),
    (
        Intent::Date,
        &[
            r"what is the date",
            r"today's date",
            r"what date is it",
            r"what day is it",
            r"current date",
        ],
    ),
    (
        Intent::SearchGoogle,
        &[
            r"search google for (.*)",
            r"google (.*)",
            r"search for (.*)",
            r"find (.*) on google",
            r"look up (.*)",
            r"what is (.*)",
            r"who is (.*)",
        ],
    ),
    (
        Intent::Wikipedia,
        &[
            r"tell me about (.*)",
            r"what is (.*)",
            r"who is (.*)",
            r"wikipedia (.*)",
            r"information about (.*)",
            r"facts about (.*)",
        ],
    ),
    (
        Intent::News,
        &[
            r"news",
            r"latest news",
            r"today's news",
            r"what's in the news",
            r"current events",
        ],
    ),
    (
        Intent::OpenApp,
        &[r"open (.*)", r"launch (.*)", r"start (.*)", r"run (.*)"],
    ),
    (
        Intent::VolumeUp,
        &[r"volume up", r"increase volume", r"louder", r"turn up volume"],
    ),
    (
        Intent::VolumeDown,
        &[r"volume down", r"decrease volume", r"quieter", r"turn down volume"],
    ),
    (Intent::Mute, &[r"\bmute", r"silence", r"turn off sound"]),
    (Intent::Shutdown, &[r"stop", r"quit", r"exit", r"goodbye"]),
];

/// Compiled patterns for a single intent, in declared order
#[derive(Debug, Clone)]
pub struct IntentPatterns {
    intent: Intent,
    patterns: Vec<Regex>,
}

impl IntentPatterns {
    /// The intent these patterns resolve to
    #[must_use]
    pub const fn intent(&self) -> Intent {
        self.intent
    }

    /// Compiled patterns, first match wins
    #[must_use]
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }
}

/// Read-only, ordered mapping from intent to patterns
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Vec<IntentPatterns>,
}

impl PatternTable {
    /// Compile a table from `(intent, patterns)` pairs
    ///
    /// Patterns are matched case-insensitively anywhere in the text.
    ///
    /// # Errors
    ///
    /// Returns error if a pattern is not a valid regular expression
    pub fn new(spec: &[(Intent, &[&str])]) -> Result<Self> {
        let mut entries = Vec::with_capacity(spec.len());

        for (intent, sources) in spec {
            let patterns = sources
                .iter()
                .map(|source| RegexBuilder::new(source).case_insensitive(true).build())
                .collect::<std::result::Result<Vec<_>, _>>()?;

            entries.push(IntentPatterns {
                intent: *intent,
                patterns,
            });
        }

        tracing::debug!(intents = entries.len(), "pattern table compiled");
        Ok(Self { entries })
    }

    /// Compile the built-in table
    ///
    /// # Errors
    ///
    /// Returns error if a built-in pattern fails to compile
    pub fn builtin() -> Result<Self> {
        Self::new(BUILTIN_PATTERNS)
    }

    /// Iterate entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = &IntentPatterns> {
        self.entries.iter()
    }

    /// Intents in priority order
    pub fn intents(&self) -> impl Iterator<Item = Intent> + '_ {
        self.entries.iter().map(IntentPatterns::intent)
    }

    /// Number of intents in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no intents
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
