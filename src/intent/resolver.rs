//! Text to intent resolution

use super::{Intent, PatternTable};
use crate::Result;

/// Trigger word for the video-site fallback
const VIDEO_SITE: &str = "youtube";

/// Outcome of resolving one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Matched intent, `Unknown` if nothing matched
    pub intent: Intent,
    /// Captured free text, if the matching pattern has a capture group
    pub entity: Option<String>,
}

impl Resolution {
    /// Nothing matched
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            entity: None,
        }
    }

    fn new(intent: Intent, entity: Option<&str>) -> Self {
        let entity = entity
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(ToString::to_string);

        Self { intent, entity }
    }
}

/// Resolves recognized text against a [`PatternTable`]
#[derive(Debug, Clone)]
pub struct IntentResolver {
    table: PatternTable,
}

impl IntentResolver {
    /// Create a resolver over the built-in pattern table
    ///
    /// # Errors
    ///
    /// Returns error if the built-in table fails to compile
    pub fn new() -> Result<Self> {
        Ok(Self::with_table(PatternTable::builtin()?))
    }

    /// Create a resolver over a custom table
    #[must_use]
    pub const fn with_table(table: PatternTable) -> Self {
        Self { table }
    }

    /// Resolve text to an intent and optional entity
    ///
    /// Never fails: when nothing matches the result is [`Resolution::unknown`].
    #[must_use]
    pub fn resolve(&self, text: &str) -> Resolution {
        let text = text.trim().to_lowercase();

        for entry in self.table.iter() {
            for pattern in entry.patterns() {
                if let Some(captures) = pattern.captures(&text) {
                    let resolution =
                        Resolution::new(entry.intent(), captures.get(1).map(|m| m.as_str()));
                    tracing::info!(
                        intent = %resolution.intent,
                        entity = ?resolution.entity,
                        pattern = pattern.as_str(),
                        "intent resolved"
                    );
                    return resolution;
                }
            }
        }

        if let Some(query) = video_search_query(&text) {
            tracing::info!(query, "video search resolved by keyword");
            return Resolution::new(Intent::SearchYoutube, Some(query));
        }

        tracing::info!(text, "no intent found");
        Resolution::unknown()
    }
}

/// Keyword fallback for video searches the pattern table misses
///
/// The query is whatever follows the last mention of the site, narrowed
/// to what follows the last "for" when present.
fn video_search_query(text: &str) -> Option<&str> {
    if !text.contains(VIDEO_SITE) || !(text.contains("search") || text.contains("find")) {
        return None;
    }

    let tail = text.rsplit(VIDEO_SITE).next()?;
    let query = if tail.contains("for") {
        tail.rsplit("for").next()?
    } else {
        tail
    };

    Some(query.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IntentResolver {
        IntentResolver::new().unwrap()
    }

    #[test]
    fn test_video_search_query() {
        assert_eq!(
            video_search_query("youtube: searching for lofi beats"),
            Some("lofi beats")
        );
        assert_eq!(video_search_query("find it, youtube"), Some(""));
        assert_eq!(video_search_query("youtube is great"), None);
        assert_eq!(video_search_query("search the web"), None);
    }

    #[test]
    fn test_resolve_normalizes_input() {
        let r = resolver().resolve("  Play Bohemian Rhapsody ON SPOTIFY  ");
        assert_eq!(r.intent, Intent::PlaySpotify);
        assert_eq!(r.entity.as_deref(), Some("bohemian rhapsody"));
    }

    #[test]
    fn test_empty_capture_is_absent() {
        let r = resolver().resolve("play  by queen");
        assert_eq!(r.intent, Intent::PlaySpotify);
        assert_eq!(r.entity, None);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(resolver().resolve("blue green purple"), Resolution::unknown());
        assert_eq!(resolver().resolve(""), Resolution::unknown());
    }
}
