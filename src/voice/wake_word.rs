//! Wake word gate
//!
//! Decides whether a recognized utterance contains an activation phrase.
//! Plain case-insensitive substring containment, no fuzzy matching.

use super::RecognitionResult;
use crate::{Error, Result};

/// Checks utterances for configured wake words
#[derive(Debug, Clone)]
pub struct WakeWordGate {
    wake_words: Vec<String>,
}

impl WakeWordGate {
    /// Create a new gate
    ///
    /// # Arguments
    ///
    /// * `wake_words` - Activation phrases (e.g., "hey assistant")
    ///
    /// # Errors
    ///
    /// Returns error if no non-blank wake word is given
    pub fn new(wake_words: Vec<String>) -> Result<Self> {
        let normalized: Vec<String> = wake_words
            .into_iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        if normalized.is_empty() {
            return Err(Error::Config("at least one wake word is required".to_string()));
        }

        tracing::debug!(wake_words = ?normalized, "wake word gate initialized");

        Ok(Self {
            wake_words: normalized,
        })
    }

    /// Check if text contains any wake word
    #[must_use]
    pub fn contains_wake_word(&self, text: &str) -> bool {
        let normalized = text.to_lowercase();

        match self.wake_words.iter().find(|w| normalized.contains(w.as_str())) {
            Some(wake_word) => {
                tracing::info!(wake_word, transcript = text, "wake word detected");
                true
            }
            None => false,
        }
    }

    /// Check a listen outcome; only recognized text can open the gate
    #[must_use]
    pub fn is_open(&self, result: &RecognitionResult) -> bool {
        result.text().is_some_and(|text| self.contains_wake_word(text))
    }

    /// Get the configured wake words
    #[must_use]
    pub fn wake_words(&self) -> &[String] {
        &self.wake_words
    }
}
