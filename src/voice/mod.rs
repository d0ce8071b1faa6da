//! Voice input and output
//!
//! Listening produces a tagged [`RecognitionResult`]; failures never
//! masquerade as recognized text. Speaking is best-effort and never
//! fails from the caller's point of view.

mod activity;
mod capture;
mod console;
mod playback;
mod stt;
mod tts;
mod wake_word;

use std::time::Duration;

use async_trait::async_trait;

pub use activity::{SegmenterState, SpeechSegmenter};
pub use capture::{AudioCapture, SAMPLE_RATE, calculate_rms, samples_to_wav};
pub use console::{ConsoleRecognizer, ConsoleSpeaker};
pub use playback::AudioPlayback;
pub use stt::{MicrophoneRecognizer, SpeechToText};
pub use tts::{TextToSpeech, VoiceSpeaker};
pub use wake_word::WakeWordGate;

/// Outcome of a single listen attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    /// Recognized speech, lowercased and trimmed
    Text(String),
    /// No speech started before the timeout expired
    Timeout,
    /// Speech was heard but could not be transcribed
    Unintelligible,
    /// The recognition service failed or was unreachable
    ServiceError(String),
    /// Any other failure (device, encoding, ...)
    OtherError(String),
}

impl RecognitionResult {
    /// Build a text result, normalizing case and surrounding whitespace
    ///
    /// Blank text is reported as [`RecognitionResult::Unintelligible`].
    #[must_use]
    pub fn from_transcript(transcript: &str) -> Self {
        let text = transcript.trim().to_lowercase();
        if text.is_empty() {
            Self::Unintelligible
        } else {
            Self::Text(text)
        }
    }

    /// Recognized text, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this is a failure that counts toward the error threshold
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Unintelligible | Self::ServiceError(_) | Self::OtherError(_)
        )
    }
}

/// Speech-to-text collaborator
///
/// Futures are not `Send`: audio streams are pinned to the thread that
/// opened them.
#[async_trait(?Send)]
pub trait SpeechRecognizer {
    /// Listen for one utterance, waiting at most `timeout` for speech to start
    async fn listen(&mut self, timeout: Duration) -> RecognitionResult;
}

/// Speech synthesis collaborator
#[async_trait(?Send)]
pub trait SpeechSynthesizer {
    /// Speak `text`, blocking until done; failures are logged and swallowed
    async fn speak(&mut self, text: &str);
}
