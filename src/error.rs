//! Error types for the voice dispatcher

use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while listening, speaking or running a handler
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Music service error
    #[error("music error: {0}")]
    Music(String),

    /// Weather service error
    #[error("weather error: {0}")]
    Weather(String),

    /// Encyclopedia lookup error
    #[error("encyclopedia error: {0}")]
    Encyclopedia(String),

    /// Application or URL launch error
    #[error("launch error: {0}")]
    Launch(String),

    /// System volume control error
    #[error("volume error: {0}")]
    Volume(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid intent pattern
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
