//! TOML configuration file loading
//!
//! Supports `~/.config/voice-dispatcher/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top
//! of defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Assistant behavior
    pub assistant: AssistantFileConfig,

    /// Listening timeouts and input device
    pub listening: ListeningFileConfig,

    /// Speech model configuration
    pub voice: VoiceFileConfig,

    /// Weather defaults
    pub weather: WeatherFileConfig,

    /// Application aliases
    pub apps: AppsFileConfig,

    /// Spoken messages
    pub messages: MessagesFileConfig,

    /// API keys for external services
    pub api_keys: ApiKeysFileConfig,

    /// Paths and logging
    pub runtime: RuntimeFileConfig,
}

/// Assistant behavior
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    pub name: Option<String>,
    pub wake_words: Option<Vec<String>>,
    pub command_verbs: Option<Vec<String>>,
    pub error_threshold: Option<u32>,
    pub ungated_threshold: Option<u32>,
}

/// Listening configuration, durations in seconds
#[derive(Debug, Default, Deserialize)]
pub struct ListeningFileConfig {
    pub wake_timeout_secs: Option<f64>,
    pub command_timeout_secs: Option<f64>,
    pub phrase_time_limit_secs: Option<f64>,
    pub diagnostic_pause_secs: Option<f64>,
    pub error_pause_secs: Option<f64>,
    pub input_device: Option<String>,
}

/// Speech model configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "nova")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f64>,
}

/// Weather defaults
#[derive(Debug, Default, Deserialize)]
pub struct WeatherFileConfig {
    pub default_city: Option<String>,
    pub units: Option<String>,
}

/// Extra application aliases, merged over the built-in ones
#[derive(Debug, Default, Deserialize)]
pub struct AppsFileConfig {
    #[serde(default)]
    pub desktop: BTreeMap<String, String>,
    #[serde(default)]
    pub web: BTreeMap<String, String>,
}

/// Spoken message overrides
#[derive(Debug, Default, Deserialize)]
pub struct MessagesFileConfig {
    pub greeting: Option<String>,
    pub goodbye: Option<String>,
    pub not_understood: Option<String>,
    pub listening: Option<String>,
    pub didnt_catch: Option<String>,
    pub error_occurred: Option<String>,
    pub microphone_trouble: Option<String>,
    pub wake_word_reminder: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_redirect_uri: Option<String>,
    pub spotify_refresh_token: Option<String>,
    pub openweather: Option<String>,
    pub openai: Option<String>,
    pub deepgram: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Paths, logging and network settings
#[derive(Debug, Default, Deserialize)]
pub struct RuntimeFileConfig {
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub debug_mode: Option<bool>,
    pub cache_dir: Option<String>,
    pub request_timeout_secs: Option<f64>,
}

/// Load the config file
///
/// An explicit `path` must exist and parse. Without one, the standard path
/// is tried and any problem there falls back to defaults with a warning.
///
/// # Errors
///
/// Returns error if an explicitly given file is missing or malformed
pub fn load_config_file(path: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "loaded config file");
        return Ok(config);
    }

    let Some(path) = config_file_path() else {
        return Ok(ConfigFile::default());
    };

    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                Ok(ConfigFile::default())
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            Ok(ConfigFile::default())
        }
    }
}

/// Return the config file path: `~/.config/voice-dispatcher/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-dispatcher").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file() {
        let fc: ConfigFile = toml::from_str(
            r#"
            [assistant]
            name = "Lucky"
            wake_words = ["hey lucky"]

            [apps.web]
            reddit = "https://www.reddit.com"
            "#,
        )
        .unwrap();

        assert_eq!(fc.assistant.name.as_deref(), Some("Lucky"));
        assert_eq!(fc.assistant.error_threshold, None);
        assert_eq!(fc.apps.web.get("reddit").map(String::as_str), Some("https://www.reddit.com"));
        assert!(fc.apps.desktop.is_empty());
    }

    #[test]
    fn test_explicit_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(load_config_file(Some(&missing)), Err(Error::Config(_))));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "assistant = [").unwrap();
        assert!(matches!(load_config_file(Some(&bad)), Err(Error::Toml(_))));
    }
}
