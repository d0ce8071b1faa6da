//! Configuration management
//!
//! Values resolve as environment > TOML file > built-in default.

pub mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Placeholder prefix shipped in sample `.env` files; treated as unset
const PLACEHOLDER_PREFIX: &str = "your_";

/// Voice dispatcher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant identity and gating behavior
    pub assistant: AssistantConfig,

    /// Listening timeouts and pauses
    pub listening: ListeningConfig,

    /// Speech model configuration
    pub voice: VoiceConfig,

    /// Weather defaults
    pub weather: WeatherConfig,

    /// Application aliases
    pub apps: AppsConfig,

    /// Spoken messages
    pub messages: Messages,

    /// API keys
    pub api_keys: ApiKeys,

    /// Timeout for outbound HTTP requests
    pub request_timeout: Duration,

    /// Data directory (log file)
    pub data_dir: PathBuf,

    /// Cache directory (service tokens)
    pub cache_dir: PathBuf,

    /// Log file path
    pub log_file: PathBuf,

    /// Explicit log filter (`LOG_LEVEL`), overrides verbosity flags
    pub log_level: Option<String>,

    /// Verbose diagnostics (`DEBUG_MODE`)
    pub debug_mode: bool,
}

/// Assistant identity and gating behavior
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Name printed before spoken lines
    pub name: String,

    /// Activation phrases
    pub wake_words: Vec<String>,

    /// Verbs that make an ungated utterance look like a command
    pub command_verbs: Vec<String>,

    /// Consecutive recognition failures before the microphone warning
    pub error_threshold: u32,

    /// Ungated command-like utterances before the wake word reminder
    pub ungated_threshold: u32,
}

/// Listening timeouts and pauses
#[derive(Debug, Clone)]
pub struct ListeningConfig {
    /// How long to wait for speech while polling for the wake word
    pub wake_timeout: Duration,

    /// How long to wait for the command after the wake word
    pub command_timeout: Duration,

    /// Longest single utterance
    pub phrase_time_limit: Duration,

    /// Pause after the microphone warning
    pub diagnostic_pause: Duration,

    /// Pause after an unexpected loop failure
    pub error_pause: Duration,

    /// Preferred input device name fragment
    pub input_device: Option<String>,
}

/// Speech model configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,
}

/// Weather defaults
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// City used when the command names none
    pub default_city: String,

    /// Unit system for temperatures
    pub units: WeatherUnits,
}

/// Temperature unit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeatherUnits {
    /// Celsius
    #[default]
    Metric,
    /// Fahrenheit
    Imperial,
    /// Kelvin
    Standard,
}

impl WeatherUnits {
    /// Parse a unit name (`metric`, `imperial`, `kelvin`/`standard`)
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Some(Self::Metric),
            "imperial" => Some(Self::Imperial),
            "kelvin" | "standard" => Some(Self::Standard),
            _ => None,
        }
    }

    /// Value for the `units` query parameter
    #[must_use]
    pub const fn api_value(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    /// Spoken temperature suffix
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }
}

/// Application aliases, keyed by lowercase spoken name
#[derive(Debug, Clone)]
pub struct AppsConfig {
    /// Spoken name to executable or application name
    pub desktop: BTreeMap<String, String>,

    /// Spoken name to URL
    pub web: BTreeMap<String, String>,
}

/// Fixed spoken messages
#[derive(Debug, Clone)]
pub struct Messages {
    pub greeting: String,
    pub goodbye: String,
    pub not_understood: String,
    pub listening: String,
    pub didnt_catch: String,
    pub error_occurred: String,
    pub microphone_trouble: String,
    pub wake_word_reminder: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            greeting: "Hello! I'm your voice assistant. Remember to say 'hey assistant' or \
                       'hello assistant' before each command. How can I help you today?"
                .to_string(),
            goodbye: "Goodbye! Have a great day!".to_string(),
            not_understood: "I'm sorry, I didn't understand that command. Can you please repeat \
                             or try a different way?"
                .to_string(),
            listening: "Yes, I'm listening. What can I do for you?".to_string(),
            didnt_catch: "I didn't catch that. Please try again.".to_string(),
            error_occurred: "Sorry, there was an error processing your request".to_string(),
            microphone_trouble: "I'm having trouble hearing you. Please check your microphone."
                .to_string(),
            wake_word_reminder: "Remember to say 'hey assistant' or 'hello assistant' first, then \
                                 wait for my response before giving your command."
                .to_string(),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Spotify application client ID
    pub spotify_client_id: Option<String>,

    /// Spotify application client secret
    pub spotify_client_secret: Option<String>,

    /// Spotify OAuth redirect URI registered for the application
    pub spotify_redirect_uri: String,

    /// Spotify user refresh token (from the authorization code flow)
    pub spotify_refresh_token: Option<String>,

    /// `OpenWeather` API key
    pub openweather: Option<String>,

    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,
}

impl ApiKeys {
    /// Whether every Spotify credential is present
    #[must_use]
    pub const fn spotify_configured(&self) -> bool {
        self.spotify_client_id.is_some()
            && self.spotify_client_secret.is_some()
            && self.spotify_refresh_token.is_some()
    }
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file is unreadable or a value
    /// is out of range
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(path)?;
        let config = Self::resolve(fc, |key| std::env::var(key).ok())?;

        for dir in [&config.data_dir, &config.cache_dir] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!(path = %dir.display(), error = %e, "failed to create directory");
            }
        }

        Ok(config)
    }

    /// Merge a parsed config file with an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a duration is negative, a threshold is zero, no
    /// wake word is configured, or the weather unit is unknown
    #[allow(clippy::too_many_lines)]
    pub fn resolve(fc: file::ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let assistant = AssistantConfig {
            name: fc.assistant.name.unwrap_or_else(|| "Assistant".to_string()),
            wake_words: fc.assistant.wake_words.unwrap_or_else(|| {
                to_strings(&["lucky", "hey assistant", "hello assistant", "assistant", "hey jarvis"])
            }),
            command_verbs: fc.assistant.command_verbs.unwrap_or_else(|| {
                to_strings(&["open", "search", "play", "find", "show", "tell", "what"])
            }),
            error_threshold: fc.assistant.error_threshold.unwrap_or(5),
            ungated_threshold: fc.assistant.ungated_threshold.unwrap_or(2),
        };

        if assistant.wake_words.iter().all(|w| w.trim().is_empty()) {
            return Err(Error::Config("at least one wake word is required".to_string()));
        }
        if assistant.error_threshold == 0 || assistant.ungated_threshold == 0 {
            return Err(Error::Config("thresholds must be at least 1".to_string()));
        }

        let listening = ListeningConfig {
            wake_timeout: seconds("wake_timeout_secs", fc.listening.wake_timeout_secs, 1.0)?,
            command_timeout: seconds(
                "command_timeout_secs",
                fc.listening.command_timeout_secs,
                10.0,
            )?,
            phrase_time_limit: seconds(
                "phrase_time_limit_secs",
                fc.listening.phrase_time_limit_secs,
                10.0,
            )?,
            diagnostic_pause: seconds(
                "diagnostic_pause_secs",
                fc.listening.diagnostic_pause_secs,
                5.0,
            )?,
            error_pause: seconds("error_pause_secs", fc.listening.error_pause_secs, 1.0)?,
            input_device: env("VOICE_INPUT_DEVICE")
                .or(fc.listening.input_device)
                .or_else(|| Some("Microphone Array".to_string()))
                .filter(|d| !d.is_empty()),
        };

        let voice = VoiceConfig {
            stt_model: env("VOICE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: env("VOICE_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "nova".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0).clamp(0.25, 4.0),
        };

        let units_name = env("WEATHER_UNITS")
            .or(fc.weather.units)
            .unwrap_or_else(|| "metric".to_string());
        let weather = WeatherConfig {
            default_city: env("DEFAULT_CITY")
                .or(fc.weather.default_city)
                .unwrap_or_else(|| "New York".to_string()),
            units: WeatherUnits::parse(&units_name)
                .ok_or_else(|| Error::Config(format!("unknown weather units: {units_name}")))?,
        };

        let mut apps = AppsConfig {
            desktop: default_desktop_apps(),
            web: default_web_apps(),
        };
        apps.desktop.extend(lowercase_keys(fc.apps.desktop));
        apps.web.extend(lowercase_keys(fc.apps.web));

        let defaults = Messages::default();
        let m = fc.messages;
        let messages = Messages {
            greeting: m.greeting.unwrap_or(defaults.greeting),
            goodbye: m.goodbye.unwrap_or(defaults.goodbye),
            not_understood: m.not_understood.unwrap_or(defaults.not_understood),
            listening: m.listening.unwrap_or(defaults.listening),
            didnt_catch: m.didnt_catch.unwrap_or(defaults.didnt_catch),
            error_occurred: m.error_occurred.unwrap_or(defaults.error_occurred),
            microphone_trouble: m.microphone_trouble.unwrap_or(defaults.microphone_trouble),
            wake_word_reminder: m.wake_word_reminder.unwrap_or(defaults.wake_word_reminder),
        };

        let k = fc.api_keys;
        let api_keys = ApiKeys {
            spotify_client_id: credential(env("SPOTIFY_CLIENT_ID").or(k.spotify_client_id)),
            spotify_client_secret: credential(
                env("SPOTIFY_CLIENT_SECRET").or(k.spotify_client_secret),
            ),
            spotify_redirect_uri: env("SPOTIFY_REDIRECT_URI")
                .or(k.spotify_redirect_uri)
                .unwrap_or_else(|| "http://localhost:8888/callback".to_string()),
            spotify_refresh_token: credential(
                env("SPOTIFY_REFRESH_TOKEN").or(k.spotify_refresh_token),
            ),
            openweather: credential(env("OPENWEATHER_API_KEY").or(k.openweather)),
            openai: credential(env("OPENAI_API_KEY").or(k.openai)),
            deepgram: credential(env("DEEPGRAM_API_KEY").or(k.deepgram)),
            elevenlabs: credential(env("ELEVENLABS_API_KEY").or(k.elevenlabs)),
        };

        // ~/.local/share/voice-dispatcher and ~/.cache/voice-dispatcher on Linux
        let base = directories::BaseDirs::new();
        let data_dir = base.as_ref().map_or_else(
            || PathBuf::from("."),
            |d| d.data_dir().join("voice-dispatcher"),
        );
        let cache_dir = env("VOICE_CACHE_DIR")
            .or(fc.runtime.cache_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                base.as_ref().map_or_else(
                    || PathBuf::from("cache"),
                    |d| d.cache_dir().join("voice-dispatcher"),
                )
            });
        let log_file = env("LOG_FILE")
            .or(fc.runtime.log_file)
            .map_or_else(|| data_dir.join("assistant.log"), PathBuf::from);

        let debug_mode = env("DEBUG_MODE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .or(fc.runtime.debug_mode)
            .unwrap_or(false);

        Ok(Self {
            assistant,
            listening,
            voice,
            weather,
            apps,
            messages,
            api_keys,
            request_timeout: seconds(
                "request_timeout_secs",
                fc.runtime.request_timeout_secs,
                10.0,
            )?,
            data_dir,
            cache_dir,
            log_file,
            log_level: env("LOG_LEVEL").or(fc.runtime.log_level),
            debug_mode,
        })
    }

    /// Names of unset credentials that disable features
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let keys = &self.api_keys;
        [
            ("SPOTIFY_CLIENT_ID", keys.spotify_client_id.is_none()),
            ("SPOTIFY_CLIENT_SECRET", keys.spotify_client_secret.is_none()),
            ("SPOTIFY_REFRESH_TOKEN", keys.spotify_refresh_token.is_none()),
            ("OPENWEATHER_API_KEY", keys.openweather.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect()
    }

    /// Warn about missing credentials; never fatal
    ///
    /// Returns true when every credential is present.
    #[must_use]
    pub fn validate(&self) -> bool {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            tracing::warn!(
                missing = %missing.join(", "),
                "missing API keys, some features may not work"
            );
        }
        missing.is_empty()
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn lowercase_keys(map: BTreeMap<String, String>) -> impl Iterator<Item = (String, String)> {
    map.into_iter().map(|(k, v)| (k.to_lowercase(), v))
}

/// Drop empty and placeholder credentials
fn credential(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.starts_with(PLACEHOLDER_PREFIX))
}

fn seconds(name: &str, value: Option<f64>, default: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value.unwrap_or(default))
        .map_err(|e| Error::Config(format!("{name}: {e}")))
}

fn default_web_apps() -> BTreeMap<String, String> {
    [
        ("google", "https://www.google.com"),
        ("youtube", "https://www.youtube.com"),
        ("gmail", "https://mail.google.com"),
        ("maps", "https://maps.google.com"),
        ("facebook", "https://www.facebook.com"),
        ("twitter", "https://twitter.com"),
        ("instagram", "https://www.instagram.com"),
        ("linkedin", "https://www.linkedin.com"),
        ("github", "https://github.com"),
        ("amazon", "https://www.amazon.com"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_desktop_apps() -> BTreeMap<String, String> {
    #[cfg(target_os = "windows")]
    let apps = [
        ("notepad", "notepad.exe"),
        ("calculator", "calc.exe"),
        ("chrome", "chrome.exe"),
        ("firefox", "firefox.exe"),
        ("word", "winword.exe"),
        ("excel", "excel.exe"),
        ("powerpoint", "powerpnt.exe"),
        ("spotify", "spotify.exe"),
        ("discord", "discord.exe"),
        ("steam", "steam.exe"),
        ("vlc", "vlc.exe"),
    ];

    #[cfg(target_os = "macos")]
    let apps = [
        ("notepad", "TextEdit"),
        ("calculator", "Calculator"),
        ("chrome", "Google Chrome"),
        ("firefox", "Firefox"),
        ("word", "Microsoft Word"),
        ("excel", "Microsoft Excel"),
        ("powerpoint", "Microsoft PowerPoint"),
        ("spotify", "Spotify"),
        ("discord", "Discord"),
        ("steam", "Steam"),
        ("vlc", "VLC"),
    ];

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let apps = [
        ("notepad", "gedit"),
        ("calculator", "gnome-calculator"),
        ("chrome", "google-chrome"),
        ("firefox", "firefox"),
        ("word", "libreoffice"),
        ("excel", "libreoffice"),
        ("powerpoint", "libreoffice"),
        ("spotify", "spotify"),
        ("discord", "discord"),
        ("steam", "steam"),
        ("vlc", "vlc"),
    ];

    apps.into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
