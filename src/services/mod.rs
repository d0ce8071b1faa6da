//! External service collaborators
//!
//! Each handler reports expected outcomes (not found, no device, ...) as
//! values. `Err` is reserved for failures the dispatcher turns into a
//! generic apology.

mod launcher;
mod opener;
mod spotify;
mod volume;
mod weather;
mod wikipedia;

use std::sync::Arc;

use async_trait::async_trait;

pub use launcher::SystemLauncher;
pub use opener::SystemOpener;
pub use spotify::SpotifyClient;
pub use volume::SystemVolume;
pub use weather::OpenWeatherClient;
pub use wikipedia::{WikipediaClient, first_sentences};

use crate::Result;
use crate::config::Config;

/// Result of asking the music service to play something
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback started
    Playing {
        /// Track title
        track: String,
        /// Primary artist
        artist: String,
    },
    /// No playback device is available
    NoDevice,
    /// The search found nothing
    NotFound,
}

/// Music playback service
#[async_trait]
pub trait MusicService: Send + Sync {
    /// Search for `query` and play the best match
    async fn play_by_query(&self, query: &str) -> Result<PlayOutcome>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Resume playback
    async fn resume(&self) -> Result<()>;

    /// Skip to the next track
    async fn next(&self) -> Result<()>;

    /// Go back to the previous track
    async fn previous(&self) -> Result<()>;
}

/// Opens URLs in the user's browser, fire-and-forget
pub trait UrlOpener: Send + Sync {
    /// Open `url`
    ///
    /// # Errors
    ///
    /// Returns error if the browser could not be started
    fn open(&self, url: &str) -> Result<()>;
}

/// Current conditions for a location
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Human description, e.g. "light rain"
    pub description: String,
    /// Temperature, rounded
    pub temp: i64,
    /// Apparent temperature, rounded
    pub feels_like: i64,
}

/// Result of a weather lookup
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLookup {
    /// Conditions were found
    Report(WeatherReport),
    /// The service does not know the location
    NotFound,
}

/// Weather lookup service
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Current weather for `location`
    async fn current(&self, location: &str) -> Result<WeatherLookup>;
}

/// Result of an encyclopedia lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// A short summary
    Text(String),
    /// The query is ambiguous; candidate titles in relevance order
    Disambiguation(Vec<String>),
    /// No article matches
    NotFound,
}

/// Encyclopedia lookup service
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Summarize the article best matching `query`
    async fn summarize(&self, query: &str) -> Result<Summary>;
}

/// Result of launching an application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A desktop application was started
    Launched,
    /// A web application was opened in the browser
    OpenedInBrowser,
    /// Nothing by that name could be started
    NotFound,
}

/// Application launcher
pub trait AppLauncher: Send + Sync {
    /// Launch the application known as `name`
    ///
    /// # Errors
    ///
    /// Returns error if the launch failed for a reason other than not found
    fn launch(&self, name: &str) -> Result<LaunchOutcome>;
}

/// A change to the system output volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChange {
    /// Louder
    Up,
    /// Quieter
    Down,
    /// Toggle mute
    Mute,
}

impl VolumeChange {
    /// Spoken description, e.g. "Volume increased"
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Up => "increased",
            Self::Down => "decreased",
            Self::Mute => "muted",
        }
    }
}

/// System volume control
pub trait VolumeControl: Send + Sync {
    /// Apply a volume change
    ///
    /// # Errors
    ///
    /// Returns error if the platform mixer fails or is unsupported
    fn adjust(&self, change: VolumeChange) -> Result<()>;
}

/// All collaborators the dispatcher talks to
pub struct Services {
    /// Music service; `None` when not connected
    pub music: Option<Box<dyn MusicService>>,

    /// Browser opener
    pub opener: Arc<dyn UrlOpener>,

    /// Weather service; `None` without an API key
    pub weather: Option<Box<dyn WeatherService>>,

    /// Encyclopedia
    pub encyclopedia: Box<dyn Encyclopedia>,

    /// Application launcher
    pub launcher: Box<dyn AppLauncher>,

    /// Volume control
    pub volume: Box<dyn VolumeControl>,
}

impl Services {
    /// Build the real service clients from configuration
    ///
    /// Missing credentials leave the matching service disconnected.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let opener: Arc<dyn UrlOpener> = Arc::new(SystemOpener);

        let music: Option<Box<dyn MusicService>> = match SpotifyClient::from_config(config)? {
            Some(client) => {
                tracing::info!("Spotify configured");
                Some(Box::new(client))
            }
            None => {
                tracing::warn!("Spotify credentials not configured");
                None
            }
        };

        let weather: Option<Box<dyn WeatherService>> = config
            .api_keys
            .openweather
            .as_ref()
            .map(|key| {
                OpenWeatherClient::new(key.clone(), config.weather.units, config.request_timeout)
                    .map(|c| Box::new(c) as Box<dyn WeatherService>)
            })
            .transpose()?;

        Ok(Self {
            music,
            weather,
            encyclopedia: Box::new(WikipediaClient::new(config.request_timeout)?),
            launcher: Box::new(SystemLauncher::new(
                config.apps.desktop.clone(),
                config.apps.web.clone(),
                Arc::clone(&opener),
            )),
            volume: Box::new(SystemVolume),
            opener,
        })
    }
}
