//! Command dispatch
//!
//! Turns a resolved intent into one service call and a spoken reply.
//! Handler errors stop here: they are logged and replaced by the generic
//! error message, so the session loop never sees them.

use chrono::{DateTime, Local, TimeZone};

use crate::Result;
use crate::config::{Config, Messages, WeatherUnits};
use crate::intent::Intent;
use crate::services::{
    LaunchOutcome, PlayOutcome, Services, Summary, VolumeChange, WeatherLookup,
};

const YOUTUBE_HOME: &str = "https://www.youtube.com";
const GOOGLE_HOME: &str = "https://www.google.com";
const NEWS_URL: &str = "https://news.google.com";

const NOT_CONNECTED: &str = "Spotify is not connected. Please check your credentials.";

/// What the session should do after a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Text to speak, if any
    pub reply: Option<String>,
    /// `false` only when the user asked to shut down
    pub continue_running: bool,
}

impl DispatchOutcome {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            continue_running: true,
        }
    }

    const fn shutdown() -> Self {
        Self {
            reply: None,
            continue_running: false,
        }
    }
}

/// Routes intents to service handlers
pub struct CommandDispatcher {
    services: Services,
    messages: Messages,
    default_city: String,
    units: WeatherUnits,
}

impl CommandDispatcher {
    /// Create a dispatcher over the given services
    #[must_use]
    pub fn new(services: Services, config: &Config) -> Self {
        Self {
            services,
            messages: config.messages.clone(),
            default_city: config.weather.default_city.clone(),
            units: config.weather.units,
        }
    }

    /// Run the handler for `intent`
    ///
    /// Never fails. Unknown intents get the not-understood message and
    /// only [`Intent::Shutdown`] stops the loop.
    pub async fn dispatch(&self, intent: Intent, entity: Option<&str>) -> DispatchOutcome {
        match intent {
            Intent::Shutdown => return DispatchOutcome::shutdown(),
            Intent::Unknown => return DispatchOutcome::reply(&self.messages.not_understood),
            _ => {}
        }

        match self.handle(intent, entity).await {
            Ok(reply) => DispatchOutcome::reply(reply),
            Err(e) => {
                tracing::error!(%intent, ?entity, error = %e, "handler failed");
                DispatchOutcome::reply(&self.messages.error_occurred)
            }
        }
    }

    async fn handle(&self, intent: Intent, entity: Option<&str>) -> Result<String> {
        match (intent, entity) {
            (Intent::PlaySpotify, Some(query)) => self.play(query).await,
            (
                Intent::PauseSpotify
                | Intent::ResumeSpotify
                | Intent::NextSong
                | Intent::PreviousSong,
                _,
            ) => self.control(intent).await,
            (Intent::SearchYoutube, query) => self.search_youtube(query),
            (Intent::SearchGoogle, query) => self.search_google(query),
            (Intent::Weather, location) => Ok(self.weather(location).await),
            (Intent::Time, _) => Ok(time_reply(&Local::now())),
            (Intent::Date, _) => Ok(date_reply(&Local::now())),
            (Intent::Wikipedia, Some(query)) => self.wikipedia(query).await,
            (Intent::News, _) => {
                self.services.opener.open(NEWS_URL)?;
                Ok("Opening latest news for you".to_string())
            }
            (Intent::OpenApp, Some(name)) => self.open_app(name),
            (Intent::VolumeUp, _) => self.volume(VolumeChange::Up),
            (Intent::VolumeDown, _) => self.volume(VolumeChange::Down),
            (Intent::Mute, _) => self.volume(VolumeChange::Mute),
            // Handlers that need an entity heard none
            (
                Intent::PlaySpotify
                | Intent::Wikipedia
                | Intent::OpenApp
                | Intent::Shutdown
                | Intent::Unknown,
                _,
            ) => Ok(self.messages.not_understood.clone()),
        }
    }

    async fn play(&self, query: &str) -> Result<String> {
        let Some(music) = &self.services.music else {
            return Ok(NOT_CONNECTED.to_string());
        };

        Ok(match music.play_by_query(query).await? {
            PlayOutcome::Playing { track, artist } => {
                format!("Playing {track} by {artist} on Spotify")
            }
            PlayOutcome::NoDevice => {
                "No active Spotify devices found. Please open Spotify on a device.".to_string()
            }
            PlayOutcome::NotFound => format!("Sorry, I couldn't find {query} on Spotify"),
        })
    }

    async fn control(&self, intent: Intent) -> Result<String> {
        let Some(music) = &self.services.music else {
            return Ok(NOT_CONNECTED.to_string());
        };

        let reply = match intent {
            Intent::PauseSpotify => {
                music.pause().await?;
                "Music paused"
            }
            Intent::ResumeSpotify => {
                music.resume().await?;
                "Music resumed"
            }
            Intent::NextSong => {
                music.next().await?;
                "Playing next song"
            }
            _ => {
                music.previous().await?;
                "Playing previous song"
            }
        };
        Ok(reply.to_string())
    }

    fn search_youtube(&self, query: Option<&str>) -> Result<String> {
        match query {
            Some(q) if q != "youtube" => {
                self.services.opener.open(&format!(
                    "{YOUTUBE_HOME}/results?search_query={}",
                    urlencoding::encode(q)
                ))?;
                Ok(format!("Searching YouTube for {q}"))
            }
            _ => self.open_home("YouTube", YOUTUBE_HOME),
        }
    }

    fn search_google(&self, query: Option<&str>) -> Result<String> {
        match query {
            Some(q) if q != "google" => {
                self.services.opener.open(&google_search_url(q))?;
                Ok(format!("Searching Google for {q}"))
            }
            _ => self.open_home("Google", GOOGLE_HOME),
        }
    }

    fn open_home(&self, name: &str, url: &str) -> Result<String> {
        self.services.opener.open(url)?;
        Ok(format!("Opening {name} in your browser"))
    }

    async fn weather(&self, location: Option<&str>) -> String {
        let location = location.unwrap_or(self.default_city.as_str());
        let search = google_search_url(&format!("weather in {location}"));

        let Some(weather) = &self.services.weather else {
            self.open_best_effort(&search);
            return format!("Opening weather search for {location}");
        };

        match weather.current(location).await {
            Ok(WeatherLookup::Report(report)) => {
                let unit = self.units.symbol();
                format!(
                    "The weather in {location} is {} with a temperature of {}{unit}, feels like {}{unit}",
                    report.description, report.temp, report.feels_like
                )
            }
            Ok(WeatherLookup::NotFound) => {
                format!("Sorry, I couldn't find weather information for {location}")
            }
            Err(e) => {
                tracing::error!(location, error = %e, "weather lookup failed");
                self.open_best_effort(&search);
                "I couldn't get weather data. Let me search the web for you.".to_string()
            }
        }
    }

    fn open_best_effort(&self, url: &str) {
        if let Err(e) = self.services.opener.open(url) {
            tracing::warn!(url, error = %e, "failed to open browser");
        }
    }

    async fn wikipedia(&self, query: &str) -> Result<String> {
        let encyclopedia = &self.services.encyclopedia;

        let summary = match encyclopedia.summarize(query).await? {
            Summary::Disambiguation(options) => match options.first() {
                Some(first) => {
                    tracing::debug!(query, option = %first, "taking first disambiguation option");
                    encyclopedia.summarize(first).await?
                }
                None => Summary::NotFound,
            },
            other => other,
        };

        Ok(match summary {
            Summary::Text(text) => format!("According to Wikipedia: {text}"),
            Summary::Disambiguation(_) => {
                format!("I found multiple results for {query}. Please be more specific.")
            }
            Summary::NotFound => {
                format!("Sorry, I couldn't find information about {query} on Wikipedia")
            }
        })
    }

    fn open_app(&self, name: &str) -> Result<String> {
        match name {
            "youtube" => return self.open_home("YouTube", YOUTUBE_HOME),
            "google" => return self.open_home("Google", GOOGLE_HOME),
            _ => {}
        }

        Ok(match self.services.launcher.launch(name)? {
            LaunchOutcome::Launched => format!("Opening {name}"),
            LaunchOutcome::OpenedInBrowser => format!("Opening {name} in your browser"),
            LaunchOutcome::NotFound => format!("Sorry, I couldn't find or open {name}"),
        })
    }

    fn volume(&self, change: VolumeChange) -> Result<String> {
        self.services.volume.adjust(change)?;
        Ok(format!("Volume {}", change.describe()))
    }
}

fn google_search_url(query: &str) -> String {
    format!("{GOOGLE_HOME}/search?q={}", urlencoding::encode(query))
}

/// "The current time is 03:04 PM"
#[must_use]
pub fn time_reply<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("The current time is {}", now.format("%I:%M %p"))
}

/// "Today is Monday, January 01, 2024"
#[must_use]
pub fn date_reply<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Today is {}", now.format("%A, %B %d, %Y"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_time_and_date_replies() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 15, 4, 0).unwrap();
        assert_eq!(time_reply(&at), "The current time is 03:04 PM");
        assert_eq!(date_reply(&at), "Today is Monday, January 01, 2024");
    }

    #[test]
    fn test_google_search_url_encodes() {
        assert_eq!(
            google_search_url("weather in new york"),
            "https://www.google.com/search?q=weather%20in%20new%20york"
        );
    }
}
