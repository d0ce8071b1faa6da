//! Shared test utilities
//!
//! Scripted voice collaborators and recording service fakes. Nothing here
//! touches audio hardware or the network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use voice_dispatcher::config::file::ConfigFile;
use voice_dispatcher::services::{
    AppLauncher, Encyclopedia, LaunchOutcome, MusicService, PlayOutcome, Services, Summary,
    UrlOpener, VolumeChange, VolumeControl, WeatherLookup, WeatherReport, WeatherService,
};
use voice_dispatcher::{
    CommandDispatcher, Config, Error, IntentResolver, RecognitionResult, Result, Session,
    SessionSettings, SpeechRecognizer, SpeechSynthesizer,
};

/// Log of service calls, shared by every fake
pub type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, call: String) {
    calls.lock().unwrap().push(call);
}

/// Default configuration with no file and no environment
#[must_use]
pub fn test_config() -> Config {
    Config::resolve(ConfigFile::default(), |_| None).expect("default config resolves")
}

/// Settings with no pauses so tests run instantly
#[must_use]
pub fn fast_settings(config: &Config) -> SessionSettings {
    SessionSettings {
        wake_timeout: Duration::from_millis(1),
        command_timeout: Duration::from_millis(2),
        diagnostic_pause: Duration::ZERO,
        error_pause: Duration::ZERO,
        ..SessionSettings::from_config(config)
    }
}

/// One scripted listen outcome
#[derive(Debug, Clone)]
pub enum Heard {
    /// Return this result
    Result(RecognitionResult),
    /// Panic inside `listen`
    Panic,
}

impl From<RecognitionResult> for Heard {
    fn from(result: RecognitionResult) -> Self {
        Self::Result(result)
    }
}

/// Shorthand for a recognized utterance
#[must_use]
pub fn text(s: &str) -> Heard {
    Heard::Result(RecognitionResult::Text(s.to_string()))
}

/// Replays scripted outcomes, then times out forever
pub struct ScriptedRecognizer {
    script: VecDeque<Heard>,
    timeouts: Arc<Mutex<Vec<Duration>>>,
    exhausted: Arc<Notify>,
}

impl ScriptedRecognizer {
    /// Create from a script
    pub fn new(script: impl IntoIterator<Item = Heard>) -> Self {
        Self {
            script: script.into_iter().collect(),
            timeouts: Arc::new(Mutex::new(Vec::new())),
            exhausted: Arc::new(Notify::new()),
        }
    }

    /// Timeouts passed to each `listen` call
    #[must_use]
    pub fn timeouts(&self) -> Arc<Mutex<Vec<Duration>>> {
        Arc::clone(&self.timeouts)
    }

    /// Notified when a `listen` finds the script empty
    #[must_use]
    pub fn exhausted(&self) -> Arc<Notify> {
        Arc::clone(&self.exhausted)
    }
}

#[async_trait(?Send)]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn listen(&mut self, timeout: Duration) -> RecognitionResult {
        self.timeouts.lock().unwrap().push(timeout);

        match self.script.pop_front() {
            Some(Heard::Result(result)) => result,
            Some(Heard::Panic) => panic!("scripted recognizer failure"),
            None => {
                self.exhausted.notify_one();
                RecognitionResult::Timeout
            }
        }
    }
}

/// Records every spoken line
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    /// Handle to the spoken lines
    #[must_use]
    pub fn spoken(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }
}

#[async_trait(?Send)]
impl SpeechSynthesizer for RecordingSpeaker {
    async fn speak(&mut self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Music fake; plays anything as a Queen track unless told otherwise
pub struct FakeMusic {
    pub calls: Calls,
    pub outcome: Option<PlayOutcome>,
    pub fail: bool,
}

impl FakeMusic {
    fn control(&self, name: &str) -> Result<()> {
        record(&self.calls, format!("music.{name}"));
        if self.fail {
            return Err(Error::Music("player unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MusicService for FakeMusic {
    async fn play_by_query(&self, query: &str) -> Result<PlayOutcome> {
        record(&self.calls, format!("music.play {query}"));
        if self.fail {
            return Err(Error::Music("search failed".to_string()));
        }
        Ok(self.outcome.clone().unwrap_or_else(|| PlayOutcome::Playing {
            track: query.to_string(),
            artist: "Queen".to_string(),
        }))
    }

    async fn pause(&self) -> Result<()> {
        self.control("pause")
    }

    async fn resume(&self) -> Result<()> {
        self.control("resume")
    }

    async fn next(&self) -> Result<()> {
        self.control("next")
    }

    async fn previous(&self) -> Result<()> {
        self.control("previous")
    }
}

/// Records opened URLs
pub struct FakeOpener {
    pub calls: Calls,
}

impl UrlOpener for FakeOpener {
    fn open(&self, url: &str) -> Result<()> {
        record(&self.calls, format!("open {url}"));
        Ok(())
    }
}

/// Weather fake; `None` simulates a transport failure
pub struct FakeWeather {
    pub calls: Calls,
    pub lookup: Option<WeatherLookup>,
}

#[async_trait]
impl WeatherService for FakeWeather {
    async fn current(&self, location: &str) -> Result<WeatherLookup> {
        record(&self.calls, format!("weather {location}"));
        self.lookup
            .clone()
            .ok_or_else(|| Error::Weather("connection refused".to_string()))
    }
}

/// Encyclopedia fake backed by a map; unknown queries are not found
pub struct FakeEncyclopedia {
    pub calls: Calls,
    pub articles: HashMap<String, Summary>,
}

#[async_trait]
impl Encyclopedia for FakeEncyclopedia {
    async fn summarize(&self, query: &str) -> Result<Summary> {
        record(&self.calls, format!("encyclopedia {query}"));
        Ok(self.articles.get(query).cloned().unwrap_or(Summary::NotFound))
    }
}

/// Launcher fake; knows a fixed set of names
pub struct FakeLauncher {
    pub calls: Calls,
    pub installed: Vec<String>,
}

impl AppLauncher for FakeLauncher {
    fn launch(&self, name: &str) -> Result<LaunchOutcome> {
        record(&self.calls, format!("launch {name}"));
        Ok(if self.installed.iter().any(|app| app == name) {
            LaunchOutcome::Launched
        } else {
            LaunchOutcome::NotFound
        })
    }
}

/// Volume fake
pub struct FakeVolume {
    pub calls: Calls,
}

impl VolumeControl for FakeVolume {
    fn adjust(&self, change: VolumeChange) -> Result<()> {
        record(&self.calls, format!("volume {change:?}"));
        Ok(())
    }
}

/// Every service connected and well behaved
#[must_use]
pub fn fake_services(calls: &Calls) -> Services {
    Services {
        music: Some(Box::new(FakeMusic {
            calls: Arc::clone(calls),
            outcome: None,
            fail: false,
        })),
        opener: Arc::new(FakeOpener {
            calls: Arc::clone(calls),
        }),
        weather: Some(Box::new(FakeWeather {
            calls: Arc::clone(calls),
            lookup: Some(WeatherLookup::Report(WeatherReport {
                description: "clear sky".to_string(),
                temp: 18,
                feels_like: 17,
            })),
        })),
        encyclopedia: Box::new(FakeEncyclopedia {
            calls: Arc::clone(calls),
            articles: HashMap::from([
                (
                    "rust".to_string(),
                    Summary::Text("Rust is a programming language.".to_string()),
                ),
                (
                    "mercury".to_string(),
                    Summary::Disambiguation(vec!["Mercury (planet)".to_string()]),
                ),
                (
                    "Mercury (planet)".to_string(),
                    Summary::Text("Mercury is the first planet from the Sun.".to_string()),
                ),
            ]),
        }),
        launcher: Box::new(FakeLauncher {
            calls: Arc::clone(calls),
            installed: vec!["calculator".to_string()],
        }),
        volume: Box::new(FakeVolume {
            calls: Arc::clone(calls),
        }),
    }
}

/// Dispatcher over the given services and default config
#[must_use]
pub fn dispatcher(services: Services) -> CommandDispatcher {
    CommandDispatcher::new(services, &test_config())
}

/// Everything a session test needs to inspect afterwards
pub struct Harness {
    pub session: Session,
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub calls: Calls,
    pub timeouts: Arc<Mutex<Vec<Duration>>>,
    pub exhausted: Arc<Notify>,
    pub config: Config,
}

impl Harness {
    /// Session over a script with fake services and no pauses
    pub fn new(script: impl IntoIterator<Item = Heard>) -> Self {
        let calls = Calls::default();
        let services = fake_services(&calls);
        Self::with_services(script, services, calls)
    }

    /// Session over a script with the given services
    pub fn with_services(
        script: impl IntoIterator<Item = Heard>,
        services: Services,
        calls: Calls,
    ) -> Self {
        let config = test_config();
        let recognizer = ScriptedRecognizer::new(script);
        let speaker = RecordingSpeaker::default();

        let spoken = speaker.spoken();
        let timeouts = recognizer.timeouts();
        let exhausted = recognizer.exhausted();

        let session = Session::new(
            Box::new(recognizer),
            Box::new(speaker),
            IntentResolver::new().unwrap(),
            CommandDispatcher::new(services, &config),
            &config,
        )
        .unwrap()
        .with_settings(fast_settings(&config));

        Self {
            session,
            spoken,
            calls,
            timeouts,
            exhausted,
            config,
        }
    }

    /// Lines spoken so far
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// Service calls so far
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}
