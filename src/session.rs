//! Dialogue session state machine
//!
//! One logical thread of control: listen for a wake word, listen for a
//! command, dispatch it, speak the reply, repeat. Recognition failures are
//! absorbed here; dispatch failures are absorbed by the dispatcher; panics
//! are caught per step so the loop keeps running.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::Result;
use crate::config::{Config, Messages};
use crate::dispatch::CommandDispatcher;
use crate::intent::IntentResolver;
use crate::voice::{RecognitionResult, SpeechRecognizer, SpeechSynthesizer, WakeWordGate};

/// Where the session is in the listen/dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Polling for a wake word with the short timeout
    #[default]
    AwaitingWakeWord,
    /// Wake word heard; listening for a command with the long timeout
    AwaitingCommand,
    /// A command was heard and is waiting to be dispatched
    Dispatching,
    /// The loop is over
    ShuttingDown,
}

/// Mutable per-process session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Current state
    pub state: State,
    /// Recognition failures in a row while waiting for the wake word
    pub consecutive_errors: u32,
    /// Command-like utterances heard without a wake word
    pub ungated_attempts: u32,
}

/// Timing and thresholds for the loop
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Listen timeout while polling for the wake word
    pub wake_timeout: Duration,
    /// Listen timeout for the command after the wake word
    pub command_timeout: Duration,
    /// Pause after the microphone diagnostic
    pub diagnostic_pause: Duration,
    /// Pause after an unexpected failure
    pub error_pause: Duration,
    /// Failures before the diagnostic is spoken
    pub error_threshold: u32,
    /// Ungated commands before the reminder is spoken
    pub ungated_threshold: u32,
    /// Words that make an utterance look like a command
    pub command_verbs: Vec<String>,
}

impl SessionSettings {
    /// Settings from configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            wake_timeout: config.listening.wake_timeout,
            command_timeout: config.listening.command_timeout,
            diagnostic_pause: config.listening.diagnostic_pause,
            error_pause: config.listening.error_pause,
            error_threshold: config.assistant.error_threshold,
            ungated_threshold: config.assistant.ungated_threshold,
            command_verbs: config
                .assistant
                .command_verbs
                .iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }
}

/// Whether `text` contains any of `verbs` as a substring
#[must_use]
pub fn looks_like_command(text: &str, verbs: &[String]) -> bool {
    let text = text.to_lowercase();
    verbs.iter().any(|verb| text.contains(verb.as_str()))
}

/// A running assistant session
pub struct Session {
    recognizer: Box<dyn SpeechRecognizer>,
    speaker: Box<dyn SpeechSynthesizer>,
    gate: WakeWordGate,
    resolver: IntentResolver,
    dispatcher: CommandDispatcher,
    settings: SessionSettings,
    messages: Messages,
    state: SessionState,
    pending: Option<String>,
}

impl Session {
    /// Assemble a session
    ///
    /// # Errors
    ///
    /// Returns error if no usable wake word is configured
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        speaker: Box<dyn SpeechSynthesizer>,
        resolver: IntentResolver,
        dispatcher: CommandDispatcher,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            recognizer,
            speaker,
            gate: WakeWordGate::new(config.assistant.wake_words.clone())?,
            resolver,
            dispatcher,
            settings: SessionSettings::from_config(config),
            messages: config.messages.clone(),
            state: SessionState::default(),
            pending: None,
        })
    }

    /// Replace the timing settings
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run until shut down by voice or by `shutdown` resolving
    ///
    /// Speaks the greeting first and the goodbye exactly once at the end.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        let mut shutdown = std::pin::pin!(shutdown);

        tracing::info!(wake_words = ?self.gate.wake_words(), "session started");
        let greeting = self.messages.greeting.clone();
        self.speaker.speak(&greeting).await;

        while self.state.state != State::ShuttingDown {
            let step = tokio::select! {
                biased;
                () = &mut shutdown => None,
                result = AssertUnwindSafe(self.step()).catch_unwind() => Some(result),
            };

            match step {
                None => {
                    tracing::info!("interrupted");
                    self.state.state = State::ShuttingDown;
                    let goodbye = self.messages.goodbye.clone();
                    self.speaker.speak(&goodbye).await;
                }
                Some(Ok(_)) => {}
                Some(Err(panic)) => self.recover(&*panic).await,
            }
        }

        tracing::info!("session ended");
    }

    async fn recover(&mut self, panic: &(dyn std::any::Any + Send)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(error = %message, state = ?self.state.state, "session step failed");

        tokio::time::sleep(self.settings.error_pause).await;
        self.pending = None;
        self.state.state = State::AwaitingWakeWord;
    }

    /// Perform one transition and return the new state
    pub async fn step(&mut self) -> State {
        let next = match self.state.state {
            State::AwaitingWakeWord => self.await_wake_word().await,
            State::AwaitingCommand => self.await_command().await,
            State::Dispatching => self.dispatch_pending().await,
            State::ShuttingDown => State::ShuttingDown,
        };

        if next != self.state.state {
            tracing::debug!(from = ?self.state.state, to = ?next, "state transition");
        }
        self.state.state = next;
        next
    }

    async fn await_wake_word(&mut self) -> State {
        let heard = self.recognizer.listen(self.settings.wake_timeout).await;

        if heard.is_failure() {
            self.record_failure(&heard).await;
            return State::AwaitingWakeWord;
        }

        let RecognitionResult::Text(text) = heard else {
            // Silence is normal while idle
            self.state.ungated_attempts = 0;
            return State::AwaitingWakeWord;
        };

        self.state.consecutive_errors = 0;
        tracing::info!(text = %text, "heard");

        if self.gate.contains_wake_word(&text) {
            tracing::info!("wake word detected");
            self.state.ungated_attempts = 0;
            let listening = self.messages.listening.clone();
            self.speaker.speak(&listening).await;
            return State::AwaitingCommand;
        }

        if looks_like_command(&text, &self.settings.command_verbs) {
            self.state.ungated_attempts += 1;
            tracing::debug!(attempts = self.state.ungated_attempts, "command without wake word");
            if self.state.ungated_attempts >= self.settings.ungated_threshold {
                let reminder = self.messages.wake_word_reminder.clone();
                self.speaker.speak(&reminder).await;
                self.state.ungated_attempts = 0;
            }
        } else {
            self.state.ungated_attempts = 0;
        }

        State::AwaitingWakeWord
    }

    async fn record_failure(&mut self, failure: &RecognitionResult) {
        self.state.consecutive_errors += 1;
        tracing::warn!(
            result = ?failure,
            consecutive = self.state.consecutive_errors,
            "recognition failed"
        );

        if self.state.consecutive_errors >= self.settings.error_threshold {
            let trouble = self.messages.microphone_trouble.clone();
            self.speaker.speak(&trouble).await;
            tokio::time::sleep(self.settings.diagnostic_pause).await;
            self.state.consecutive_errors = 0;
        }
    }

    async fn await_command(&mut self) -> State {
        match self.recognizer.listen(self.settings.command_timeout).await {
            RecognitionResult::Text(command) => {
                tracing::info!(command = %command, "command heard");
                self.pending = Some(command);
                State::Dispatching
            }
            other => {
                tracing::info!(result = ?other, "no command heard");
                let didnt_catch = self.messages.didnt_catch.clone();
                self.speaker.speak(&didnt_catch).await;
                State::AwaitingWakeWord
            }
        }
    }

    async fn dispatch_pending(&mut self) -> State {
        let Some(command) = self.pending.take() else {
            return State::AwaitingWakeWord;
        };

        let resolution = self.resolver.resolve(&command);
        let outcome = self
            .dispatcher
            .dispatch(resolution.intent, resolution.entity.as_deref())
            .await;

        if let Some(reply) = outcome.reply {
            self.speaker.speak(&reply).await;
        }

        if outcome.continue_running {
            State::AwaitingWakeWord
        } else {
            tracing::info!("shutdown requested by voice");
            let goodbye = self.messages.goodbye.clone();
            self.speaker.speak(&goodbye).await;
            State::ShuttingDown
        }
    }
}
