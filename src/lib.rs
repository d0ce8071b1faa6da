//! Voice Dispatcher - wake-word gated voice commands
//!
//! Listens for a wake word, captures one spoken command, maps it to an
//! intent through an ordered pattern table and runs the matching handler:
//! - Music playback (Spotify)
//! - Video and web search
//! - Weather, time, date, encyclopedia lookups
//! - Application launching and volume control
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Session                         │
//! │  AwaitingWakeWord → AwaitingCommand → Dispatching    │
//! └──────────┬──────────────────┬────────────────────────┘
//!            │                  │
//! ┌──────────▼─────────┐ ┌──────▼───────────────────────┐
//! │       Voice        │ │  Intent Resolver → Dispatcher│
//! │ Mic │ STT │ TTS    │ │  Pattern Table   │ Services  │
//! └────────────────────┘ └──────────────────────────────┘
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod services;
pub mod session;
pub mod voice;

pub use config::Config;
pub use dispatch::{CommandDispatcher, DispatchOutcome};
pub use error::{Error, Result};
pub use intent::{Intent, IntentResolver, Resolution};
pub use session::{Session, SessionSettings, SessionState, State};
pub use voice::{RecognitionResult, SpeechRecognizer, SpeechSynthesizer, WakeWordGate};
