//! Text-to-speech (TTS) output

use async_trait::async_trait;

use super::SpeechSynthesizer;
use super::playback::AudioPlayback;
use crate::config::Config;
use crate::{Error, Result};

/// TTS provider backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

/// Synthesizes MP3 speech through a hosted TTS API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f64,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Pick a provider from configured keys: `ElevenLabs` if set, else `OpenAI`
    ///
    /// Returns `Ok(None)` when neither key is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let (provider, api_key, model) =
            match (&config.api_keys.elevenlabs, &config.api_keys.openai) {
                (Some(key), _) => (
                    TtsProvider::ElevenLabs,
                    key.clone(),
                    "eleven_monolingual_v1".to_string(),
                ),
                (None, Some(key)) => (TtsProvider::OpenAI, key.clone(), config.voice.tts_model.clone()),
                (None, None) => return Ok(None),
            };

        Ok(Some(Self {
            client: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()?,
            api_key,
            voice: config.voice.tts_voice.clone(),
            speed: config.voice.tts_speed,
            model,
            provider,
        }))
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = match self.provider {
            TtsProvider::OpenAI => self
                .client
                .post("https://api.openai.com/v1/audio/speech")
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({
                    "model": self.model,
                    "input": text,
                    "voice": self.voice,
                    "speed": self.speed,
                })),
            TtsProvider::ElevenLabs => self
                .client
                .post(format!(
                    "https://api.elevenlabs.io/v1/text-to-speech/{}",
                    self.voice
                ))
                .header("xi-api-key", &self.api_key)
                .json(&serde_json::json!({
                    "text": text,
                    "model_id": self.model,
                })),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("{:?} TTS error {status}: {body}", self.provider)));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Speaks through TTS and the speakers, echoing every line to the console
pub struct VoiceSpeaker {
    name: String,
    tts: Option<TextToSpeech>,
    playback: Option<AudioPlayback>,
}

impl VoiceSpeaker {
    /// Build a speaker; missing TTS keys or audio output degrade to text only
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let tts = TextToSpeech::from_config(config)?;
        if tts.is_none() {
            tracing::warn!("no TTS key configured, responses will be printed only");
        }

        let playback = match AudioPlayback::new() {
            Ok(playback) => Some(playback),
            Err(e) => {
                tracing::warn!(error = %e, "audio output unavailable, responses will be printed only");
                None
            }
        };

        Ok(Self {
            name: config.assistant.name.clone(),
            tts,
            playback,
        })
    }

    async fn say(&self, text: &str) -> Result<()> {
        let (Some(tts), Some(playback)) = (&self.tts, &self.playback) else {
            return Ok(());
        };

        let audio = tts.synthesize(text).await?;
        playback.play_mp3(&audio)
    }
}

#[async_trait(?Send)]
impl SpeechSynthesizer for VoiceSpeaker {
    async fn speak(&mut self, text: &str) {
        println!("{}: {text}", self.name);
        tracing::debug!(text, "speaking");

        if let Err(e) = self.say(text).await {
            tracing::error!(error = %e, "TTS error");
        }
    }
}
