//! Speech-to-text over the microphone

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::activity::SpeechSegmenter;
use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::{RecognitionResult, SpeechRecognizer};
use crate::config::Config;
use crate::{Error, Result};

/// How often the capture buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Response from `OpenAI` Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug)]
enum SttProvider {
    Whisper,
    Deepgram,
}

/// Transcribes WAV audio through a hosted STT API
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Pick a provider from configured keys: Deepgram if set, else Whisper
    ///
    /// # Errors
    ///
    /// Returns error if neither key is configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.request_timeout;
        if let Some(key) = &config.api_keys.deepgram {
            return Self::new_deepgram(key.clone(), "nova-2".to_string(), timeout);
        }
        match &config.api_keys.openai {
            Some(key) => Self::new_whisper(key.clone(), config.voice.stt_model.clone(), timeout),
            None => Err(Error::Config(
                "OPENAI_API_KEY or DEEPGRAM_API_KEY required for speech recognition".to_string(),
            )),
        }
    }

    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the client cannot be built
    pub fn new_whisper(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Self::new(api_key, model, timeout, SttProvider::Whisper)
    }

    /// Create a new STT instance using Deepgram
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the client cannot be built
    pub fn new_deepgram(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        Self::new(api_key, model, timeout, SttProvider::Deepgram)
    }

    fn new(api_key: String, model: String, timeout: Duration, provider: SttProvider) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!("{provider:?} API key is empty")));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            provider,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure and [`Error::Stt`] when
    /// the API rejects the request
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        match self.provider {
            SttProvider::Whisper => self.transcribe_whisper(audio).await,
            SttProvider::Deepgram => self.transcribe_deepgram(audio).await,
        }
    }

    async fn transcribe_whisper(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        Ok(result.text)
    }

    async fn transcribe_deepgram(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Deepgram transcription");

        let response = self
            .client
            .post("https://api.deepgram.com/v1/listen")
            .query(&[("model", self.model.as_str()), ("punctuate", "true")])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await?;
        Ok(result
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default())
    }
}

/// Listens on the microphone and transcribes each utterance
pub struct MicrophoneRecognizer {
    capture: AudioCapture,
    stt: SpeechToText,
    phrase_time_limit: Duration,
}

impl MicrophoneRecognizer {
    /// Acquire the microphone and STT client
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or no STT key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut capture = AudioCapture::open(config.listening.input_device.as_deref())?;
        capture.start()?;

        Ok(Self {
            capture,
            stt: SpeechToText::from_config(config)?,
            phrase_time_limit: config.listening.phrase_time_limit,
        })
    }

    /// Wait for one utterance; `None` if speech never started before `timeout`
    async fn capture_utterance(&mut self, timeout: Duration) -> Option<Vec<f32>> {
        // Drop anything heard while we were speaking or dispatching
        self.capture.clear_buffer();

        let mut segmenter = SpeechSegmenter::new();
        let started = Instant::now();
        let phrase_limit = duration_to_samples(self.phrase_time_limit);

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let samples = self.capture.take_buffer();
            if segmenter.process(&samples) {
                return Some(segmenter.take_speech());
            }

            if segmenter.is_speaking() {
                if segmenter.buffered_samples() >= phrase_limit {
                    tracing::debug!("phrase time limit reached");
                    return Some(segmenter.take_speech());
                }
            } else if started.elapsed() >= timeout {
                return None;
            }
        }
    }
}

#[async_trait(?Send)]
impl SpeechRecognizer for MicrophoneRecognizer {
    async fn listen(&mut self, timeout: Duration) -> RecognitionResult {
        let Some(speech) = self.capture_utterance(timeout).await else {
            tracing::trace!(?timeout, "listen timed out");
            return RecognitionResult::Timeout;
        };

        let wav = match samples_to_wav(&speech, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode utterance");
                return RecognitionResult::OtherError(e.to_string());
            }
        };

        match self.stt.transcribe(&wav).await {
            Ok(transcript) => {
                let result = RecognitionResult::from_transcript(&transcript);
                match &result {
                    RecognitionResult::Text(text) => tracing::info!(text, "speech recognized"),
                    _ => tracing::info!("could not understand audio"),
                }
                result
            }
            Err(e @ (Error::Http(_) | Error::Stt(_))) => {
                tracing::error!(error = %e, "speech recognition service error");
                RecognitionResult::ServiceError(e.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "listening error");
                RecognitionResult::OtherError(e.to_string())
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_to_samples(duration: Duration) -> usize {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_to_samples() {
        assert_eq!(duration_to_samples(Duration::from_secs(1)), 16000);
        assert_eq!(duration_to_samples(Duration::from_millis(500)), 8000);
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = SpeechToText::new_whisper(
            String::new(),
            "whisper-1".to_string(),
            Duration::from_secs(10),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
