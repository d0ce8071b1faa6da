//! Speech activity segmentation
//!
//! Energy-based endpointing: finds where an utterance starts and where
//! it ends in a stream of 16kHz samples.

use super::capture::calculate_rms;

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to count as an utterance (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Silence duration that ends an utterance (0.5s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Speech onset seen, accumulating
    Speaking,
}

/// Splits an audio stream into utterances
#[derive(Debug)]
pub struct SpeechSegmenter {
    state: SegmenterState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for SpeechSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSegmenter {
    /// Create an idle segmenter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmenterState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed samples; returns true once an utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() {
            return false;
        }

        let energy = calculate_rms(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech onset");
                }
                false
            }
            SegmenterState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                let voiced = self.speech_buffer.len().saturating_sub(self.silence_counter);
                if self.silence_counter > SILENCE_SAMPLES && voiced > MIN_SPEECH_SAMPLES {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    return true;
                }

                // Too much silence without enough speech: a click, not a phrase
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("false onset, resetting");
                    self.reset();
                }

                false
            }
        }
    }

    /// Whether speech has started and not yet been taken
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state == SegmenterState::Speaking
    }

    /// Number of samples accumulated for the current utterance
    #[must_use]
    pub fn buffered_samples(&self) -> usize {
        self.speech_buffer.len()
    }

    /// Take the utterance, returning to idle
    pub fn take_speech(&mut self) -> Vec<f32> {
        let speech = std::mem::take(&mut self.speech_buffer);
        self.reset();
        speech
    }

    /// Reset to idle
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }
}
