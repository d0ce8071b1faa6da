//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;
use std::time::Duration;

use tokio::io::BufReader;
use voice_dispatcher::voice::{
    ConsoleRecognizer, SAMPLE_RATE, SegmenterState, SpeechSegmenter, samples_to_wav,
};
use voice_dispatcher::{RecognitionResult, SpeechRecognizer, WakeWordGate};

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

fn gate() -> WakeWordGate {
    WakeWordGate::new(vec![
        "hey assistant".to_string(),
        "hello assistant".to_string(),
    ])
    .unwrap()
}

#[test]
fn test_wake_word_normalization() {
    let gate = WakeWordGate::new(vec![
        "  Hey ASSISTANT  ".to_string(),
        String::new(),
        "LUCKY".to_string(),
    ])
    .unwrap();

    assert_eq!(gate.wake_words(), &["hey assistant", "lucky"]);
}

#[test]
fn test_wake_word_requires_a_phrase() {
    assert!(WakeWordGate::new(vec!["   ".to_string()]).is_err());
}

#[test]
fn test_wake_word_substring_any_case() {
    let gate = gate();

    assert!(gate.contains_wake_word("HEY ASSISTANT play jazz"));
    assert!(gate.contains_wake_word("oh, hello assistant!"));
    assert!(gate.contains_wake_word("HeY aSsIsTaNt"));
    assert!(!gate.contains_wake_word("hey there"));
    assert!(!gate.contains_wake_word(""));
}

#[test]
fn test_gate_stays_shut_for_failures() {
    let gate = gate();

    assert!(!gate.is_open(&RecognitionResult::Timeout));
    assert!(!gate.is_open(&RecognitionResult::Unintelligible));
    assert!(!gate.is_open(&RecognitionResult::ServiceError(
        "hey assistant".to_string()
    )));
    assert!(gate.is_open(&RecognitionResult::Text("hey assistant".to_string())));
}

#[test]
fn test_literal_timeout_is_just_text() {
    let result = RecognitionResult::from_transcript("  Timeout  ");
    assert_eq!(result, RecognitionResult::Text("timeout".to_string()));
    assert!(!result.is_failure());
}

#[test]
fn test_speech_segmentation() {
    let mut segmenter = SpeechSegmenter::new();

    // Silent samples - should not trigger
    let silence = generate_silence(0.1);
    assert!(!segmenter.process(&silence));
    assert_eq!(segmenter.state(), SegmenterState::Idle);

    // Loud samples - should start an utterance
    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    segmenter.process(&speech);
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    let more_speech = generate_sine_samples(440.0, 0.3, 0.3);
    assert!(!segmenter.process(&more_speech));

    // Trailing silence completes the utterance
    let silence = generate_silence(0.6);
    assert!(segmenter.process(&silence));

    let utterance = segmenter.take_speech();
    assert_eq!(
        utterance.len(),
        speech.len() + more_speech.len() + silence.len()
    );
    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered_samples(), 0);
}

#[test]
fn test_short_noise_is_discarded() {
    let mut segmenter = SpeechSegmenter::new();

    // A 50ms click followed by a long pause never becomes an utterance
    segmenter.process(&generate_sine_samples(440.0, 0.05, 0.3));
    assert!(segmenter.is_speaking());

    assert!(!segmenter.process(&generate_silence(0.6)));
    assert!(!segmenter.process(&generate_silence(0.6)));
    assert!(!segmenter.is_speaking());
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(reader.samples::<i16>().count(), samples.len());
}

#[tokio::test]
async fn test_console_recognizer_script() {
    let input: &[u8] = b"Hey Assistant\n   \nWhat time is it\n";
    let mut recognizer = ConsoleRecognizer::new(BufReader::new(input));
    let closed = recognizer.closed();
    let timeout = Duration::from_secs(1);

    assert_eq!(
        recognizer.listen(timeout).await,
        RecognitionResult::Text("hey assistant".to_string())
    );
    assert_eq!(recognizer.listen(timeout).await, RecognitionResult::Timeout);
    assert_eq!(
        recognizer.listen(timeout).await,
        RecognitionResult::Text("what time is it".to_string())
    );

    // End of input is a timeout plus a close notification
    assert_eq!(recognizer.listen(timeout).await, RecognitionResult::Timeout);
    closed.notified().await;
}
