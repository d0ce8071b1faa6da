//! Session state machine integration tests
//!
//! Drives the loop with scripted recognition results and fake services.

use std::sync::Arc;
use std::time::Duration;

use voice_dispatcher::services::Services;
use voice_dispatcher::{RecognitionResult, State};

mod common;

use common::{Calls, FakeMusic, Harness, Heard, fake_services, text};

fn service_error() -> Heard {
    Heard::Result(RecognitionResult::ServiceError("network down".to_string()))
}

fn timeout() -> Heard {
    Heard::Result(RecognitionResult::Timeout)
}

#[tokio::test]
async fn test_timeouts_change_nothing() {
    let mut h = Harness::new([timeout(), timeout(), timeout()]);

    for _ in 0..3 {
        assert_eq!(h.session.step().await, State::AwaitingWakeWord);
    }

    assert!(h.spoken().is_empty());
    assert_eq!(h.session.state().consecutive_errors, 0);
    assert_eq!(h.session.state().ungated_attempts, 0);
}

#[tokio::test]
async fn test_error_threshold_speaks_once() {
    let mut h = Harness::new(std::iter::repeat_with(service_error).take(6));
    let trouble = h.config.messages.microphone_trouble.clone();

    for _ in 0..4 {
        h.session.step().await;
    }
    assert!(h.spoken().is_empty());
    assert_eq!(h.session.state().consecutive_errors, 4);

    h.session.step().await;
    assert_eq!(h.spoken(), vec![trouble.clone()]);
    assert_eq!(h.session.state().consecutive_errors, 0);

    // The sixth failure starts a new count
    h.session.step().await;
    assert_eq!(h.spoken(), vec![trouble]);
    assert_eq!(h.session.state().consecutive_errors, 1);
    assert_eq!(h.session.state().state, State::AwaitingWakeWord);
}

#[tokio::test]
async fn test_text_resets_error_count() {
    let mut h = Harness::new([
        service_error(),
        Heard::Result(RecognitionResult::Unintelligible),
        Heard::Result(RecognitionResult::OtherError("device lost".to_string())),
        text("nice day outside"),
    ]);

    for _ in 0..3 {
        h.session.step().await;
    }
    assert_eq!(h.session.state().consecutive_errors, 3);

    h.session.step().await;
    assert_eq!(h.session.state().consecutive_errors, 0);
    assert!(h.spoken().is_empty());
}

#[tokio::test]
async fn test_wake_word_then_music_command() {
    let mut h = Harness::new([text("hey assistant"), text("play bohemian rhapsody on spotify")]);
    let listening = h.config.messages.listening.clone();

    assert_eq!(h.session.step().await, State::AwaitingCommand);
    assert_eq!(h.spoken(), vec![listening.clone()]);

    assert_eq!(h.session.step().await, State::Dispatching);
    assert_eq!(h.session.step().await, State::AwaitingWakeWord);

    assert_eq!(h.calls(), vec!["music.play bohemian rhapsody"]);
    assert_eq!(
        h.spoken(),
        vec![
            listening,
            "Playing bohemian rhapsody by Queen on Spotify".to_string()
        ]
    );

    // Short timeout for the wake word, long one for the command
    let timeouts = h.timeouts.lock().unwrap().clone();
    assert_eq!(
        timeouts,
        vec![Duration::from_millis(1), Duration::from_millis(2)]
    );
}

#[tokio::test]
async fn test_one_dispatch_per_wake_word() {
    let mut h = Harness::new([
        text("hey assistant"),
        text("next song"),
        text("next song"),
    ]);

    for _ in 0..4 {
        h.session.step().await;
    }

    // The second "next song" arrives without a wake word
    assert_eq!(h.calls(), vec!["music.next"]);
    assert_eq!(h.session.state().state, State::AwaitingWakeWord);
}

#[tokio::test]
async fn test_goodbye_shuts_down() {
    let mut h = Harness::new([text("hello assistant"), text("goodbye")]);
    let goodbye = h.config.messages.goodbye.clone();

    h.session.run(std::future::pending()).await;

    assert_eq!(h.session.state().state, State::ShuttingDown);
    let spoken = h.spoken();
    assert_eq!(spoken.first(), Some(&h.config.messages.greeting));
    assert_eq!(spoken.last(), Some(&goodbye));
    assert_eq!(spoken.iter().filter(|line| **line == goodbye).count(), 1);
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn test_command_timeout_asks_again() {
    let mut h = Harness::new([text("hey assistant"), timeout()]);

    h.session.step().await;
    assert_eq!(h.session.step().await, State::AwaitingWakeWord);

    assert_eq!(
        h.spoken(),
        vec![
            h.config.messages.listening.clone(),
            h.config.messages.didnt_catch.clone()
        ]
    );
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn test_ungated_commands_get_one_reminder() {
    let mut h = Harness::new([text("play some jazz"), text("open the calculator")]);

    h.session.step().await;
    assert_eq!(h.session.state().ungated_attempts, 1);
    assert!(h.spoken().is_empty());

    h.session.step().await;
    assert_eq!(h.spoken(), vec![h.config.messages.wake_word_reminder.clone()]);
    assert_eq!(h.session.state().ungated_attempts, 0);
    assert!(h.calls().is_empty());
}

#[tokio::test]
async fn test_small_talk_resets_ungated_count() {
    let mut h = Harness::new([
        text("play some jazz"),
        text("nice day outside"),
        text("play some jazz"),
        timeout(),
        text("play some jazz"),
    ]);

    for _ in 0..5 {
        h.session.step().await;
    }

    assert!(h.spoken().is_empty());
    assert_eq!(h.session.state().ungated_attempts, 1);
}

#[tokio::test]
async fn test_unknown_command_is_not_understood() {
    let mut h = Harness::new([text("hey assistant"), text("xyzzy plugh")]);

    for _ in 0..3 {
        h.session.step().await;
    }

    assert_eq!(
        h.spoken().last(),
        Some(&h.config.messages.not_understood)
    );
    assert_eq!(h.session.state().state, State::AwaitingWakeWord);
}

#[tokio::test]
async fn test_handler_failure_keeps_running() {
    let calls = Calls::default();
    let services = Services {
        music: Some(Box::new(FakeMusic {
            calls: Arc::clone(&calls),
            outcome: None,
            fail: true,
        })),
        ..fake_services(&calls)
    };
    let mut h = Harness::with_services(
        [text("hey assistant"), text("pause music")],
        services,
        calls,
    );

    for _ in 0..3 {
        h.session.step().await;
    }

    assert_eq!(h.calls(), vec!["music.pause"]);
    assert_eq!(h.spoken().last(), Some(&h.config.messages.error_occurred));
    assert_eq!(h.session.state().state, State::AwaitingWakeWord);
}

#[tokio::test]
async fn test_interrupt_says_goodbye_once() {
    let mut h = Harness::new([text("hey assistant")]);

    h.session.run(std::future::ready(())).await;

    assert_eq!(h.session.state().state, State::ShuttingDown);
    assert_eq!(
        h.spoken(),
        vec![
            h.config.messages.greeting.clone(),
            h.config.messages.goodbye.clone()
        ]
    );
}

#[tokio::test]
async fn test_panic_in_step_recovers() {
    let mut h = Harness::new([text("hey assistant"), Heard::Panic, text("hey assistant")]);
    let exhausted = Arc::clone(&h.exhausted);

    h.session.run(async move { exhausted.notified().await }).await;

    let messages = &h.config.messages;
    assert_eq!(h.session.state().state, State::ShuttingDown);
    assert_eq!(
        h.spoken(),
        vec![
            messages.greeting.clone(),
            messages.listening.clone(),
            // After the failure the loop is back to waiting for a wake word
            messages.listening.clone(),
            messages.didnt_catch.clone(),
            messages.goodbye.clone(),
        ]
    );
}
