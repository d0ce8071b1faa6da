//! Typed input and printed output, for running without audio hardware

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Notify;

use super::{RecognitionResult, SpeechRecognizer, SpeechSynthesizer};

/// Treats each input line as one recognized utterance
///
/// A blank line is a timeout. End of input fires the `closed` notifier
/// so the caller can shut down.
pub struct ConsoleRecognizer<R = BufReader<Stdin>> {
    lines: Lines<R>,
    closed: Arc<Notify>,
    eof: bool,
}

impl ConsoleRecognizer {
    /// Read from stdin
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleRecognizer<R> {
    /// Read lines from any buffered reader
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            closed: Arc::new(Notify::new()),
            eof: false,
        }
    }

    /// Notified once input is exhausted
    #[must_use]
    pub fn closed(&self) -> Arc<Notify> {
        Arc::clone(&self.closed)
    }
}

#[async_trait(?Send)]
impl<R: AsyncBufRead + Unpin> SpeechRecognizer for ConsoleRecognizer<R> {
    async fn listen(&mut self, timeout: Duration) -> RecognitionResult {
        if self.eof {
            tokio::time::sleep(timeout).await;
            return RecognitionResult::Timeout;
        }

        // `next_line` is cancel safe, so a timeout never loses a partial line
        match tokio::time::timeout(timeout, self.lines.next_line()).await {
            Err(_) => RecognitionResult::Timeout,
            Ok(Ok(Some(line))) => match RecognitionResult::from_transcript(&line) {
                RecognitionResult::Unintelligible => RecognitionResult::Timeout,
                heard => heard,
            },
            Ok(Ok(None)) => {
                tracing::debug!("console input closed");
                self.eof = true;
                self.closed.notify_one();
                RecognitionResult::Timeout
            }
            Ok(Err(e)) => RecognitionResult::OtherError(e.to_string()),
        }
    }
}

/// Prints responses instead of speaking them
pub struct ConsoleSpeaker {
    name: String,
}

impl ConsoleSpeaker {
    /// Create a speaker that prefixes lines with the assistant name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait(?Send)]
impl SpeechSynthesizer for ConsoleSpeaker {
    async fn speak(&mut self, text: &str) {
        tracing::debug!(text, "speaking");
        println!("{}: {text}", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_become_results() {
        let input: &[u8] = b"Hey Assistant\n\nplay jazz\n";
        let mut recognizer = ConsoleRecognizer::new(BufReader::new(input));
        let timeout = Duration::from_secs(1);

        assert_eq!(
            recognizer.listen(timeout).await,
            RecognitionResult::Text("hey assistant".to_string())
        );
        assert_eq!(recognizer.listen(timeout).await, RecognitionResult::Timeout);
        assert_eq!(
            recognizer.listen(timeout).await,
            RecognitionResult::Text("play jazz".to_string())
        );
    }

    #[tokio::test]
    async fn test_eof_notifies() {
        let input: &[u8] = b"";
        let mut recognizer = ConsoleRecognizer::new(BufReader::new(input));
        let closed = recognizer.closed();

        assert_eq!(
            recognizer.listen(Duration::from_millis(10)).await,
            RecognitionResult::Timeout
        );
        // Permit was stored by notify_one, so this resolves immediately
        closed.notified().await;
    }
}
