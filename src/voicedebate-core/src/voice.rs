//! Voice output for the automated opponent.
//!
//! [`VoiceOutput`] owns the single utterance that may be playing and turns
//! the backend's work into lifecycle events on the session queue. Calling
//! `speak` is the "started" edge; afterwards the utterance ends either with a
//! [`VoiceEvent`] from the backend task or with `interrupt`, never both.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::VoiceConfig;
use crate::error::VoiceError;
use crate::event::{EventSink, SessionEvent};

/// Identifies one rendered utterance.
pub type UtteranceId = u64;

/// How a rendered utterance ended on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Completed(UtteranceId),
    Failed {
        utterance: UtteranceId,
        message: String,
    },
}

/// A text-to-speech engine.
#[async_trait]
pub trait VoiceBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Speak `text`, returning once playback has finished.
    async fn render(&self, text: &str) -> Result<(), VoiceError>;
}

/// Speaks in real time without producing audio, pacing each chunk by its
/// word count.
#[derive(Debug, Clone)]
pub struct PacedVoice {
    words_per_minute: u32,
    chunk_chars: usize,
    chunk_pause: Duration,
}

impl PacedVoice {
    pub fn new(words_per_minute: u32, chunk_chars: usize, chunk_pause: Duration) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            chunk_chars: chunk_chars.max(1),
            chunk_pause,
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(
            config.words_per_minute,
            config.chunk_chars,
            Duration::from_millis(config.chunk_pause_ms),
        )
    }

    /// Time it takes to say `text` at the configured rate.
    pub fn speaking_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / u64::from(self.words_per_minute))
    }
}

impl Default for PacedVoice {
    fn default() -> Self {
        Self::from_config(&VoiceConfig::default())
    }
}

#[async_trait]
impl VoiceBackend for PacedVoice {
    fn name(&self) -> &str {
        "paced"
    }

    async fn render(&self, text: &str) -> Result<(), VoiceError> {
        let chunks = split_into_chunks(text, self.chunk_chars);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            tokio::time::sleep(self.speaking_time(chunk)).await;
            // Pause between chunks so sentences don't run together.
            if i < last {
                tokio::time::sleep(self.chunk_pause).await;
            }
        }
        Ok(())
    }
}

struct Playing {
    id: UtteranceId,
    cancel: CancellationToken,
}

/// Exclusive owner of the session's voice backend.
pub struct VoiceOutput {
    backend: Arc<dyn VoiceBackend>,
    sink: EventSink,
    current: Option<Playing>,
    next_id: UtteranceId,
}

impl VoiceOutput {
    pub fn new(backend: Arc<dyn VoiceBackend>, sink: EventSink) -> Self {
        Self {
            backend,
            sink,
            current: None,
            next_id: 1,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<UtteranceId> {
        self.current.as_ref().map(|p| p.id)
    }

    /// Start rendering `text`. Any utterance still playing is cut off first.
    pub fn speak(&mut self, text: &str) -> UtteranceId {
        if let Some(previous) = self.interrupt() {
            debug!(utterance = previous, "superseded by a new utterance");
        }

        let id = self.next_id;
        self.next_id += 1;
        let cancel = CancellationToken::new();

        let backend = Arc::clone(&self.backend);
        let sink = self.sink.clone();
        let token = cancel.clone();
        let text = text.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                outcome = backend.render(&text) => {
                    let event = match outcome {
                        Ok(()) => VoiceEvent::Completed(id),
                        Err(e) => VoiceEvent::Failed { utterance: id, message: e.to_string() },
                    };
                    sink.send(SessionEvent::Voice(event));
                }
            }
        });

        info!(utterance = id, backend = self.backend.name(), "voice output started");
        self.current = Some(Playing { id, cancel });
        id
    }

    /// Halt the current utterance, returning its id. No-op when idle.
    pub fn interrupt(&mut self) -> Option<UtteranceId> {
        let playing = self.current.take()?;
        playing.cancel.cancel();
        info!(utterance = playing.id, "voice output interrupted");
        Some(playing.id)
    }

    /// Acknowledge that `id` ended on its own. Returns false for an
    /// utterance that is no longer current.
    pub fn settle(&mut self, id: UtteranceId) -> bool {
        match self.current {
            Some(ref playing) if playing.id == id => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for VoiceOutput {
    fn drop(&mut self) {
        self.interrupt();
    }
}

/// Split text into chunks of at most `max_chars`, breaking on sentence ends
/// and then on commas.
fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current_chunk = String::new();

    for sentence in text.split_inclusive(&['.', '!', '?', ';'][..]) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        if current_chunk.len() + sentence.len() > max_chars {
            if !current_chunk.is_empty() {
                chunks.push(current_chunk.trim().to_string());
                current_chunk.clear();
            }

            if sentence.len() > max_chars {
                for part in sentence.split_inclusive(',') {
                    if current_chunk.len() + part.len() > max_chars && !current_chunk.is_empty() {
                        chunks.push(current_chunk.trim().to_string());
                        current_chunk.clear();
                    }
                    current_chunk.push_str(part);
                    current_chunk.push(' ');
                }
                continue;
            }
        }

        current_chunk.push_str(sentence);
        current_chunk.push(' ');
    }

    if !current_chunk.trim().is_empty() {
        chunks.push(current_chunk.trim().to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_split_into_chunks() {
        let text = "Hello world. This is a test. Another sentence here.";
        let chunks = split_into_chunks(text, 30);
        assert_eq!(
            chunks,
            vec!["Hello world. This is a test.", "Another sentence here."]
        );
    }

    #[test]
    fn test_split_long_sentence_on_commas() {
        let text = "First clause here, second clause here, third clause here.";
        let chunks = split_into_chunks(text, 25);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks.join(" ").split_whitespace().count(), 9);
    }

    #[test]
    fn test_speaking_time() {
        let voice = PacedVoice::new(120, 200, Duration::ZERO);
        assert_eq!(voice.speaking_time("one two three four"), Duration::from_secs(2));
        assert_eq!(voice.speaking_time(""), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paced_render_takes_speaking_time() {
        let voice = PacedVoice::new(60, 200, Duration::from_millis(500));
        let started = Instant::now();
        voice.render("One two. Three four five.").await.unwrap();
        // 5 words at 60 wpm, chunked as one piece under 200 chars
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_reported_once() {
        let (sink, mut rx) = EventSink::channel();
        let mut output = VoiceOutput::new(Arc::new(PacedVoice::default()), sink);

        let id = output.speak("Short reply.");
        assert!(output.is_speaking());

        match rx.recv().await {
            Some(SessionEvent::Voice(VoiceEvent::Completed(done))) => assert_eq!(done, id),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(output.settle(id));
        assert!(!output.is_speaking());
        assert!(!output.settle(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_suppresses_completion() {
        let (sink, mut rx) = EventSink::channel();
        let mut output = VoiceOutput::new(Arc::new(PacedVoice::default()), sink);

        let id = output.speak("A fairly long statement that takes several seconds to say aloud.");
        assert_eq!(output.interrupt(), Some(id));
        assert_eq!(output.interrupt(), None);

        let nothing = tokio::time::timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_utterance_supersedes_previous() {
        let (sink, mut rx) = EventSink::channel();
        let mut output = VoiceOutput::new(Arc::new(PacedVoice::default()), sink);

        let first = output.speak("The first statement is rather long and keeps going for a while.");
        let second = output.speak("Second.");
        assert_ne!(first, second);
        assert_eq!(output.current(), Some(second));

        match rx.recv().await {
            Some(SessionEvent::Voice(VoiceEvent::Completed(done))) => assert_eq!(done, second),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
