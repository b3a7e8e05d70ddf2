//! Speech capture adapter around a speech-to-text provider.

use tracing::info;

use crate::error::CaptureError;
use crate::event::{EventSink, SessionEvent};

/// What a speech-to-text provider reports while listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Interim hypothesis; never recorded.
    Partial(String),
    /// The utterance is complete. Exactly one per utterance.
    Final(String),
    /// The provider hit an error and stopped listening.
    Failed(String),
}

/// Handed to a provider on `start` so it can report results.
#[derive(Debug, Clone)]
pub struct CaptureSink {
    sink: EventSink,
}

impl CaptureSink {
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    pub fn partial(&self, text: impl Into<String>) -> bool {
        self.emit(CaptureEvent::Partial(text.into()))
    }

    pub fn finalize(&self, text: impl Into<String>) -> bool {
        self.emit(CaptureEvent::Final(text.into()))
    }

    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.emit(CaptureEvent::Failed(message.into()))
    }

    fn emit(&self, event: CaptureEvent) -> bool {
        self.sink.send(SessionEvent::Capture(event))
    }
}

/// A live speech-to-text engine.
pub trait SpeechProvider: Send {
    fn name(&self) -> &str;

    /// Whether the host can capture speech at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Begin listening. Fails with `PermissionDenied` when the microphone is refused.
    fn start(&mut self, sink: CaptureSink) -> Result<(), CaptureError>;

    fn stop(&mut self);
}

/// Exclusive owner of the session's speech provider.
pub struct SpeechCapture {
    provider: Option<Box<dyn SpeechProvider>>,
    sink: EventSink,
    active: bool,
}

impl SpeechCapture {
    pub fn new(provider: Option<Box<dyn SpeechProvider>>, sink: EventSink) -> Self {
        Self {
            provider,
            sink,
            active: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_supported())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active {
            return Ok(());
        }
        let provider = self
            .provider
            .as_mut()
            .filter(|p| p.is_supported())
            .ok_or(CaptureError::Unsupported)?;

        provider.start(CaptureSink::new(self.sink.clone()))?;
        info!(provider = provider.name(), "speech capture started");
        self.active = true;
        Ok(())
    }

    /// Stop listening. Returns false when capture was already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.active {
            return false;
        }
        if let Some(provider) = self.provider.as_mut() {
            provider.stop();
            info!(provider = provider.name(), "speech capture stopped");
        }
        self.active = false;
        true
    }
}

impl Drop for SpeechCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMic {
        allow: bool,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl SpeechProvider for CountingMic {
        fn name(&self) -> &str {
            "counting"
        }

        fn start(&mut self, _sink: CaptureSink) -> Result<(), CaptureError> {
            if !self.allow {
                return Err(CaptureError::PermissionDenied);
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn capture(allow: bool) -> (SpeechCapture, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let (sink, _rx) = EventSink::channel();
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let mic = CountingMic {
            allow,
            starts: starts.clone(),
            stops: stops.clone(),
        };
        (SpeechCapture::new(Some(Box::new(mic)), sink), starts, stops)
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut capture, starts, stops) = capture(true);
        assert!(!capture.stop());

        capture.start().unwrap();
        capture.start().unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        assert!(capture.stop());
        assert!(!capture.stop());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_permission_denied_leaves_capture_idle() {
        let (mut capture, _, _) = capture(false);
        assert_eq!(capture.start(), Err(CaptureError::PermissionDenied));
        assert!(!capture.is_active());
    }

    #[test]
    fn test_missing_provider_is_unsupported() {
        let (sink, _rx) = EventSink::channel();
        let mut capture = SpeechCapture::new(None, sink);
        assert!(!capture.is_supported());
        assert_eq!(capture.start(), Err(CaptureError::Unsupported));
    }

    #[test]
    fn test_drop_releases_provider() {
        let (mut capture, _, stops) = capture(true);
        capture.start().unwrap();
        drop(capture);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
