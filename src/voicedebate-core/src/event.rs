//! Events flowing into a session and signals flowing out of it.

use tokio::sync::mpsc;

use crate::capture::CaptureEvent;
use crate::error::SessionWarning;
use crate::feedback::{FeedbackEntry, FinalResult};
use crate::session::{Phase, TurnState};
use crate::transcript::TranscriptEntry;
use crate::voice::VoiceEvent;

/// Everything the session controller reacts to, processed one at a time.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The participant asked to take the floor.
    StartCapture,
    /// The participant released the floor.
    StopCapture,
    /// The participant confirmed ending the debate now.
    EndRequested,
    /// The session is being abandoned.
    Teardown,
    Capture(CaptureEvent),
    Voice(VoiceEvent),
    /// A delayed or background task finished. `epoch` ties it to the
    /// scheduler generation that created it.
    Scheduled { epoch: u64, task: ScheduledTask },
}

/// Work the controller deferred to later.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    OpeningStatement,
    /// Moderator remark on the given human utterance.
    Commentary { utterance: String },
    OpponentReply,
    /// The response generator produced the opponent's next argument.
    OpponentArgument { text: String },
    Evaluate,
    ResultReady,
}

/// Sending half of a session's event queue.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns false once the session has gone away.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Notifications published by the session for whoever presents it.
#[derive(Debug, Clone)]
pub enum SessionSignal {
    PhaseChanged(Phase),
    Tick { remaining: u32 },
    Transcript(TranscriptEntry),
    Feedback(FeedbackEntry),
    Turn(TurnState),
    Warning(SessionWarning),
    /// Emitted exactly once per session.
    ResultReady(FinalResult),
}

/// Callback for session signals.
pub type SignalCallback = Box<dyn Fn(SessionSignal) + Send + Sync>;
