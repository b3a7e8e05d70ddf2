//! VoiceDebate Core Library
//!
//! Runs a timed spoken debate between a human participant and an automated
//! opponent, with an automated moderator keeping the transcript, scoring
//! both sides and announcing the result.

pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod feedback;
pub mod generator;
pub mod llm;
pub mod participant;
pub mod policy;
pub mod reporter;
pub mod scheduler;
pub mod session;
pub mod transcript;
pub mod voice;

pub use capture::{CaptureEvent, CaptureSink, SpeechProvider};
pub use clock::{format_clock, is_low_time};
pub use config::{Config, LlmConfig, default_config};
pub use error::{CaptureError, ReportError, SessionError, SessionWarning, VoiceError};
pub use evaluator::{FeedbackEvaluator, RubricEvaluator};
pub use event::{SessionSignal, SignalCallback};
pub use feedback::{FeedbackEntry, FinalResult};
pub use generator::{DebateContext, ResponseGenerator, RotatingRebuttals};
pub use llm::{LlmEndpoint, LlmResponseGenerator};
pub use participant::{Participant, Participants, Side, Speaker, Topic};
pub use policy::{CommentaryPolicy, FixedCommentary, FixedScores, ScoreSampler};
pub use reporter::{JsonFileReporter, LogReporter, ResultReporter};
pub use session::{
    EndReason, Floor, Phase, SessionBuilder, SessionController, SessionHandle, TurnState,
};
pub use transcript::{TranscriptEntry, TranscriptLog};
pub use voice::{PacedVoice, VoiceBackend};
