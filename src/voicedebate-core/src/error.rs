//! Error types for the debate session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Transcript entries must carry non-empty text")]
    InvalidEntry,

    #[error("Microphone access was denied")]
    PermissionDenied,

    #[error("Speech capture failed: {0}")]
    CaptureFailure(String),

    #[error("Speech capture is not available on this host")]
    UnsupportedEnvironment,

    #[error("The debate is not active")]
    NotActive,

    #[error("The session has been torn down")]
    Closed,

    #[error("OpenAI API error: {0}")]
    OpenAIError(#[from] async_openai::error::OpenAIError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Failures raised by a speech-to-text provider when capture is requested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no speech capture provider is available")]
    Unsupported,

    #[error("provider error: {0}")]
    Provider(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("playback failed: {0}")]
    Playback(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("result rejected: {0}")]
    Rejected(String),
}

/// Recoverable problems surfaced to the participant without ending the debate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionWarning {
    #[error("Microphone access denied. Allow microphone access to take part in the debate.")]
    PermissionDenied,

    #[error("Speech recognition error: {0}")]
    CaptureFailure(String),

    #[error("Speech recognition is not supported here; you can follow the debate but not speak.")]
    UnsupportedEnvironment,

    #[error("Speech generation error: {0}")]
    VoiceFailure(String),

    #[error("The debate result could not be saved: {0}")]
    ReportingFailure(String),
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => SessionError::PermissionDenied,
            CaptureError::Unsupported => SessionError::UnsupportedEnvironment,
            CaptureError::Provider(msg) => SessionError::CaptureFailure(msg),
        }
    }
}
