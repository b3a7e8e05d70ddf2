//! Append-only debate transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::participant::Speaker;

/// One attributed line of the debate. Never changed once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Position in the log, starting at 1 with no gaps.
    pub sequence: u64,
    pub speaker: Speaker,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and assign it the next sequence number.
    pub fn append(
        &mut self,
        speaker: Speaker,
        text: impl Into<String>,
    ) -> Result<&TranscriptEntry, SessionError> {
        let text = text.into();
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidEntry);
        }

        let sequence = self.entries.last().map_or(1, |e| e.sequence + 1);
        self.entries.push(TranscriptEntry {
            sequence,
            speaker,
            text: text.to_string(),
            recorded_at: Utc::now(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Every entry in append order.
    pub fn all(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Most recent line spoken by `speaker`.
    pub fn last_from(&self, speaker: Speaker) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(|e| e.speaker == speaker)
    }

    pub fn count_from(&self, speaker: Speaker) -> usize {
        self.entries.iter().filter(|e| e.speaker == speaker).count()
    }
}
