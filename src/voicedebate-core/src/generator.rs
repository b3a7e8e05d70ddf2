//! Opponent argument generation.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::participant::{Participants, Speaker, Topic};
use crate::transcript::TranscriptEntry;

/// Said when no better rebuttal is available.
pub const FALLBACK_REBUTTAL: &str = "I hear your point, but I remain unconvinced. The evidence still supports my position, and I'd ask you to address its strongest form.";

/// What the generator gets to see when the opponent takes a turn.
#[derive(Debug, Clone)]
pub struct DebateContext {
    pub topic: Topic,
    pub participants: Participants,
    /// Number of opponent utterances delivered so far.
    pub opponent_turns: usize,
    pub history: Vec<TranscriptEntry>,
}

impl DebateContext {
    pub fn last_human_line(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|e| e.speaker == Speaker::Human)
            .map(|e| e.text.as_str())
    }
}

/// Produces the opponent's next argument. Never fails and never returns
/// empty text.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn next(&self, context: &DebateContext) -> String;
}

/// Cycles through a fixed list of counter-positions.
#[derive(Debug)]
pub struct RotatingRebuttals {
    rebuttals: Vec<String>,
    cursor: AtomicUsize,
}

impl RotatingRebuttals {
    pub fn new(rebuttals: Vec<String>) -> Self {
        let rebuttals = rebuttals
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .collect();
        Self {
            rebuttals,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn pick(&self) -> String {
        if self.rebuttals.is_empty() {
            return FALLBACK_REBUTTAL.to_string();
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.rebuttals.len();
        self.rebuttals[index].clone()
    }
}

#[async_trait]
impl ResponseGenerator for RotatingRebuttals {
    async fn next(&self, _context: &DebateContext) -> String {
        self.pick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Participant;
    use chrono::Utc;

    fn context(history: Vec<TranscriptEntry>) -> DebateContext {
        DebateContext {
            topic: Topic {
                title: "Ban it?".to_string(),
                category: "Tech".to_string(),
                description: None,
            },
            participants: Participants {
                human: Participant::new("h", "Human"),
                opponent: Participant::new("o", "Bot"),
            },
            opponent_turns: 0,
            history,
        }
    }

    #[tokio::test]
    async fn test_round_robin() {
        let generator = RotatingRebuttals::new(vec!["a".into(), "b".into()]);
        let ctx = context(vec![]);
        assert_eq!(generator.next(&ctx).await, "a");
        assert_eq!(generator.next(&ctx).await, "b");
        assert_eq!(generator.next(&ctx).await, "a");
    }

    #[tokio::test]
    async fn test_empty_rotation_falls_back() {
        let generator = RotatingRebuttals::new(vec!["  ".into()]);
        assert_eq!(generator.next(&context(vec![])).await, FALLBACK_REBUTTAL);
    }

    #[test]
    fn test_last_human_line() {
        let entry = |sequence, speaker, text: &str| TranscriptEntry {
            sequence,
            speaker,
            text: text.to_string(),
            recorded_at: Utc::now(),
        };
        let ctx = context(vec![
            entry(1, Speaker::Human, "first"),
            entry(2, Speaker::Opponent, "reply"),
            entry(3, Speaker::Human, "second"),
            entry(4, Speaker::Moderator, "note"),
        ]);
        assert_eq!(ctx.last_human_line(), Some("second"));
        assert_eq!(context(vec![]).last_human_line(), None);
    }
}
