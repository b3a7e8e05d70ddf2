//! Feedback accumulation and final scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Critique;
use crate::participant::Side;

/// A scored critique of one contribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub side: Side,
    /// Always within [0, 10].
    pub score: f64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn new(side: Side, score: f64, critique: &Critique) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            score: clamp_score(score),
            summary: critique.summary.clone(),
            strengths: critique.strengths.clone(),
            improvements: critique.improvements.clone(),
            timestamp: Utc::now(),
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Means reported for a side that collected no feedback at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FallbackScores {
    pub human: f64,
    pub opponent: f64,
}

impl Default for FallbackScores {
    fn default() -> Self {
        Self {
            human: 7.8,
            opponent: 7.6,
        }
    }
}

impl FallbackScores {
    pub fn for_side(&self, side: Side) -> f64 {
        match side {
            Side::Human => self.human,
            Side::Opponent => self.opponent,
        }
    }
}

/// Accumulated feedback for both sides.
#[derive(Debug, Default)]
pub struct FeedbackLedger {
    entries: Vec<FeedbackEntry>,
    fallback: FallbackScores,
}

impl FeedbackLedger {
    pub fn new(fallback: FallbackScores) -> Self {
        Self {
            entries: Vec::new(),
            fallback,
        }
    }

    pub fn record(&mut self, entry: FeedbackEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[FeedbackEntry] {
        &self.entries
    }

    pub fn entries_for(&self, side: Side) -> impl Iterator<Item = &FeedbackEntry> {
        self.entries.iter().filter(move |e| e.side == side)
    }

    pub fn count_for(&self, side: Side) -> usize {
        self.entries_for(side).count()
    }

    /// Mean score for `side` rounded to one decimal, or the fallback when the
    /// side has no entries.
    pub fn mean_score_for(&self, side: Side) -> f64 {
        let (sum, count) = self
            .entries_for(side)
            .fold((0.0, 0usize), |(sum, count), e| (sum + e.score, count + 1));

        if count == 0 {
            return round_to_tenth(self.fallback.for_side(side));
        }
        round_to_tenth(sum / count as f64)
    }
}

/// Outcome of a finished debate. Computed once and never changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalResult {
    pub session_id: Uuid,
    pub topic: String,
    pub human_score: f64,
    pub opponent_score: f64,
    pub winner: Side,
    pub human_feedback_count: usize,
    pub opponent_feedback_count: usize,
    pub completed_at: DateTime<Utc>,
}

impl FinalResult {
    pub fn from_ledger(session_id: Uuid, topic: impl Into<String>, ledger: &FeedbackLedger) -> Self {
        let human_score = ledger.mean_score_for(Side::Human);
        let opponent_score = ledger.mean_score_for(Side::Opponent);

        Self {
            session_id,
            topic: topic.into(),
            human_score,
            opponent_score,
            winner: decide_winner(human_score, opponent_score),
            human_feedback_count: ledger.count_for(Side::Human),
            opponent_feedback_count: ledger.count_for(Side::Opponent),
            completed_at: Utc::now(),
        }
    }
}

/// The opponent wins only with a strictly higher score; ties go to the human.
pub fn decide_winner(human_score: f64, opponent_score: f64) -> Side {
    if opponent_score > human_score {
        Side::Opponent
    } else {
        Side::Human
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn critique() -> Critique {
        Critique {
            summary: "ok".to_string(),
            strengths: vec![],
            improvements: vec![],
        }
    }

    fn ledger_with(scores: &[(Side, f64)]) -> FeedbackLedger {
        let mut ledger = FeedbackLedger::new(FallbackScores::default());
        for &(side, score) in scores {
            ledger.record(FeedbackEntry::new(side, score, &critique()));
        }
        ledger
    }

    #[test]
    fn test_fallback_when_empty() {
        let ledger = ledger_with(&[]);
        assert_eq!(ledger.mean_score_for(Side::Human), 7.8);
        assert_eq!(ledger.mean_score_for(Side::Opponent), 7.6);
    }

    #[test]
    fn test_fallback_applies_per_side() {
        let ledger = ledger_with(&[(Side::Opponent, 8.4)]);
        assert_eq!(ledger.mean_score_for(Side::Human), 7.8);
        assert_eq!(ledger.mean_score_for(Side::Opponent), 8.4);
    }

    #[test]
    fn test_mean_rounds_to_one_decimal() {
        let ledger = ledger_with(&[
            (Side::Opponent, 7.0),
            (Side::Opponent, 8.0),
            (Side::Opponent, 8.25),
        ]);
        // 23.25 / 3 = 7.75
        assert_eq!(ledger.mean_score_for(Side::Opponent), 7.8);
    }

    #[test]
    fn test_scores_clamped_to_domain() {
        let ledger = ledger_with(&[(Side::Human, 12.0), (Side::Opponent, -3.0)]);
        assert_eq!(ledger.entries()[0].score, 10.0);
        assert_eq!(ledger.entries()[1].score, 0.0);
    }

    #[test]
    fn test_tie_goes_to_human() {
        assert_eq!(decide_winner(7.5, 7.5), Side::Human);
        assert_eq!(decide_winner(7.4, 7.5), Side::Opponent);
        assert_eq!(decide_winner(8.0, 7.9), Side::Human);
    }

    #[test]
    fn test_final_result_from_ledger() {
        let ledger = ledger_with(&[
            (Side::Human, 7.2),
            (Side::Opponent, 7.6),
            (Side::Opponent, 7.4),
        ]);
        let result = FinalResult::from_ledger(Uuid::new_v4(), "Topic", &ledger);

        assert_eq!(result.human_score, 7.2);
        assert_eq!(result.opponent_score, 7.5);
        assert_eq!(result.winner, Side::Opponent);
        assert_eq!(result.human_feedback_count, 1);
        assert_eq!(result.opponent_feedback_count, 2);
    }

    #[test]
    fn test_equal_rounded_scores_tie_to_human() {
        // 7.84 and 7.76 both round to 7.8
        let ledger = ledger_with(&[(Side::Human, 7.76), (Side::Opponent, 7.84)]);
        let result = FinalResult::from_ledger(Uuid::new_v4(), "Topic", &ledger);
        assert_eq!(result.human_score, result.opponent_score);
        assert_eq!(result.winner, Side::Human);
    }
}
