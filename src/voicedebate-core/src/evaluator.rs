//! Scoring of individual contributions.

use tracing::debug;

use crate::config::{Critique, FeedbackConfig};
use crate::feedback::FeedbackEntry;
use crate::participant::Side;
use crate::policy::ScoreSampler;

/// Produces a scored critique for one utterance. Must always return.
pub trait FeedbackEvaluator: Send {
    fn evaluate(&mut self, side: Side, utterance: &str) -> FeedbackEntry;
}

/// Fixed-shape critiques scored by a [`ScoreSampler`].
pub struct RubricEvaluator {
    sampler: Box<dyn ScoreSampler>,
    critiques: FeedbackConfig,
}

impl RubricEvaluator {
    pub fn new(sampler: Box<dyn ScoreSampler>, critiques: FeedbackConfig) -> Self {
        Self { sampler, critiques }
    }

    fn critique_for(&self, side: Side) -> &Critique {
        match side {
            Side::Human => &self.critiques.human,
            Side::Opponent => &self.critiques.opponent,
        }
    }
}

impl FeedbackEvaluator for RubricEvaluator {
    fn evaluate(&mut self, side: Side, utterance: &str) -> FeedbackEntry {
        let score = self.sampler.sample(side);
        debug!(
            side = side.display_name(),
            score,
            words = utterance.split_whitespace().count(),
            "scored contribution"
        );
        FeedbackEntry::new(side, score, self.critique_for(side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FixedScores;

    #[test]
    fn test_rubric_uses_side_critique() {
        let mut evaluator = RubricEvaluator::new(
            Box::new(FixedScores {
                human: 7.2,
                opponent: 8.1,
            }),
            FeedbackConfig::default(),
        );

        let human = evaluator.evaluate(Side::Human, "Bans are necessary");
        assert_eq!(human.side, Side::Human);
        assert_eq!(human.score, 7.2);
        assert_eq!(human.summary, "Good articulation of points with clear structure.");
        assert_eq!(human.strengths.len(), 3);

        let opponent = evaluator.evaluate(Side::Opponent, "Security matters");
        assert_eq!(opponent.side, Side::Opponent);
        assert_eq!(opponent.score, 8.1);
        assert_ne!(opponent.id, human.id);
    }
}
