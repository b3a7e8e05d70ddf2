//! Injectable chance policies: whether the moderator comments on a human
//! utterance, and what score a contribution receives.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::participant::Side;

/// Decides whether a finished human utterance draws moderator commentary.
pub trait CommentaryPolicy: Send {
    fn should_comment(&mut self) -> bool;
}

/// Comments with a fixed probability.
pub struct RandomCommentary {
    probability: f64,
    rng: StdRng,
}

impl RandomCommentary {
    pub fn new(probability: f64) -> Self {
        Self::with_rng(probability, StdRng::from_entropy())
    }

    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self::with_rng(probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(probability: f64, rng: StdRng) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng,
        }
    }
}

impl CommentaryPolicy for RandomCommentary {
    fn should_comment(&mut self) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

/// Always or never comments.
#[derive(Debug, Clone, Copy)]
pub struct FixedCommentary(pub bool);

impl CommentaryPolicy for FixedCommentary {
    fn should_comment(&mut self) -> bool {
        self.0
    }
}

/// Picks the score given to a contribution.
pub trait ScoreSampler: Send {
    fn sample(&mut self, side: Side) -> f64;
}

/// Half-open score interval `[min, max)`. A range with `min == max` always
/// yields `min`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn fixed(score: f64) -> Self {
        Self::new(score, score)
    }

    pub fn is_valid(&self) -> bool {
        0.0 <= self.min && self.min <= self.max && self.max <= 10.0
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Draws scores uniformly from a per-side range.
pub struct RangeSampler {
    human: ScoreRange,
    opponent: ScoreRange,
    rng: StdRng,
}

impl RangeSampler {
    pub fn new(human: ScoreRange, opponent: ScoreRange) -> Self {
        Self {
            human,
            opponent,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(human: ScoreRange, opponent: ScoreRange, seed: u64) -> Self {
        Self {
            human,
            opponent,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ScoreSampler for RangeSampler {
    fn sample(&mut self, side: Side) -> f64 {
        match side {
            Side::Human => self.human.sample(&mut self.rng),
            Side::Opponent => self.opponent.sample(&mut self.rng),
        }
    }
}

/// Same score every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedScores {
    pub human: f64,
    pub opponent: f64,
}

impl ScoreSampler for FixedScores {
    fn sample(&mut self, side: Side) -> f64 {
        match side {
            Side::Human => self.human,
            Side::Opponent => self.opponent,
        }
    }
}
