//! Debate participants, speaker roles and the debate topic.

use serde::{Deserialize, Serialize};

/// Who produced a line of the transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Speaker {
    /// The automated moderator announcing and evaluating.
    Moderator,
    /// The human participant.
    Human,
    /// The automated opponent.
    Opponent,
}

impl Speaker {
    pub fn display_name(&self) -> &str {
        match self {
            Speaker::Moderator => "AI Moderator",
            Speaker::Human => "You",
            Speaker::Opponent => "AI Opponent",
        }
    }
}

/// One of the two debating sides. Feedback and scores are kept per side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Human,
    Opponent,
}

impl Side {
    pub fn display_name(&self) -> &str {
        match self {
            Side::Human => "HUMAN",
            Side::Opponent => "OPPONENT",
        }
    }
}

impl From<Side> for Speaker {
    fn from(side: Side) -> Self {
        match side {
            Side::Human => Speaker::Human,
            Side::Opponent => Speaker::Opponent,
        }
    }
}

/// A person or agent taking part in the debate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    /// Display name used in moderator announcements.
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participants {
    pub human: Participant,
    pub opponent: Participant,
}

impl Participants {
    pub fn get(&self, side: Side) -> &Participant {
        match side {
            Side::Human => &self.human,
            Side::Opponent => &self.opponent,
        }
    }
}

/// The motion being debated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_maps_to_speaker() {
        assert_eq!(Speaker::from(Side::Human), Speaker::Human);
        assert_eq!(Speaker::from(Side::Opponent), Speaker::Opponent);
    }

    #[test]
    fn test_participants_lookup() {
        let participants = Participants {
            human: Participant::new("current-user", "Ada"),
            opponent: Participant::new("opponent-id", "VoiceDebater"),
        };
        assert_eq!(participants.get(Side::Human).name, "Ada");
        assert_eq!(participants.get(Side::Opponent).id, "opponent-id");
    }
}
