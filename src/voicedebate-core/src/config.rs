//! Configuration module for loading TOML config files.
//!
//! Every section is optional; anything left out falls back to the values in
//! [`default_config`].

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::SessionError;
use crate::feedback::FallbackScores;
use crate::participant::{Participant, Participants, Topic};
use crate::policy::ScoreRange;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionTiming,
    pub scoring: ScoringConfig,
    pub topic: TopicConfig,
    pub participants: ParticipantsConfig,
    pub opponent: OpponentConfig,
    pub moderator: ModeratorConfig,
    pub feedback: FeedbackConfig,
    pub voice: VoiceConfig,
    pub llm: Option<LlmConfig>,
}

/// Debate length and the fixed pauses between automated actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    pub duration_secs: u32,
    pub opening_delay_ms: u64,
    pub reply_delay_ms: u64,
    pub commentary_delay_ms: u64,
    pub evaluation_delay_ms: u64,
    pub result_ready_delay_ms: u64,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            duration_secs: 300,
            opening_delay_ms: 3000,
            reply_delay_ms: 3000,
            commentary_delay_ms: 1000,
            evaluation_delay_ms: 3000,
            result_ready_delay_ms: 1500,
        }
    }
}

impl SessionTiming {
    pub fn opening_delay(&self) -> Duration {
        Duration::from_millis(self.opening_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn commentary_delay(&self) -> Duration {
        Duration::from_millis(self.commentary_delay_ms)
    }

    pub fn evaluation_delay(&self) -> Duration {
        Duration::from_millis(self.evaluation_delay_ms)
    }

    pub fn result_ready_delay(&self) -> Duration {
        Duration::from_millis(self.result_ready_delay_ms)
    }
}

/// Scoring knobs. The fallback means and the favourable opponent range are
/// placeholder values kept configurable rather than a fairness policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub human_fallback: f64,
    pub opponent_fallback: f64,
    pub human_score: ScoreRange,
    pub opponent_score: ScoreRange,
    /// Chance that a finished human utterance draws moderator commentary.
    pub commentary_probability: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let fallback = FallbackScores::default();
        Self {
            human_fallback: fallback.human,
            opponent_fallback: fallback.opponent,
            human_score: ScoreRange::fixed(7.2),
            opponent_score: ScoreRange::new(7.0, 9.0),
            commentary_probability: 0.3,
        }
    }
}

impl ScoringConfig {
    pub fn fallback(&self) -> FallbackScores {
        FallbackScores {
            human: self.human_fallback,
            opponent: self.opponent_fallback,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub title: String,
    pub category: String,
    /// Absent unless the `[topic]` section sets it.
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            title: "Should facial recognition technology be banned in public spaces?".to_string(),
            category: "Tech".to_string(),
            description: Some(
                "Discuss the ethical implications of widespread facial recognition in public areas."
                    .to_string(),
            ),
        }
    }
}

impl TopicConfig {
    pub fn to_topic(&self) -> Topic {
        Topic {
            title: self.title.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParticipantsConfig {
    pub human_id: String,
    pub human_name: String,
    pub opponent_id: String,
    pub opponent_name: String,
}

impl Default for ParticipantsConfig {
    fn default() -> Self {
        Self {
            human_id: "current-user".to_string(),
            human_name: "You".to_string(),
            opponent_id: "opponent-id".to_string(),
            opponent_name: "VoiceDebater".to_string(),
        }
    }
}

impl ParticipantsConfig {
    pub fn to_participants(&self) -> Participants {
        Participants {
            human: Participant::new(&self.human_id, &self.human_name),
            opponent: Participant::new(&self.opponent_id, &self.opponent_name),
        }
    }
}

/// What the automated opponent says without a language model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpponentConfig {
    pub opening_statement: String,
    pub rebuttals: Vec<String>,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            opening_statement: DEFAULT_OPENING_STATEMENT.to_string(),
            rebuttals: DEFAULT_REBUTTALS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Moderator lines. `{topic}`, `{human}`, `{opponent}`, `{human_score}`,
/// `{opponent_score}` and `{winner}` are substituted where they appear.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModeratorConfig {
    pub welcome: String,
    pub begin: String,
    pub commentary: String,
    pub evaluating: String,
    pub verdict: String,
}

impl Default for ModeratorConfig {
    fn default() -> Self {
        Self {
            welcome: "Welcome to this voice debate. Today's topic is: {topic}".to_string(),
            begin: "I'll be moderating this discussion and providing feedback. Let's begin with opening statements.".to_string(),
            commentary: "That's an interesting point. Remember to provide evidence to support your claims.".to_string(),
            evaluating: "The debate has ended. The AI moderator is now evaluating the arguments...".to_string(),
            verdict: "Debate evaluation: Both participants made compelling arguments. Overall score: {human}: {human_score}/10, {opponent}: {opponent_score}/10. {winner} is the winner of this debate!".to_string(),
        }
    }
}

/// Canned critique text attached to a feedback entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Critique {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub human: Critique,
    pub opponent: Critique,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            human: Critique {
                summary: "Good articulation of points with clear structure.".to_string(),
                strengths: vec![
                    "Eloquent delivery".to_string(),
                    "Logical flow".to_string(),
                    "Clear stance".to_string(),
                ],
                improvements: vec![
                    "Add more supporting evidence".to_string(),
                    "Address counterarguments more directly".to_string(),
                ],
            },
            opponent: Critique {
                summary: "Strong counterargument that addresses the core concerns.".to_string(),
                strengths: vec![
                    "Balanced perspective".to_string(),
                    "Clear argumentation".to_string(),
                    "Practical solutions".to_string(),
                ],
                improvements: vec![
                    "Could be more empathetic to privacy concerns".to_string(),
                    "More specific examples needed".to_string(),
                ],
            },
        }
    }
}

/// Pacing of the built-in voice backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub words_per_minute: u32,
    /// Longest piece of text rendered in one go.
    pub chunk_chars: usize,
    pub chunk_pause_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            chunk_chars: 200,
            chunk_pause_ms: 300,
        }
    }
}

/// Optional language-model backed opponent.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_max_tokens() -> u32 {
    250
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl LlmConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }

    /// Get the system prompt with placeholders replaced.
    pub fn prompt_for(&self, name: &str, topic: &str, opponent_name: &str) -> String {
        self.system_prompt
            .replace("{name}", name)
            .replace("{topic}", topic)
            .replace("{opponent_name}", opponent_name)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| SessionError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Load configuration from string content.
    pub fn from_str(content: &str) -> Result<Self, SessionError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| SessionError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), SessionError> {
        let scoring = &self.scoring;
        if !(0.0..=1.0).contains(&scoring.commentary_probability) {
            return Err(SessionError::ConfigError(format!(
                "commentary_probability must be within [0, 1], got {}",
                scoring.commentary_probability
            )));
        }
        for (label, range) in [
            ("human_score", scoring.human_score),
            ("opponent_score", scoring.opponent_score),
        ] {
            if !range.is_valid() {
                return Err(SessionError::ConfigError(format!(
                    "{} range must satisfy 0 <= min <= max <= 10, got [{}, {}]",
                    label, range.min, range.max
                )));
            }
        }
        if self.opponent.opening_statement.trim().is_empty() {
            return Err(SessionError::ConfigError(
                "opponent.opening_statement cannot be empty".to_string(),
            ));
        }
        let moderator = &self.moderator;
        for (label, line) in [
            ("welcome", &moderator.welcome),
            ("begin", &moderator.begin),
            ("commentary", &moderator.commentary),
            ("evaluating", &moderator.evaluating),
            ("verdict", &moderator.verdict),
        ] {
            if line.trim().is_empty() {
                return Err(SessionError::ConfigError(format!(
                    "moderator.{} cannot be empty",
                    label
                )));
            }
        }
        if self.voice.words_per_minute == 0 {
            return Err(SessionError::ConfigError(
                "voice.words_per_minute must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    Config::default()
}

/// Substitute `{key}` placeholders in a moderator template.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

const DEFAULT_OPENING_STATEMENT: &str = "Let me begin with my opening statement. Facial recognition technology in public spaces poses significant privacy concerns. Citizens have a right to move freely without constant surveillance and identification. Furthermore, these systems have shown bias against certain demographics, leading to potential discrimination. While I understand the security benefits, I believe the risks to civil liberties far outweigh them.";

const DEFAULT_REBUTTALS: [&str; 4] = [
    "While I understand privacy concerns, facial recognition technology provides crucial security benefits. It helps identify criminals and missing persons, potentially saving lives. With proper regulation, we can address bias issues while maintaining these security advantages.",
    "I'd argue that the security benefits are substantial. These systems have helped solve crimes and prevent terrorism. Rather than banning the technology outright, we should focus on improving its accuracy and implementing strong oversight.",
    "The key issue isn't the technology itself but how it's used. With proper legal frameworks, facial recognition can enhance public safety while respecting privacy. Complete bans would deprive society of valuable security tools.",
    "We need to balance security and privacy, not choose between them. Facial recognition, when transparently deployed with public consent and oversight, can protect communities while respecting civil liberties.",
];

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are {name}, the automated opponent in a timed spoken debate.

DEBATE TOPIC: {topic}

YOUR OPPONENT: {opponent_name}, a human speaking through a microphone.

DEBATE RULES:
- Rebut your opponent's latest point directly
- Support your position with evidence and reasoning
- Keep a respectful, confident tone
- Do NOT acknowledge being an AI - stay fully in character

CRITICAL OUTPUT RULES:
- Your words are read aloud: answer in two to four spoken sentences
- Output ONLY your spoken words - no stage directions or narration
- Do NOT use asterisks, markdown or any text in parentheses
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.duration_secs, 300);
        assert_eq!(config.opponent.rebuttals.len(), 4);
        assert_eq!(config.scoring.human_fallback, 7.8);
        assert_eq!(config.scoring.opponent_fallback, 7.6);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_str(
            r#"
            [session]
            duration_secs = 90

            [topic]
            title = "Should homework be abolished?"
            category = "Education"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.duration_secs, 90);
        assert_eq!(config.session.reply_delay_ms, 3000);
        assert_eq!(config.topic.title, "Should homework be abolished?");
        assert!(config.topic.description.is_none());
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_topic_section_absent_keeps_default_description() {
        let config = Config::from_str("[session]\nduration_secs = 60\n").unwrap();
        assert!(config.topic.title.contains("facial recognition"));
        assert!(config.topic.description.is_some());
    }

    #[test]
    fn test_blank_moderator_lines_rejected() {
        for key in ["welcome", "begin", "commentary", "evaluating", "verdict"] {
            let result = Config::from_str(&format!("[moderator]\n{} = \"  \"\n", key));
            match result {
                Err(SessionError::ConfigError(msg)) => assert!(msg.contains(key), "{}", msg),
                other => panic!("blank moderator.{} accepted: {:?}", key, other.is_ok()),
            }
        }
    }

    #[test]
    fn test_score_ranges_parse() {
        let config = Config::from_str(
            r#"
            [scoring]
            opponent_score = { min = 5.0, max = 6.0 }
            commentary_probability = 1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.scoring.opponent_score, ScoreRange::new(5.0, 6.0));
        assert_eq!(config.scoring.human_score, ScoreRange::fixed(7.2));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let result = Config::from_str("[scoring]\ncommentary_probability = 1.5\n");
        assert!(matches!(result, Err(SessionError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let result = Config::from_str("[scoring]\nopponent_score = { min = 9.0, max = 11.0 }\n");
        assert!(matches!(result, Err(SessionError::ConfigError(_))));
    }

    #[test]
    fn test_llm_prompt_placeholders() {
        let config = Config::from_str("[llm]\nmodel = \"llama3:8b\"\n").unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.max_tokens, 250);
        let prompt = llm.prompt_for("VoiceDebater", "Ban cars?", "Ada");
        assert!(prompt.contains("You are VoiceDebater"));
        assert!(prompt.contains("DEBATE TOPIC: Ban cars?"));
        assert!(prompt.contains("YOUR OPPONENT: Ada"));
    }

    #[test]
    fn test_render_template() {
        let text = render_template(
            "{human}: {human_score}, {opponent}: {opponent_score}",
            &[
                ("human", "Ada"),
                ("human_score", "8.0"),
                ("opponent", "Bot"),
                ("opponent_score", "7.6"),
            ],
        );
        assert_eq!(text, "Ada: 8.0, Bot: 7.6");
    }
}
