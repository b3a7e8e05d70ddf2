//! Language-model backed opponent.
//!
//! Talks to any OpenAI-compatible endpoint. Every failure path ends in the
//! rotating rebuttals, so a turn is never lost to the network.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::SessionError;
use crate::generator::{DebateContext, ResponseGenerator, RotatingRebuttals};
use crate::participant::Speaker;

const MAX_RETRIES: u32 = 3;

/// Replies shorter than this are treated as empty.
const MIN_REPLY_CHARS: usize = 10;

/// Endpoint and credentials for the completion API.
#[derive(Debug, Clone)]
pub struct LlmEndpoint {
    pub api_base: String,
    pub api_key: String,
}

impl LlmEndpoint {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }
}

pub struct LlmResponseGenerator {
    client: Client<OpenAIConfig>,
    config: LlmConfig,
    fallback: RotatingRebuttals,
}

impl LlmResponseGenerator {
    pub fn new(
        endpoint: &LlmEndpoint,
        config: LlmConfig,
        fallback: RotatingRebuttals,
    ) -> Result<Self, SessionError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| {
                SessionError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        let openai = OpenAIConfig::new()
            .with_api_key(&endpoint.api_key)
            .with_api_base(&endpoint.api_base);

        Ok(Self {
            client: Client::with_config(openai).with_http_client(http_client),
            config,
            fallback,
        })
    }

    /// Replay the transcript from the opponent's point of view.
    fn build_messages(&self, context: &DebateContext) -> Vec<ChatCompletionRequestMessage> {
        let system_prompt = self.config.prompt_for(
            &context.participants.opponent.name,
            &context.topic.title,
            &context.participants.human.name,
        );

        let mut messages = vec![ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage {
                content: system_prompt.into(),
                name: None,
            },
        )];

        for entry in &context.history {
            let message = match entry.speaker {
                Speaker::Opponent => {
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(entry.text.clone().into()),
                        name: None,
                        tool_calls: None,
                        refusal: None,
                        audio: None,
                        function_call: None,
                    })
                }
                Speaker::Human => user_message(format!(
                    "[{} said]: {}",
                    context.participants.human.name, entry.text
                )),
                Speaker::Moderator => user_message(format!("[Moderator]: {}", entry.text)),
            };
            messages.push(message);
        }

        messages.push(user_message(turn_instruction(context).to_string()));
        messages
    }

    /// Request a completion, retrying with exponential backoff.
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<String, SessionError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .max_completion_tokens(self.config.max_tokens)
            .messages(messages)
            .build()?;

        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 2s, 4s
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
            }

            match self.client.chat().create(request.clone()).await {
                Ok(response) => {
                    return Ok(response
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .unwrap_or_default());
                }
                Err(e) => {
                    debug!(attempt = attempt + 1, error = %e, "completion attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.map(SessionError::from).unwrap_or_else(|| {
            SessionError::ConfigError("Unknown API error after retries".to_string())
        }))
    }
}

#[async_trait]
impl ResponseGenerator for LlmResponseGenerator {
    async fn next(&self, context: &DebateContext) -> String {
        match self.complete(self.build_messages(context)).await {
            Ok(raw) => {
                let reply = sanitize_response(&raw);
                if reply.len() > MIN_REPLY_CHARS {
                    return reply;
                }
                warn!(model = %self.config.model, "empty completion, using rotating rebuttal");
            }
            Err(e) => {
                warn!(model = %self.config.model, error = %e, "completion failed, using rotating rebuttal");
            }
        }
        self.fallback.pick()
    }
}

/// What the opponent is asked to do on this turn.
fn turn_instruction(context: &DebateContext) -> &'static str {
    if context.opponent_turns == 0 {
        "Give your opening argument."
    } else if context.last_human_line().is_none() {
        "Your opponent has not spoken yet. Develop your position further."
    } else {
        "Respond to your opponent's latest point."
    }
}

fn user_message(content: String) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
        content: content.into(),
        name: None,
    })
}

/// Strip reasoning blocks, stray tags and markdown emphasis so the reply
/// can be read aloud.
fn sanitize_response(response: &str) -> String {
    let tags_to_strip = [
        "thinking",
        "think",
        "reflection",
        "reflect",
        "internal",
        "reasoning",
        "thought",
        "scratchpad",
        "plan",
        "analysis",
    ];

    let mut result = response.to_string();

    for tag in &tags_to_strip {
        let pattern = format!(r"(?is)<{tag}[^>]*>.*?</{tag}>", tag = tag);
        if let Ok(re) = regex::Regex::new(&pattern) {
            result = re.replace_all(&result, "").to_string();
        }
    }

    if let Ok(orphan_re) = regex::Regex::new(r"</?[\w]+[^>]*>") {
        result = orphan_re.replace_all(&result, "").to_string();
    }

    // Stage directions such as "(leans forward)" would be spoken verbatim.
    if let Ok(stage_re) = regex::Regex::new(r"\([^)]*\)") {
        result = stage_re.replace_all(&result, "").to_string();
    }

    result = result.replace('*', "");

    if let Ok(ws_re) = regex::Regex::new(r"\s+") {
        result = ws_re.replace_all(&result, " ").to_string();
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptEntry;

    #[test]
    fn test_sanitize_response_thinking_tags() {
        let input = "<thinking>Let me think about this...</thinking>The answer is 42.";
        assert_eq!(sanitize_response(input), "The answer is 42.");
    }

    #[test]
    fn test_sanitize_response_multiline_tags() {
        let input = "<think>\nMultiple\nlines\n</think>Surveillance erodes trust.";
        assert_eq!(sanitize_response(input), "Surveillance erodes trust.");
    }

    #[test]
    fn test_sanitize_response_stage_directions_and_emphasis() {
        let input = "(Leans forward) Security is *not* optional.";
        assert_eq!(sanitize_response(input), "Security is not optional.");
    }

    #[test]
    fn test_sanitize_response_orphan_tags() {
        let output = sanitize_response("Start <inner>tags</inner> end");
        assert!(!output.contains('<'));
        assert!(!output.contains('>'));
    }

    fn context(opponent_turns: usize, history: Vec<TranscriptEntry>) -> DebateContext {
        DebateContext {
            topic: crate::participant::Topic {
                title: "Ban it?".to_string(),
                category: "Tech".to_string(),
                description: None,
            },
            participants: crate::config::ParticipantsConfig::default().to_participants(),
            opponent_turns,
            history,
        }
    }

    #[test]
    fn test_turn_instruction_follows_debate_progress() {
        assert_eq!(turn_instruction(&context(0, vec![])), "Give your opening argument.");
        assert!(turn_instruction(&context(1, vec![])).starts_with("Your opponent has not spoken"));

        let said = TranscriptEntry {
            sequence: 1,
            speaker: Speaker::Human,
            text: "Bans are necessary".to_string(),
            recorded_at: chrono::Utc::now(),
        };
        assert_eq!(
            turn_instruction(&context(1, vec![said])),
            "Respond to your opponent's latest point."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_endpoint_falls_back() {
        let generator = LlmResponseGenerator::new(
            &LlmEndpoint::new("http://127.0.0.1:9/v1", "test-key"),
            LlmConfig::new("test-model"),
            RotatingRebuttals::new(vec!["Offline rebuttal that is long enough.".to_string()]),
        )
        .unwrap();

        let context = context(1, vec![]);

        let messages = generator.build_messages(&context);
        assert_eq!(messages.len(), 2);
        assert_eq!(
            generator.next(&context).await,
            "Offline rebuttal that is long enough."
        );
    }
}
