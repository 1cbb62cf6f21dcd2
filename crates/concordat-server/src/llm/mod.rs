//! Generation backend client.
//!
//! Everything the game needs from a text-generation model goes through the
//! [`Generator`] trait: turn-event simulation, advisor Q&A, and diplomatic
//! replies. [`LmClient`] is the production implementation, speaking the
//! OpenAI-compatible chat-completions protocol over HTTP; tests swap in
//! scripted generators.

pub mod parse;
pub mod prompts;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use concordat_protocol::{AdvisorContext, ChatMessage, TurnContext};

use crate::config::LlmConfig;
use prompts::{DiplomacyParams, Prompt};

pub use parse::{parse_turn_generation, TurnOutcome};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation backend returned status {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("generation response carried no choices")]
    EmptyResponse,
}

/// Seam between the game logic and the text-generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run the game-master simulation step for one turn. Transport and
    /// backend failures surface as errors; unparsable content does not,
    /// it degrades inside the [`TurnOutcome`].
    async fn turn_events(&self, ctx: &TurnContext) -> Result<TurnOutcome, GenerationError>;

    /// Answer a player question in the advisor's voice.
    async fn advisor(
        &self,
        question: &str,
        ctx: &AdvisorContext,
    ) -> Result<String, GenerationError>;

    /// Produce one nation's reply in a diplomatic chat. `transcript` is the
    /// chat history in order; the newest player message is carried by
    /// `params.message`.
    async fn diplomatic_reply(
        &self,
        params: DiplomacyParams<'_>,
        transcript: &[ChatMessage],
    ) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct LmClient {
    http: reqwest::Client,
    config: LlmConfig,
    /// Raw turn responses are mirrored here for post-mortems. Best-effort:
    /// a failed write never fails the turn.
    debug_sink: Option<PathBuf>,
}

impl LmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            debug_sink: None,
        }
    }

    pub fn with_debug_sink(mut self, path: PathBuf) -> Self {
        self.debug_sink = Some(path);
        self
    }

    async fn complete(
        &self,
        messages: Vec<WireMessage<'_>>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature,
            max_tokens,
        };
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!(%url, model = %self.config.model, "requesting completion");

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }

    fn mirror_raw_response(&self, raw: &str) {
        let Some(path) = &self.debug_sink else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(%err, "could not create debug sink directory");
                return;
            }
        }
        if let Err(err) = std::fs::write(path, raw) {
            warn!(%err, "could not mirror raw generation response");
        }
    }
}

#[async_trait]
impl Generator for LmClient {
    async fn turn_events(&self, ctx: &TurnContext) -> Result<TurnOutcome, GenerationError> {
        let rendered = Prompt::TurnEvents(ctx).render();
        let messages = vec![
            WireMessage {
                role: "system",
                content: &rendered.system,
            },
            WireMessage {
                role: "user",
                content: &rendered.user,
            },
        ];
        let raw = self
            .complete(messages, self.config.temperature, self.config.max_tokens)
            .await?;
        self.mirror_raw_response(&raw);
        Ok(parse_turn_generation(&raw))
    }

    async fn advisor(
        &self,
        question: &str,
        ctx: &AdvisorContext,
    ) -> Result<String, GenerationError> {
        let rendered = Prompt::Advisor {
            question,
            context: ctx,
        }
        .render();
        let messages = vec![
            WireMessage {
                role: "system",
                content: &rendered.system,
            },
            WireMessage {
                role: "user",
                content: &rendered.user,
            },
        ];
        let reply = self
            .complete(messages, self.config.temperature, self.config.max_tokens)
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn diplomatic_reply(
        &self,
        params: DiplomacyParams<'_>,
        transcript: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        let rendered = Prompt::DiplomaticReply(params).render();
        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: &rendered.system,
        });
        for entry in transcript {
            messages.push(WireMessage {
                role: if entry.sender_is_player {
                    "user"
                } else {
                    "assistant"
                },
                content: &entry.message_text,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &rendered.user,
        });
        let reply = self
            .complete(
                messages,
                self.config.diplomacy_temperature,
                self.config.diplomacy_max_tokens,
            )
            .await?;
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_response_deserializes() {
        let json = r#"{
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "hello"}}
            ],
            "usage": {"total_tokens": 12}
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }

    #[test]
    fn completion_request_serializes_roles() {
        let request = CompletionRequest {
            model: "test-model",
            messages: vec![
                WireMessage {
                    role: "system",
                    content: "sys",
                },
                WireMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.7,
            max_tokens: 100,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["model"], "test-model");
    }
}
