//! Request validation and response assembly.
//!
//! [`ChatService`] is the single entry point used by the HTTP layer and the
//! CLI. It rejects bad requests before any model call, builds the persona
//! prompt, runs the [`ModelInvoker`] under an overall deadline, and turns an
//! exhausted invocation into a [mock reply](crate::mock::mock_reply).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::invoker::{ModelInvoker, Outcome, Route};
use crate::mock::mock_reply;
use crate::persona::{Persona, PersonaRegistry};
use crate::prompt::{Conversation, PromptOptions, build_system_prompt};
use crate::Turn;

/// Validation message for a missing persona id or message.
pub const MISSING_FIELDS: &str = "personaId and message required";
/// Validation message for an unknown persona id.
pub const UNKNOWN_PERSONA: &str = "Unknown personaId";

/// Body of a chat request.
///
/// Every field is optional on the wire so that a missing field is reported
/// as a validation error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<Turn>>,
}

impl ChatRequest {
    pub fn new(persona_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            persona_id: Some(persona_id.into()),
            message: Some(message.into()),
            history: None,
        }
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = Some(history);
        self
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// The model answered the structured conversation.
    Model,
    /// The model answered the flattened single-prompt fallback.
    Fallback,
    /// Templated locally; the model was unavailable.
    Mock,
}

/// A successful chat response. Only `reply` is serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(skip)]
    pub source: ReplySource,
}

/// Tunables for [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub prompt: PromptOptions,
    /// Overall budget for one request, retries and backoff included.
    /// Default: 30s.
    pub request_timeout: Duration,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            prompt: PromptOptions::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Validates chat requests and produces replies.
///
/// Holds only immutable state, so one instance is shared by every request.
#[derive(Clone)]
pub struct ChatService {
    personas: Arc<PersonaRegistry>,
    invoker: ModelInvoker,
    options: ChatOptions,
}

impl ChatService {
    pub fn new(personas: Arc<PersonaRegistry>, invoker: ModelInvoker) -> Self {
        Self::with_options(personas, invoker, ChatOptions::default())
    }

    pub fn with_options(
        personas: Arc<PersonaRegistry>,
        invoker: ModelInvoker,
        options: ChatOptions,
    ) -> Self {
        Self {
            personas,
            invoker,
            options,
        }
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    pub fn invoker(&self) -> &ModelInvoker {
        &self.invoker
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    fn validate(&self, request: ChatRequest) -> Result<(&Persona, String, Vec<Turn>), ChatError> {
        let persona_id = request
            .persona_id
            .as_deref()
            .filter(|id| !id.trim().is_empty());
        let message = request.message.filter(|m| !m.trim().is_empty());

        let (Some(persona_id), Some(message)) = (persona_id, message) else {
            return Err(ChatError::Validation(MISSING_FIELDS.to_string()));
        };
        let persona = self
            .personas
            .get(persona_id)
            .ok_or_else(|| ChatError::Validation(UNKNOWN_PERSONA.to_string()))?;

        Ok((persona, message, request.history.unwrap_or_default()))
    }

    /// Answer one chat request.
    ///
    /// Provider failures never surface here: they end in a mock reply.
    /// Errors are validation failures and cancellation by the caller.
    pub async fn reply(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatReply, ChatError> {
        let (persona, message, history) = self.validate(request)?;

        let system_prompt = build_system_prompt(persona, &self.options.prompt);
        debug!(
            "chat request persona={} systemPromptLen={} historyTurns={}",
            persona.id,
            system_prompt.len(),
            history.len()
        );
        let conversation = Conversation::new(system_prompt, history, message);

        let outcome = match tokio::time::timeout(
            self.options.request_timeout,
            self.invoker.invoke(&conversation, cancel),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Model call for persona={} exceeded {:?}",
                    persona.id, self.options.request_timeout
                );
                Outcome::Exhausted
            }
        };

        match outcome {
            Outcome::Delivered { text, route } => Ok(ChatReply {
                reply: text,
                source: match route {
                    Route::Structured => ReplySource::Model,
                    Route::Flattened => ReplySource::Fallback,
                },
            }),
            Outcome::Exhausted => {
                warn!(
                    "Model unavailable ({}); returning mocked reply for persona={}",
                    self.invoker.generator_name(),
                    persona.id
                );
                Ok(ChatReply {
                    reply: mock_reply(persona),
                    source: ReplySource::Mock,
                })
            }
            Outcome::Cancelled => Err(ChatError::Cancelled),
        }
    }
}
