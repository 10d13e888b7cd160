//! Persona-based chat relay.
//!
//! `persona-relay` takes a user message plus the caller's chat history,
//! composes a bounded system prompt from a static [`Persona`](persona::Persona)
//! definition, forwards the conversation to a text-generation model, and
//! returns the reply. When the model is unreachable, rate-limited past the
//! retry budget, or simply not configured, the relay answers with a
//! deterministic persona-flavoured [mock reply](mock::mock_reply) instead of
//! surfacing a failure.
//!
//! # Getting started
//!
//! ```ignore
//! use std::sync::Arc;
//! use persona_relay::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! let personas = Arc::new(PersonaRegistry::builtin()?);
//! let generator = generator_for(std::env::var("GEMINI_API_KEY").ok(), &GeneratorConfig::default())?;
//! let service = ChatService::new(personas, ModelInvoker::new(generator, RetryPolicy::default()));
//!
//! let request = ChatRequest::new("hitesh", "How do I start?");
//! let reply = service.reply(request, &CancellationToken::new()).await?;
//! println!("{}", reply.reply);
//! ```
//!
//! # Where to find things
//!
//! - **Persona data:** [`persona::PersonaRegistry`] is built once at startup
//!   and shared behind an `Arc`. [`PersonaRegistry::builtin()`](persona::PersonaRegistry::builtin)
//!   embeds the shipped personas; [`PersonaRegistry::from_dir()`](persona::PersonaRegistry::from_dir)
//!   loads JSON definitions from disk.
//! - **Prompt construction:** [`prompt::build_system_prompt`] and the
//!   structured/flattened conversation shapes in [`prompt`].
//! - **Talking to the model:** the [`TextGenerator`](generator::TextGenerator)
//!   capability, implemented by [`GeminiClient`](api::gemini::GeminiClient) and
//!   [`OfflineGenerator`](generator::OfflineGenerator).
//! - **Retry and fallback:** [`api::retry::RetryPolicy`] classifies failures
//!   and schedules waits; [`invoker::ModelInvoker`] runs the state machine.
//! - **Request handling:** [`chat::ChatService`] validates a request, runs
//!   the invoker under a deadline, and degrades to the mock reply.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`persona`] | Persona records and the immutable registry |
//! | [`prompt`] | System prompt builder and conversation shapes |
//! | [`api`] | Retry policy and the Gemini `generateContent` client |
//! | [`generator`] | `TextGenerator` capability and startup selection |
//! | [`invoker`] | Retry loop plus structural fallback |
//! | [`mock`] | Templated offline reply |
//! | [`chat`] | Validation and response assembly |
//! | [`config`] | Startup wiring shared by the binaries |

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod generator;
pub mod invoker;
pub mod mock;
pub mod persona;
pub mod prelude;
pub mod prompt;

#[cfg(test)]
mod test_support;

use serde::{Deserialize, Serialize};

pub use error::{ChatError, ConfigError, PersonaError, ProviderError};

// ── Constants ──────────────────────────────────────────────────────

/// Base URL of the Gemini REST API (without the model path).
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for persona replies.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

// ── Conversation types ─────────────────────────────────────────────

/// Author of a conversation turn.
///
/// Only `user` and `assistant` are accepted from callers. `model` is taken as
/// an alias for `assistant` because front-ends that talk to Gemini directly
/// tend to store history with the provider's naming.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "model")]
    Assistant,
}

/// A single conversation turn. An ordered `Vec<Turn>` is the history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
