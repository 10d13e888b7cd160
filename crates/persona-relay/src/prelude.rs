//! Convenience re-exports for common `persona-relay` types.
//!
//! ```ignore
//! use persona_relay::prelude::*;
//! ```
//!
//! Covers what a host needs to wire the relay: the persona registry, a
//! generator, the invoker and the chat service. Wire types of the Gemini
//! client stay in [`api::gemini`](crate::api::gemini).

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{ChatError, ConfigError, PersonaError, ProviderError, Role, Turn};

// ── Personas and prompts ────────────────────────────────────────────
pub use crate::persona::{Persona, PersonaRegistry, PersonaSummary, TrainingExample};
pub use crate::prompt::{Conversation, PromptBuilder, PromptOptions, build_system_prompt};

// ── Model access ────────────────────────────────────────────────────
pub use crate::api::{GeminiClient, RetryPolicy};
pub use crate::generator::{
    GenerateFuture, GeneratorConfig, OfflineGenerator, TextGenerator, generator_for,
};
pub use crate::invoker::{ModelInvoker, Outcome, Route};
pub use crate::mock::mock_reply;

// ── Request handling ────────────────────────────────────────────────
pub use crate::chat::{ChatOptions, ChatReply, ChatRequest, ChatService, ReplySource};
pub use crate::config::RelayConfig;
