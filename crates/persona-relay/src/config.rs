//! Startup configuration shared by the CLI and the web server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::api::retry::RetryPolicy;
use crate::chat::{ChatOptions, ChatService};
use crate::error::ConfigError;
use crate::generator::{GeneratorConfig, generator_for};
use crate::invoker::ModelInvoker;
use crate::persona::PersonaRegistry;

/// Environment variable holding the model credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Everything needed to assemble a [`ChatService`].
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Model credential. `None` or blank selects the offline generator.
    pub api_key: Option<String>,
    /// Directory of persona JSON files. `None` uses the built-in personas.
    pub personas_dir: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub retry: RetryPolicy,
    pub chat: ChatOptions,
}

impl RelayConfig {
    /// Load personas, select the generator, and wire the service.
    pub fn build(self) -> Result<ChatService, ConfigError> {
        let personas = match &self.personas_dir {
            Some(dir) => PersonaRegistry::from_dir(dir)?,
            None => PersonaRegistry::builtin()?,
        };
        if personas.is_empty() {
            return Err(ConfigError::NoPersonas);
        }
        info!("Loaded {} persona(s)", personas.len());

        let generator = generator_for(self.api_key, &self.generator)?;
        info!(
            "Retry policy: {} attempt(s), worst-case backoff {:?}",
            self.retry.max_attempts,
            self.retry.worst_case_backoff()
        );
        let invoker = ModelInvoker::new(generator, self.retry);
        Ok(ChatService::with_options(
            Arc::new(personas),
            invoker,
            self.chat,
        ))
    }
}
