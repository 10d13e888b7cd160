//! The text-generation capability and its startup selection.
//!
//! The relay never branches on "is a key configured?" at request time.
//! Instead [`generator_for`] picks an implementation once at startup:
//! [`GeminiClient`] when a credential is present, [`OfflineGenerator`]
//! otherwise. The offline generator fails every call immediately, which the
//! invoker treats as an exhausted call, so the relay answers with mock replies.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::gemini::GeminiClient;
use crate::error::ProviderError;
use crate::{DEFAULT_MODEL, GEMINI_API_BASE, Turn};

/// Boxed future returned by [`TextGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ProviderError>> + Send + 'a>>;

/// Something that turns an ordered conversation into generated text.
///
/// Implementors only report what happened; retrying and falling back are
/// the [`ModelInvoker`](crate::invoker::ModelInvoker)'s job.
///
/// # Example
///
/// ```
/// use persona_relay::generator::{GenerateFuture, TextGenerator};
/// use persona_relay::Turn;
///
/// struct Echo;
///
/// impl TextGenerator for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn generate<'a>(&'a self, turns: &'a [Turn]) -> GenerateFuture<'a> {
///         Box::pin(async move {
///             Ok(turns.last().map(|t| t.content.clone()).unwrap_or_default())
///         })
///     }
/// }
/// ```
pub trait TextGenerator: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    fn generate<'a>(&'a self, turns: &'a [Turn]) -> GenerateFuture<'a>;
}

/// Generator used when no credential is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    fn generate<'a>(&'a self, _turns: &'a [Turn]) -> GenerateFuture<'a> {
        Box::pin(async { Err(ProviderError::Unconfigured) })
    }
}

/// Settings for the network-backed generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// API base URL. Default: [`GEMINI_API_BASE`].
    pub base_url: String,
    /// Timeout for a single HTTP call. Default: 60s.
    pub http_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            http_timeout: Duration::from_secs(60),
        }
    }
}

/// Pick the generator implementation based on credential presence.
///
/// Blank credentials count as absent.
pub fn generator_for(
    credential: Option<String>,
    config: &GeneratorConfig,
) -> Result<Arc<dyn TextGenerator>, ProviderError> {
    match credential.filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            info!("Using Gemini model {}", config.model);
            Ok(Arc::new(GeminiClient::new(key.trim(), config)?))
        }
        None => {
            info!("No model credential configured; replies will be templated");
            Ok(Arc::new(OfflineGenerator))
        }
    }
}
