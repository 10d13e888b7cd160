//! Error types shared across the relay.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`TextGenerator`](crate::generator::TextGenerator).
///
/// Classification into transient / fatal / other lives in
/// [`api::retry::classify`](crate::api::retry::classify); this type only
/// records what happened.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success HTTP status.
    #[error("Gemini API HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),
    /// The response body could not be decoded.
    #[error("failed to parse response: {0}")]
    Parse(String),
    /// A 2xx response carrying an error object.
    #[error("Gemini API error: {0}")]
    Api(String),
    /// The model produced no text (no candidates, or only empty parts).
    #[error("model returned no text")]
    Empty,
    /// No credential is configured; the offline generator reports this.
    #[error("no model credential configured")]
    Unconfigured,
    /// The caller went away before the call finished.
    #[error("cancelled")]
    Cancelled,
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ProviderError {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure while loading persona definitions.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid persona definition {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate persona id '{0}'")]
    Duplicate(String),
    #[error("invalid persona: {0}")]
    Invalid(String),
}

/// Failure of a chat request as seen by the caller.
///
/// Provider failures never appear here: they are absorbed by the retry loop,
/// the structural fallback, or the mock reply.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request was rejected before any model call.
    #[error("{0}")]
    Validation(String),
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
    /// Something unexpected went wrong inside the relay.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure while assembling the relay at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Persona(#[from] PersonaError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("no personas defined")]
    NoPersonas,
}
