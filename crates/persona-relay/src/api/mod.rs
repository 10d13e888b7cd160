//! Provider-facing layer: the Gemini client and the retry policy around it.
//!
//! - [`gemini`]: `generateContent` REST client implementing
//!   [`TextGenerator`](crate::generator::TextGenerator).
//! - [`retry`]: attempt budget, delay schedule, and transient / fatal /
//!   other classification of [`ProviderError`](crate::ProviderError)s.

pub mod gemini;
pub mod retry;

pub use gemini::GeminiClient;
pub use retry::{ErrorClass, RetryPolicy, classify};
