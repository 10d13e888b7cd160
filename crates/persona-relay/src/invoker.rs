//! Model invocation: bounded retries plus one structural fallback.
//!
//! Per request the invoker walks a small state machine:
//!
//! ```text
//! Attempt ──ok──▶ Delivered
//!    │
//!    ├─ transient (429 / 5xx), attempts left ──wait──▶ Attempt
//!    ├─ transient, budget spent ──────────────────────▶ Exhausted
//!    ├─ fatal (400 / 422) ──▶ flattened Attempt ──ok──▶ Delivered
//!    │                              └─ any failure ───▶ Exhausted
//!    └─ other ─────────────────────────────────────────▶ Exhausted
//! ```
//!
//! Both the provider call and the wait between attempts race a
//! [`CancellationToken`], so a caller that goes away stops the loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::retry::{self, ErrorClass, RetryPolicy};
use crate::error::ProviderError;
use crate::generator::TextGenerator;
use crate::prompt::Conversation;
use crate::Turn;

/// Which conversation shape produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Structured,
    Flattened,
}

/// Terminal state of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered { text: String, route: Route },
    /// No text could be obtained; the caller should degrade to a mock reply.
    Exhausted,
    Cancelled,
}

/// Runs a [`TextGenerator`] under a [`RetryPolicy`].
#[derive(Clone)]
pub struct ModelInvoker {
    generator: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl ModelInvoker {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Call the generator until it succeeds or the policy says stop.
    ///
    /// - `Ok(Some(text))`: delivered.
    /// - `Ok(None)`: every attempt failed transiently.
    /// - `Err(e)`: a fatal or other failure (returned immediately), or
    ///   [`ProviderError::Cancelled`].
    pub async fn generate_with_retries(
        &self,
        turns: &[Turn],
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ProviderError> {
        let max = self.policy.max_attempts;
        let mut attempt = 0;
        while attempt < max {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                r = self.generator.generate(turns) => r,
            };

            let err = match result {
                Ok(text) => return Ok(Some(text)),
                Err(e) => e,
            };
            attempt += 1;

            if retry::classify(&err) != ErrorClass::Transient {
                return Err(err);
            }
            if attempt >= max {
                warn!("Transient model error on final attempt {attempt}/{max}: {err}");
                break;
            }

            let wait = self.policy.delay_for_attempt(attempt);
            warn!("Transient model error (attempt {attempt}/{max}): {err}. Retrying in {wait:?}...");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
        Ok(None)
    }

    /// Run the structured call, falling back to the flattened prompt once if
    /// the provider rejects the structure.
    pub async fn invoke(&self, conversation: &Conversation, cancel: &CancellationToken) -> Outcome {
        let structured = conversation.structured_turns();
        debug!(
            "Invoking {} with {} turn(s)",
            self.generator.name(),
            structured.len()
        );

        let err = match self.generate_with_retries(&structured, cancel).await {
            Ok(Some(text)) => {
                return Outcome::Delivered {
                    text,
                    route: Route::Structured,
                };
            }
            Ok(None) => return Outcome::Exhausted,
            Err(ProviderError::Cancelled) => return Outcome::Cancelled,
            Err(e) => e,
        };

        if retry::classify(&err) != ErrorClass::Fatal {
            match err {
                ProviderError::Unconfigured => debug!("Model not configured"),
                e => warn!("Model error: {e}"),
            }
            return Outcome::Exhausted;
        }

        warn!("Model rejected the structured conversation ({err}); resending as a single prompt");
        match self
            .generate_with_retries(&conversation.flattened_turns(), cancel)
            .await
        {
            Ok(Some(text)) => Outcome::Delivered {
                text,
                route: Route::Flattened,
            },
            Ok(None) => Outcome::Exhausted,
            Err(ProviderError::Cancelled) => Outcome::Cancelled,
            Err(e) => {
                warn!("Model error after flattened fallback: {e}");
                Outcome::Exhausted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::generator::OfflineGenerator;
    use crate::test_support::{ScriptedGenerator, Step};

    fn invoker(generator: &Arc<ScriptedGenerator>) -> ModelInvoker {
        ModelInvoker::new(generator.clone(), RetryPolicy::default())
    }

    fn conversation() -> Conversation {
        Conversation::new(
            "SYS".into(),
            vec![Turn::user("earlier"), Turn::assistant("reply")],
            "question",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn two_503s_then_success_waits_twice_on_schedule() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Step::Status(503),
            Step::Status(503),
            Step::Reply("finally"),
        ]));
        let start = Instant::now();

        let result = invoker(&generator)
            .generate_with_retries(&[Turn::user("hi")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.as_deref(), Some("finally"));
        assert_eq!(generator.calls(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1600), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_429_exhausts_without_error() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Status(429)]));

        let result = invoker(&generator)
            .generate_with_retries(&[Turn::user("hi")], &CancellationToken::new())
            .await;

        assert!(matches!(result, Ok(None)));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_429_invoke_is_exhausted() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Status(429)]));
        let outcome = invoker(&generator)
            .invoke(&conversation(), &CancellationToken::new())
            .await;
        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Status(400)]));
        let result = invoker(&generator)
            .generate_with_retries(&[Turn::user("hi")], &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ProviderError::Http { status: 400, .. })));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn fatal_structured_call_uses_flattened_fallback() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Step::Status(400),
            Step::Reply("flat answer"),
        ]));

        let outcome = invoker(&generator)
            .invoke(&conversation(), &CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            Outcome::Delivered {
                text: "flat answer".into(),
                route: Route::Flattened
            }
        );
        let seen = generator.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].len(), 4);
        assert_eq!(seen[1].len(), 1);
        assert!(seen[1][0].content.contains("User message: question"));
    }

    #[tokio::test]
    async fn failed_flattened_fallback_is_exhausted() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Status(400)]));
        let outcome = invoker(&generator)
            .invoke(&conversation(), &CancellationToken::new())
            .await;
        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flattened_fallback_still_retries_transient_errors() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Step::Status(400),
            Step::Status(503),
            Step::Reply("second try"),
        ]));
        let outcome = invoker(&generator)
            .invoke(&conversation(), &CancellationToken::new())
            .await;
        assert!(matches!(
            outcome,
            Outcome::Delivered {
                route: Route::Flattened,
                ..
            }
        ));
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn other_errors_stop_immediately() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Step::Status(401),
            Step::Reply("never reached"),
        ]));
        let outcome = invoker(&generator)
            .invoke(&conversation(), &CancellationToken::new())
            .await;
        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn structured_success_reports_route() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Reply("hello")]));
        let outcome = invoker(&generator)
            .invoke(&conversation(), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            Outcome::Delivered {
                text: "hello".into(),
                route: Route::Structured
            }
        );
    }

    #[tokio::test]
    async fn offline_generator_is_exhausted_after_one_call() {
        let invoker = ModelInvoker::new(Arc::new(OfflineGenerator), RetryPolicy::default());
        let outcome = invoker
            .invoke(&conversation(), &CancellationToken::new())
            .await;
        assert_eq!(outcome, Outcome::Exhausted);
    }

    #[tokio::test]
    async fn zero_attempt_budget_never_calls() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Reply("x")]));
        let invoker = ModelInvoker::new(generator.clone(), RetryPolicy::immediate(0));
        let result = invoker
            .generate_with_retries(&[Turn::user("hi")], &CancellationToken::new())
            .await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_the_call() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Reply("x")]));
        let token = CancellationToken::new();
        token.cancel();
        let outcome = invoker(&generator).invoke(&conversation(), &token).await;
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_stops_the_loop() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Step::Status(503)]));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(700)).await;
            canceller.cancel();
        });

        let result = invoker(&generator)
            .generate_with_retries(&[Turn::user("hi")], &token)
            .await;

        assert!(matches!(result, Err(ProviderError::Cancelled)));
        // t=0 first call, t=500 second call, cancelled during the 1000ms wait.
        assert_eq!(generator.calls(), 2);
    }
}
