//! `GeminiClient` against a local stand-in for the `generateContent`
//! endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use persona_relay::Turn;
use persona_relay::api::{GeminiClient, RetryPolicy};
use persona_relay::error::ProviderError;
use persona_relay::generator::GeneratorConfig;
use persona_relay::invoker::ModelInvoker;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
struct FakeGemini {
    calls: Arc<AtomicUsize>,
    /// Number of leading calls answered with 503.
    unavailable_for: usize,
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    Path(target): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let n = fake.calls.fetch_add(1, Ordering::SeqCst);
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, r#"{"error":{"message":"bad key"}}"#.into());
    }
    if target != "gemini-test:generateContent" {
        return (StatusCode::NOT_FOUND, String::new());
    }
    if n < fake.unavailable_for {
        return (StatusCode::SERVICE_UNAVAILABLE, "overloaded".into());
    }

    let request: serde_json::Value = serde_json::from_str(&body).unwrap();
    let roles: Vec<String> = request["contents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["role"].as_str().unwrap().to_string())
        .collect();
    let reply = serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": roles.join(",")}]}}]
    });
    (StatusCode::OK, reply.to_string())
}

async fn spawn_fake(unavailable_for: usize) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = FakeGemini {
        calls: calls.clone(),
        unavailable_for,
    };
    let router = Router::new()
        .route("/v1beta/models/{target}", post(generate_content))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/v1beta"), calls)
}

fn client(base_url: String, key: &str) -> GeminiClient {
    let config = GeneratorConfig {
        model: "gemini-test".into(),
        base_url,
        ..Default::default()
    };
    GeminiClient::new(key, &config).unwrap()
}

#[tokio::test]
async fn sends_key_and_maps_roles() {
    let (base, calls) = spawn_fake(0).await;

    let text = client(base, "test-key")
        .generate_content(&[Turn::user("hi"), Turn::assistant("hello"), Turn::user("bye")])
        .await
        .unwrap();

    assert_eq!(text, "user,model,user");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let (base, _) = spawn_fake(0).await;

    let err = client(base, "wrong-key")
        .generate_content(&[Turn::user("hi")])
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, ProviderError::Http { ref body, .. } if body.contains("bad key")));
}

#[tokio::test]
async fn invoker_retries_through_unavailable_responses() {
    let (base, calls) = spawn_fake(2).await;
    let invoker = ModelInvoker::new(Arc::new(client(base, "test-key")), RetryPolicy::immediate(3));

    let text = invoker
        .generate_with_retries(&[Turn::user("hi")], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(text.as_deref(), Some("user"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
