//! Persona chat relay server.
//!
//! Serves `GET /api/personas` and `POST /api/chat`, plus a static front-end
//! when the static directory exists.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p persona-relay-web
//! cargo run -p persona-relay-web -- --port 8080 --static-dir ./public
//! PORT=4000 GEMINI_MODEL=gemini-1.5-pro cargo run -p persona-relay-web
//! ```
//!
//! Without `GEMINI_API_KEY` every chat reply is templated locally.
//!
//! **REST** (`POST /api/chat`):
//! ```json
//! {"personaId": "hitesh", "message": "How do I start?", "history": []}
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use persona_relay::DEFAULT_MODEL;
use persona_relay::api::RetryPolicy;
use persona_relay::chat::ChatOptions;
use persona_relay::config::{API_KEY_ENV, RelayConfig};
use persona_relay::generator::GeneratorConfig;
use persona_relay_web::{WebConfig, spawn_web};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Persona chat relay server.
#[derive(Parser)]
#[command(about = "HTTP relay that answers chat messages in a persona's voice")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Directory of static front-end files, served when it exists.
    #[arg(long, default_value = "public")]
    static_dir: PathBuf,

    /// Directory of persona JSON files (defaults to the built-in personas).
    #[arg(long, env = "PERSONAS_DIR")]
    personas_dir: Option<PathBuf>,

    /// Model to use.
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Overall time budget for one chat reply, in seconds.
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// Model call attempts before falling back to a templated reply.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    // 1. Personas, generator and retry policy.
    let relay = RelayConfig {
        api_key: std::env::var(API_KEY_ENV).ok(),
        personas_dir: args.personas_dir,
        generator: GeneratorConfig {
            model: args.model,
            ..Default::default()
        },
        retry: RetryPolicy::with_attempts(args.max_attempts),
        chat: ChatOptions {
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            ..Default::default()
        },
    };
    let service = Arc::new(relay.build().map_err(|e| e.to_string())?);

    // 2. Static front-end, only if present.
    let static_dir = if args.static_dir.is_dir() {
        Some(args.static_dir)
    } else {
        warn!(
            "Static directory {} not found; serving the API only",
            args.static_dir.display()
        );
        None
    };

    // 3. Serve until Ctrl-C.
    let web_config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        static_dir,
    };
    let addr = spawn_web(service, web_config)
        .await
        .map_err(|e| format!("failed to bind: {e}"))?;
    println!("Persona relay: http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    info!("Shutting down");

    Ok(())
}
