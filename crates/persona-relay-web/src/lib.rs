//! HTTP surface for `persona-relay`.
//!
//! `persona-relay-web` exposes a [`ChatService`] over two JSON endpoints and
//! optionally serves a static front-end from the same origin.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/api/personas` | `GET` | `[{ "id", "name" }]` |
//! | `/api/chat` | `POST` | `{ "reply" }`, or `{ "error" }` with 400 / 500 |
//!
//! Any other method on these paths answers 405 with an `Allow` header.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use persona_relay::config::RelayConfig;
//! use persona_relay_web::{WebConfig, spawn_web};
//!
//! let service = Arc::new(RelayConfig::default().build()?);
//! let addr = spawn_web(service, WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```

pub mod api;
pub mod error;
mod server;

pub use api::AppState;
pub use error::{ApiError, ErrorBody};
pub use server::build_router;

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use persona_relay::chat::ChatService;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3000`.
    pub bind_addr: SocketAddr,
    /// Directory served for every non-API path. `None` serves only the API.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: None,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// Binding port 0 picks a free port. The server runs until the Tokio
/// runtime shuts down.
pub async fn spawn_web(service: Arc<ChatService>, config: WebConfig) -> io::Result<SocketAddr> {
    let router = build_router(AppState { service }, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
