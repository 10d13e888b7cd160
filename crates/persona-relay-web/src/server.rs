//! Axum server setup and router construction.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::api::{self, AppState};

/// Max request body size for `/api/chat` (message plus client-side history).
pub const CHAT_MAX_BODY_BYTES: usize = 256 * 1024;

/// Build the full axum router.
///
/// The router serves:
/// - REST API at `/api/personas` and `/api/chat`
/// - Optional static files from `static_dir` for every other path
pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/api/personas",
            get(api::list_personas).fallback(api::personas_method_not_allowed),
        )
        .route(
            "/api/chat",
            post(api::post_chat)
                .layer(DefaultBodyLimit::max(CHAT_MAX_BODY_BYTES))
                .fallback(api::chat_method_not_allowed),
        )
        .with_state(state);

    let mut router = api_routes;
    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `bind_addr`, serve `router` on a Tokio task, and return the bound
/// address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Server error: {e}");
        }
    });

    Ok(addr)
}
