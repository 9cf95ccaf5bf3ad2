//! Streamable HTTP hosting for the MCP server.
//!
//! Every MCP session opened against `/mcp` gets a fresh [`StoryServer`], so
//! project context is never shared between sessions.

mod middleware;

pub use middleware::{AuthConfig, MCP_KEY_ENV};

use axum::{
    extract::State, middleware::from_fn_with_state, response::IntoResponse, routing::get, Json,
    Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::mcp::{BackendClient, StoryServer};

/// Liveness of this process plus a probe of the backend.
async fn health(State(client): State<BackendClient>) -> impl IntoResponse {
    let backend = if client.health_check().await {
        "healthy"
    } else {
        "unhealthy"
    };
    Json(serde_json::json!({ "status": "ok", "backend": backend }))
}

pub fn create_router(config: Config, auth: AuthConfig) -> Router {
    let client = BackendClient::from_config(&config);

    let mcp = StreamableHttpService::new(
        move || Ok(StoryServer::from_config(&config)),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let protected = Router::new()
        .nest_service("/mcp", mcp)
        .layer(from_fn_with_state(auth, middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .with_state(client)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve MCP over streamable HTTP until the process is stopped.
pub async fn serve(config: Config, auth: AuthConfig, port: u16) -> anyhow::Result<()> {
    if auth.api_key.is_none() {
        tracing::warn!("{} not set; /mcp accepts unauthenticated requests", MCP_KEY_ENV);
    }

    let app = create_router(config, auth);
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Storyboard MCP listening on http://127.0.0.1:{}/mcp", port);

    axum::serve(listener, app).await?;
    Ok(())
}
