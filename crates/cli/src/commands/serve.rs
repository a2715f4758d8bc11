use anyhow::{Context, Result};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use sitedrop_core::DeployConfig;
use sitedrop_core::config::API_TOKEN_VAR;
use sitedrop_deployer::DeployHandler;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type SharedHandler = Arc<DeployHandler>;

/// Start the HTTP deploy endpoint.
///
/// Configuration is read once here and injected into the handler; a missing
/// credential does not stop the server, it makes each deploy answer 500.
///
/// # Arguments
///
/// * `host` - Address to bind
/// * `port` - Port to serve on
/// * `max_body_mb` - Request body limit in MiB (base64 inflates payloads by a third)
pub async fn run(host: IpAddr, port: u16, max_body_mb: usize) -> Result<()> {
    let config = DeployConfig::from_env().context("Failed to load configuration")?;
    if config.api_token.is_none() {
        tracing::warn!("{} is not set; every deploy will fail until it is", API_TOKEN_VAR);
    }
    tracing::info!(
        api_base = %config.api_base,
        cleanup_on_failure = config.cleanup_on_failure,
        "Configuration loaded"
    );

    let handler = DeployHandler::from_config(config).context("Failed to create Netlify client")?;
    let app = router(Arc::new(handler), body_limit_bytes(max_body_mb));

    let addr = SocketAddr::from((host, port));
    tracing::info!("Deploy endpoint ready at: http://{}/deploy", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// MiB to bytes, clamped instead of overflowing
fn body_limit_bytes(max_body_mb: usize) -> usize {
    max_body_mb.saturating_mul(1024 * 1024)
}

/// Routes for the deploy endpoint.
///
/// Every method is routed into the handler so non-POST requests receive its
/// 405 body rather than the router's empty one.
pub fn router(handler: SharedHandler, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/deploy", any(deploy_handler))
        .route("/.netlify/functions/deploy", any(deploy_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn deploy_handler(
    State(handler): State<SharedHandler>,
    method: Method,
    body: Bytes,
) -> Response {
    handler.handle(&method, &body).await.into_response()
}

async fn health_handler() -> &'static str {
    "ok"
}
