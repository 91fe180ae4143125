use axum::debug_handler;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use lucinka_client::LucinkaError;
use lucinka_client::config::Config;
use lucinka_client::http_client::ReqwestLucinkaClient;
use lucinka_mcp::domains::resources::Dashboard;
use lucinka_mcp::domains::statistics::StatisticsReport;
use lucinka_mcp::middleware::LoggingMiddleware;
use lucinka_mcp::store::{JsonFileStore, Preferences};
use lucinka_mcp::{AnalyticsConfig, LucinkaMcpHandler, McpError, StatisticsParams};

struct AppState {
    metrics: PrometheusHandle,
    handler: LucinkaMcpHandler,
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[debug_handler]
async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.metrics.render();
    ([("content-type", "text/plain; version=0.0.4")], body)
}

#[debug_handler]
async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Dashboard>, (StatusCode, String)> {
    metrics::counter!("lucinka_http_requests_total", "route" => "dashboard").increment(1);
    state.handler.dashboard().await.map(Json).map_err(map_err)
}

#[debug_handler]
async fn statistics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatisticsParams>,
) -> Result<Json<StatisticsReport>, (StatusCode, String)> {
    metrics::counter!("lucinka_http_requests_total", "route" => "statistics").increment(1);
    state
        .handler
        .statistics(params)
        .await
        .map(Json)
        .map_err(map_err)
}

fn map_err(e: McpError) -> (StatusCode, String) {
    let status = match &e {
        McpError::SessionInvalid(_) | McpError::Api(LucinkaError::Auth(_)) => {
            StatusCode::UNAUTHORIZED
        }
        McpError::Api(LucinkaError::Forbidden(_)) => StatusCode::FORBIDDEN,
        McpError::Api(LucinkaError::NotFound(_)) | McpError::NotFound(_) => StatusCode::NOT_FOUND,
        McpError::Validation(_) | McpError::InvalidArgument(_) | McpError::Registry(_) => {
            StatusCode::BAD_REQUEST
        }
        McpError::Api(_) => StatusCode::BAD_GATEWAY,
        McpError::Store(_) | McpError::Config(_) | McpError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        metrics::counter!("lucinka_http_errors_total").increment(1);
    }
    (status, e.to_string())
}

#[cfg(test)]
#[allow(clippy::items_after_test_module)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_maps_to_unauthorized() {
        let (status, msg) = map_err(McpError::SessionInvalid("cookie expired".into()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(msg.contains("cookie expired"));
    }

    #[test]
    fn bad_month_maps_to_bad_request() {
        let (status, _) = map_err(McpError::InvalidArgument("2026/01".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = map_err(McpError::Api(LucinkaError::Api {
            status: 500,
            body: "boom".into(),
        }));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Configure logging from env var `LUCINKA_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("LUCINKA_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(log_env.clone())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rmcp=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!(%log_env, "lucinka_mcp:http: log filter");

    let builder = PrometheusBuilder::new();
    let handle = builder.install_recorder()?;

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::info!(error = %e, "missing credentials; aborting startup");
            std::process::exit(1);
        }
    };
    let analytics = AnalyticsConfig::from_env()?;
    let preferences = match &analytics.preferences_path {
        Some(path) => Preferences::new(Arc::new(JsonFileStore::new(path))),
        None => Preferences::in_memory(),
    };

    let client = Arc::new(LoggingMiddleware::new(ReqwestLucinkaClient::new(
        &config.base_url,
        config.username,
        config.password,
    )));
    let handler = LucinkaMcpHandler::with_config(client, analytics, preferences);
    let state = Arc::new(AppState {
        metrics: handle.clone(),
        handler: handler.clone(),
    });

    let max_body_size = std::env::var("MAX_HTTP_BODY_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(50 * 1024 * 1024);

    // Sessions share one handler so the feeding timer survives reconnects
    let factory = move || -> Result<_, std::io::Error> { Ok(handler.clone()) };
    let session = std::sync::Arc::new(
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default(),
    );
    let mcp_service = rmcp::transport::streamable_http_server::tower::StreamableHttpService::new(
        factory,
        session,
        rmcp::transport::streamable_http_server::tower::StreamableHttpServerConfig::default(),
    );

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/dashboard", get(dashboard))
        .route("/statistics", get(statistics))
        .nest_service("/mcp", mcp_service)
        .layer(axum::extract::DefaultBodyLimit::max(max_body_size))
        .with_state(state.clone());

    let addr: SocketAddr = std::env::var("ADDRESS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));
    info!(%addr, max_body_bytes = max_body_size, "starting HTTP server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to address {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app.into_make_service());
    if let Err(e) = server
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("failed to install ctrl+c handler: {e}");
            }
        })
        .await
    {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }

    Ok(())
}
