use std::sync::Arc;

use lucinka_client::config::Config;
use lucinka_client::http_client::ReqwestLucinkaClient;
use lucinka_mcp::middleware::LoggingMiddleware;
use lucinka_mcp::store::{JsonFileStore, Preferences};
use lucinka_mcp::{AnalyticsConfig, LucinkaMcpHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure logging from env var `LUCINKA_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("LUCINKA_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    // Append per-target overrides to keep rmcp internals quiet by default
    let combined_filter = format!("{},rmcp=warn,serve_inner=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rmcp=warn,serve_inner=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("lucinka_mcp: log filter: {}", log_env);

    let config = Config::from_env()?;
    let analytics = AnalyticsConfig::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        timezone = %analytics.time.timezone,
        "lucinka_mcp: configuration loaded"
    );

    let preferences = match &analytics.preferences_path {
        Some(path) => Preferences::new(Arc::new(JsonFileStore::new(path))),
        None => Preferences::in_memory(),
    };

    let client = LoggingMiddleware::new(ReqwestLucinkaClient::new(
        &config.base_url,
        config.username,
        config.password,
    ));
    let handler = LucinkaMcpHandler::with_config(Arc::new(client), analytics, preferences);

    tracing::info!(
        "lucinka_mcp: registered {} tools and {} prompts",
        handler.tool_count(),
        handler.prompt_count()
    );

    // stdio transport so the server is immediately usable with MCP clients
    tracing::info!("lucinka_mcp: starting stdio MCP server...");

    use rmcp::serve_server;
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = serve_server(handler, transport).await?;

    tracing::info!("lucinka_mcp: service initialized as server");

    server.waiting().await?;

    Ok(())
}
