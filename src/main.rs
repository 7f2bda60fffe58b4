//! Credit Gateway - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Resolve the parent base address and timeout
//! 3. Build the upstream client and HTTP router
//! 4. Start server on configured port

use credit_gateway::{
    AppState, build_router,
    config::{Config, DEFAULT_PARENT_BASE},
    upstream::UpstreamClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let upstream_config = config.resolve()?;

    if !upstream_config.explicit_base {
        tracing::warn!(
            default = DEFAULT_PARENT_BASE,
            "PARENT_API_BASE, NEXT_PUBLIC_PARENT_API_BASE and PARENT_BASE_URL are unset, using default parent"
        );
    }
    tracing::info!(
        parent = %upstream_config.base_url,
        timeout_ms = upstream_config.timeout.as_millis() as u64,
        balance_path = upstream_config.balance_path.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let upstream = UpstreamClient::new(upstream_config)?;
    let app = build_router(AppState::new(upstream));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
