use std::sync::Arc;

use marquee_api::config::Config;
use marquee_api::routes::create_router;
use marquee_api::services::ai::gemini::GeminiBackend;
use marquee_api::services::ai::router::ModelRouter;
use marquee_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Single shared backend; the router itself keeps no state across calls
    let backend = GeminiBackend::new(config.gemini_api_url.clone());
    let router = ModelRouter::new(Arc::new(backend));
    let state = AppState::new(router, config.gemini_api_key.clone());

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
