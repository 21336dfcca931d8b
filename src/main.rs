use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use nutricoach::config::AppConfig;
use nutricoach::server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting NutriCoach API...");

    let config = AppConfig::from_env()?;
    log::info!(
        "✅ Analyzer ready: {} strategy, model {}",
        config.analyzer.strategy,
        config.analyzer.model
    );
    if config.analyzer.credential().is_none() {
        log::warn!(
            "⚠️ {} not set, analysis requests will fail until it is",
            config.analyzer.api_key_var
        );
    }

    let body_limit = config.body_limit();
    let state = Arc::new(AppState::from_config(&config));
    let app = create_router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    log::info!("🌐 Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("🛑 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
    }
}
