mod config;
mod enforcement;
mod errors;
mod fitting;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::enforcement::sanitize::{Sanitizer, StylePolicy};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EPB fit API v{}", env!("CARGO_PKG_VERSION"));

    // Style policy: external file if configured, bundled copy otherwise
    let policy = match &config.style_policy_path {
        Some(path) => {
            info!("Loading style policy from {}", path.display());
            StylePolicy::from_path(path)?
        }
        None => StylePolicy::bundled()?,
    };
    info!("Style policy loaded ({} replacements)", policy.replacements.len());
    let sanitizer = Arc::new(Sanitizer::new(policy)?);

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!(
        "LLM client initialized (default model: {}, call timeout: {}s)",
        config.llm_model,
        config.llm_call_timeout.as_secs()
    );

    let state = AppState {
        llm: Arc::new(llm),
        config: config.clone(),
        sanitizer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
