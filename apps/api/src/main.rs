mod book;
mod config;
mod errors;
mod illustration;
mod llm_client;
mod routes;
mod state;
mod story;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::illustration::FanoutOptions;
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
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fábrica de Cuentos API v{}", env!("CARGO_PKG_VERSION"));

    // One OpenAI client serves both model seams
    let llm = Arc::new(LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    ));
    info!(
        story_model = llm_client::STORY_MODEL,
        image_model = llm_client::IMAGE_MODEL,
        base_url = %config.openai_base_url,
        "LLM client initialized"
    );

    let fanout = FanoutOptions {
        max_in_flight: config.image_concurrency,
        call_timeout: config.image_timeout,
    };
    info!(
        max_in_flight = fanout.max_in_flight,
        call_timeout_secs = fanout.call_timeout.as_secs(),
        "Image fan-out configured"
    );

    let state = AppState {
        story_model: llm.clone(),
        image_model: llm,
        fanout,
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
