//! Instagram sales assistant API server

use common::LogFormat;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod error;
mod routes;
mod state;

use state::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = common::Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("insta_assistant=debug".parse()?)
        .add_directive("api=debug".parse()?)
        .add_directive("processor=debug".parse()?)
        .add_directive("instagram=debug".parse()?);
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    info!("📨 Starting Instagram sales assistant");

    if config.app_secret.is_none() {
        if config.require_signature {
            warn!("META_APP_SECRET not set and signatures are required: every webhook will be rejected");
        } else {
            warn!("META_APP_SECRET not set: webhook signatures are NOT verified");
        }
    }
    if !config.messaging_configured() {
        warn!("META_PAGE_ACCESS_TOKEN or IG_USER_ID not set: replies will not be sent");
    }
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set: replies will be a fixed fallback message");
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone())?);

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
