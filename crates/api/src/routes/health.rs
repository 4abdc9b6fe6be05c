//! Health check routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Graph API credentials present
    messaging: bool,
    /// OpenAI key present
    chat: bool,
    /// App secret present
    signatures: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = &state.config;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        messaging: config.messaging_configured(),
        chat: config.openai_api_key.is_some(),
        signatures: config.app_secret.is_some(),
    })
}
