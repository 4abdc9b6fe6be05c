//! API routes

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::AppState;

pub mod health;
pub mod webhooks;

/// Build the router with all routes and state attached
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/webhook", get(webhooks::verify).post(webhooks::receive))
        .with_state(state)
}
