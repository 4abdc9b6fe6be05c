//! Webhook routes

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use common::models::DispatchSummary;
use instagram::{check_signature, SignatureCheck};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Query parameters of the subscription handshake
#[derive(Debug, Deserialize)]
pub struct HandshakeParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    status: &'static str,
}

/// Answer the provider's subscription challenge
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HandshakeParams>,
) -> ApiResult<String> {
    let subscribing = params.mode.as_deref() == Some("subscribe");
    let token_matches = params.verify_token.as_deref() == Some(state.config.verify_token.as_str());

    if subscribing && token_matches {
        info!("Webhook subscription verified");
        return Ok(params.challenge.unwrap_or_default());
    }

    warn!(mode = ?params.mode, "Webhook verification failed");
    Err(ApiError::VerificationFailed)
}

/// Receive message notifications
///
/// Once the signature check passes the provider always gets a 200, whatever
/// happens to the individual messages. Outcomes are only visible in logs.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookResponse>> {
    let span = info_span!("webhook", delivery = %Uuid::new_v4());

    async move {
        authenticate(&state, &headers, &body)?;

        match serde_json::from_slice::<Value>(&body) {
            Ok(payload) => {
                debug!(payload = %payload, "Incoming webhook");
                let outcomes = state.event_handler.handle(&payload).await;
                let summary = DispatchSummary::from_outcomes(&outcomes);
                if summary.failed() > 0 {
                    warn!(failed = summary.failed(), "Some replies were not delivered");
                }
            }
            Err(e) => error!("Error handling webhook payload: {}", e),
        }

        Ok::<_, ApiError>(Json(WebhookResponse { status: "ok" }))
    }
    .instrument(span)
    .await
}

fn authenticate(state: &AppState, headers: &HeaderMap, body: &[u8]) -> ApiResult<()> {
    let signature = match headers.get(SIGNATURE_HEADER) {
        Some(value) => match value.to_str() {
            Ok(s) => Some(s),
            Err(_) => {
                warn!("Unreadable {} header", SIGNATURE_HEADER);
                return Err(ApiError::InvalidSignature);
            }
        },
        None => None,
    };

    match check_signature(signature, state.config.app_secret.as_deref(), body) {
        SignatureCheck::Valid => Ok(()),
        SignatureCheck::Invalid => {
            warn!("Invalid signature");
            Err(ApiError::InvalidSignature)
        }
        SignatureCheck::Skipped(reason) if state.config.require_signature => {
            warn!(reason = ?reason, "Rejecting unverified webhook");
            Err(ApiError::InvalidSignature)
        }
        SignatureCheck::Skipped(reason) => {
            warn!(reason = ?reason, "Webhook signature not verified");
            Ok(())
        }
    }
}
