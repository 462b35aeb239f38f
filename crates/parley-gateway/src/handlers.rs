// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use parley_instagram::webhook::SIGNATURE_HEADER;
use parley_instagram::{WebhookPayload, verify_signature, verify_subscription};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::server::GatewayState;

/// Query parameters of a webhook subscription request.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Acknowledgement returned for every webhook delivery.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /webhook
///
/// Echoes `hub.challenge` when the subscription token matches.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let Some(expected) = state.auth.verify_token.as_deref() else {
        warn!("webhook verification attempted but no verify token is configured");
        return StatusCode::FORBIDDEN.into_response();
    };

    match verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        expected,
    ) {
        Some(challenge) => {
            debug!("webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        None => {
            warn!(mode = ?params.mode, "webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// POST /webhook
///
/// Acknowledges immediately and processes the payload's events in order
/// on a background task.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = state.auth.app_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, signature) {
            warn!("webhook payload signature mismatch");
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed webhook payload");
            return (StatusCode::OK, Json(WebhookAck { received: false })).into_response();
        }
    };

    let events = payload.into_events();
    if !events.is_empty() {
        let pipeline = state.pipeline.clone();
        tokio::spawn(async move {
            for event in events {
                let event_id = event.event_id.clone();
                match pipeline.handle(event).await {
                    Ok(outcome) => debug!(event_id = %event_id, %outcome, "inbound event handled"),
                    Err(e) => error!(event_id = %event_id, error = %e, "inbound event failed"),
                }
            }
        });
    }

    (StatusCode::OK, Json(WebhookAck { received: true })).into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}
