//! Inbound webhook: signature check, event decoding, and dispatch.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::channels::{Messenger, Recipient};
use crate::dialogue::{DialogueController, InboundEvent};
use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

// ── Signature ───────────────────────────────────────────────────────────

fn keyed_mac(secret: &[u8], body: &[u8]) -> Result<HmacSha256, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    Ok(mac)
}

/// Compute base64(HMAC-SHA256(secret, body)).
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, WebhookError> {
    let mac = keyed_mac(secret, body)?;
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Verify a signature in constant time.
pub fn verify_signature(
    secret: &[u8],
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), WebhookError> {
    let signature = signature.ok_or(WebhookError::MissingSignature)?;
    let expected = BASE64
        .decode(signature.trim())
        .map_err(|_| WebhookError::InvalidSignature)?;

    keyed_mac(secret, body)?
        .verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature)
}

// ── Wire format ─────────────────────────────────────────────────────────

/// Top-level webhook body.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// Who sent an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// A single webhook event. Unsupported event types decode to `Unsupported`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Follow {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        source: EventSource,
    },
    Postback {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        source: EventSource,
        postback: PostbackContent,
    },
    Message {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        source: EventSource,
        message: MessageContent,
    },
    #[serde(other)]
    Unsupported,
}

impl WebhookEvent {
    /// Translate into a dialogue event plus delivery address. `None` for
    /// events the bot does not act on.
    pub fn into_inbound(self) -> Option<(InboundEvent, Recipient)> {
        let (event, reply_token) = match self {
            Self::Follow {
                reply_token,
                source,
            } => (
                InboundEvent::Join {
                    user_id: source.user_id?,
                },
                reply_token,
            ),
            Self::Postback {
                reply_token,
                source,
                postback,
            } => (
                InboundEvent::Answer {
                    user_id: source.user_id?,
                    payload: postback.data,
                },
                reply_token,
            ),
            Self::Message {
                reply_token,
                source,
                message: MessageContent::Text { text },
            } => (
                InboundEvent::Text {
                    user_id: source.user_id?,
                    text,
                },
                reply_token,
            ),
            Self::Message { .. } | Self::Unsupported => return None,
        };

        let mut recipient = Recipient::new(event.user_id());
        if let Some(token) = reply_token {
            recipient = recipient.with_reply_token(token);
        }
        Some((event, recipient))
    }
}

// ── Routes ──────────────────────────────────────────────────────────────

/// Shared state for webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    pub channel_secret: SecretString,
    pub controller: Arc<DialogueController>,
    pub messenger: Arc<dyn Messenger>,
}

/// Build the webhook router: `POST /callback` and `GET /health`.
pub fn webhook_routes(state: WebhookState) -> Router {
    Router::new()
        .route("/callback", post(callback))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bartender-bot"
    }))
}

/// POST /callback
///
/// Rejects unsigned or mis-signed bodies with 400 before anything else runs.
async fn callback(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = verify_signature(
        state.channel_secret.expose_secret().as_bytes(),
        &body,
        signature,
    ) {
        error!(error = %e, "Rejecting webhook");
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    let parsed: WebhookBody = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            let e = WebhookError::from(e);
            warn!(error = %e, "Rejecting webhook");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let span = info_span!("webhook", request_id = %Uuid::new_v4());
    async {
        info!(
            destination = parsed.destination.as_deref().unwrap_or("-"),
            events = parsed.events.len(),
            "Webhook received"
        );

        for event in parsed.events {
            dispatch(&state, event).await;
        }
    }
    .instrument(span)
    .await;

    (StatusCode::OK, "OK").into_response()
}

/// Run one event through the controller and deliver its messages.
///
/// Delivery failures are logged only; the session change already applied
/// stays in place.
async fn dispatch(state: &WebhookState, event: WebhookEvent) {
    let Some((inbound, recipient)) = event.into_inbound() else {
        debug!("Skipping unsupported webhook event");
        return;
    };

    let reply = state.controller.handle(inbound).await;
    if reply.messages.is_empty() {
        return;
    }

    if let Err(e) = state.messenger.deliver(&recipient, reply.messages).await {
        error!(
            user_id = %recipient.user_id,
            channel = state.messenger.name(),
            error = %e,
            "Failed to deliver reply"
        );
    }
}
