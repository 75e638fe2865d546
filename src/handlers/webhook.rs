use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::services::dialogue;
use crate::state::AppState;

const TROUBLE_REPLY: &str =
    "Desculpe, estou com dificuldades no momento. Pode tentar novamente em instantes?";

/// UltraMsg delivers inbound messages wrapped in a `data` object; anything
/// else on the payload is ignored.
#[derive(Deserialize)]
pub struct UltraMsgWebhook {
    #[serde(default)]
    pub data: Option<WebhookMessage>,
}

#[derive(Deserialize)]
pub struct WebhookMessage {
    pub from: Option<String>,
    pub body: Option<String>,
}

pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UltraMsgWebhook>,
) -> Response {
    let message = payload.data.as_ref();
    let from = message.and_then(|m| m.from.as_deref()).unwrap_or("");
    let body = message.and_then(|m| m.body.as_deref()).unwrap_or("");

    // Delivery receipts and other non-message events arrive without these
    // fields; acknowledge so the provider does not retry.
    if from.is_empty() || body.is_empty() {
        return ack();
    }

    tracing::info!(from = %from, "incoming WhatsApp message");

    let reply = match dialogue::process_message(&state, from, body).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, from = %from, "message processing failed");
            TROUBLE_REPLY.to_string()
        }
    };

    if let Err(e) = state.messaging.send_message(from, &reply).await {
        tracing::error!(error = %e, from = %from, "failed to send reply");
    }

    ack()
}

fn ack() -> Response {
    ([(header::CONTENT_TYPE, "application/json")], "success").into_response()
}
