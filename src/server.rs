use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};

use crate::events::WebhookBody;
use crate::signature;
use crate::support::Support;

const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Clone)]
pub struct AppState {
    pub support: Arc<Support>,
    pub channel_secret: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let sig = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match sig {
        Some(sig) if signature::verify(&state.channel_secret, &body, sig) => {}
        Some(_) => {
            tracing::warn!("Invalid LINE webhook signature");
            return (StatusCode::UNAUTHORIZED, "Invalid signature");
        }
        None => {
            tracing::warn!("Missing x-line-signature header");
            return (StatusCode::UNAUTHORIZED, "Missing signature");
        }
    }

    let batch = serde_json::from_slice::<WebhookBody>(&body).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable webhook body, treating as empty");
        WebhookBody::default()
    });

    if batch.events.is_empty() {
        return (StatusCode::OK, "No events");
    }

    tracing::debug!(events = batch.events.len(), "Webhook batch received");

    match state.support.handle_batch(batch.events).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Webhook error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
