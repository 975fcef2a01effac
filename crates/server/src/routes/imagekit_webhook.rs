use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::post,
};
use secrecy::ExposeSecret;
use services::services::portfolio_webhook::{WebhookEvent, WebhookOutcome, verify_signature};
use tracing::warn;
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::ClientIp,
    state::AppState,
};

const SIGNATURE_HEADER: &str = "x-ik-signature";

/// POST /api/imagekit/webhook
///
/// The signature is only enforced when `IMAGEKIT_WEBHOOK_SECRET` is set.
pub async fn imagekit_webhook(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<WebhookOutcome>>, ApiError> {
    if let Some(secret) = &state.config.imagekit.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(secret.expose_secret(), signature, &body) {
            warn!(ip = ?ip, "Rejected webhook with invalid signature");
            return Err(ApiError::InvalidSignature);
        }
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {e}")))?;
    let outcome = state.webhook.handle(&event).await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        outcome,
        format!("Event {} processed successfully", event.event_type),
    )))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/imagekit/webhook", post(imagekit_webhook))
}
