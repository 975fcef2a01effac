use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use services::services::contact::{ContactForm, ContactReceipt};
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::FormSlot, state::AppState};

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    _slot: FormSlot,
    axum::Json(form): axum::Json<ContactForm>,
) -> Result<ResponseJson<ApiResponse<ContactReceipt>>, ApiError> {
    let receipt = state.contact.submit(form).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        receipt,
        "Thank you for your message! I'll get back to you within 24-48 hours.",
    )))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}
