use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::contact_inquiry::ContactInquiry;
use services::services::contact::{InquiryListQuery, InquiryPage, UpdateInquiry};
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::AdminAuth, state::AppState};

/// GET /api/admin/contact-inquiries?page&limit&status
pub async fn list_inquiries(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(query): Query<InquiryListQuery>,
) -> Result<ResponseJson<ApiResponse<InquiryPage>>, ApiError> {
    let page = state.contact.list(&query).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// POST /api/admin/contact-inquiries
pub async fn update_inquiry(
    State(state): State<AppState>,
    _admin: AdminAuth,
    axum::Json(payload): axum::Json<UpdateInquiry>,
) -> Result<ResponseJson<ApiResponse<ContactInquiry>>, ApiError> {
    let inquiry = state.contact.update(payload).await?;
    Ok(ResponseJson(ApiResponse::success(inquiry)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route(
        "/admin/contact-inquiries",
        get(list_inquiries).post(update_inquiry),
    )
}
