use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::voucher::{Voucher, VoucherType};
use services::services::vouchers::{CreateVoucher, VoucherCreated};
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::FormSlot, state::AppState};

/// POST /api/vouchers
pub async fn create_voucher(
    State(state): State<AppState>,
    FormSlot(ip): FormSlot,
    axum::Json(payload): axum::Json<CreateVoucher>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<VoucherCreated>>), ApiError> {
    let voucher = state.vouchers.create(payload, ip).await?;
    let message = match voucher.voucher_type {
        VoucherType::Sponsorship => "Sponsorship created successfully!",
        VoucherType::Gift => "Gift voucher created successfully!",
    };
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            VoucherCreated::from(&voucher),
            message,
        )),
    ))
}

/// GET /api/vouchers/{code}
pub async fn get_voucher(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<ResponseJson<ApiResponse<Voucher>>, ApiError> {
    let voucher = state.vouchers.find_by_code(&code).await?;
    Ok(ResponseJson(ApiResponse::success(voucher)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/vouchers", post(create_voucher))
        .route("/vouchers/{code}", get(get_voucher))
}
