use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::booking::Booking;
use services::services::bookings::{BookingCreated, CreateBooking, UpdateBookingStatus};
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::{AdminAuth, FormSlot},
    state::AppState,
};

/// POST /api/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    FormSlot(ip): FormSlot,
    axum::Json(payload): axum::Json<CreateBooking>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<BookingCreated>>), ApiError> {
    let booking = state.bookings.create(payload, ip).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            BookingCreated {
                booking_id: booking.id.to_string(),
            },
            "Booking submitted successfully!",
        )),
    ))
}

/// GET /api/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<ResponseJson<ApiResponse<Vec<Booking>>>, ApiError> {
    let bookings = state.bookings.list().await?;
    Ok(ResponseJson(ApiResponse::success(bookings)))
}

/// PATCH /api/bookings/{id}/status
pub async fn update_booking_status(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(id): Path<i64>,
    axum::Json(payload): axum::Json<UpdateBookingStatus>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    let booking = state.bookings.update_status(id, payload.status).await?;
    Ok(ResponseJson(ApiResponse::success(booking)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}/status", patch(update_booking_status))
}
