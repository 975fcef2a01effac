use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    bookings::BookingError, contact::ContactError, imagekit::ImageKitError,
    media_browser::MediaBrowserError, portfolio_catalog::PortfolioCatalogError,
    portfolio_sync::PortfolioSyncError, portfolio_webhook::PortfolioWebhookError,
    vouchers::VoucherError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Contact(#[from] ContactError),
    #[error(transparent)]
    Voucher(#[from] VoucherError),
    #[error(transparent)]
    PortfolioCatalog(#[from] PortfolioCatalogError),
    #[error(transparent)]
    PortfolioSync(#[from] PortfolioSyncError),
    #[error(transparent)]
    PortfolioWebhook(#[from] PortfolioWebhookError),
    #[error(transparent)]
    MediaBrowser(#[from] MediaBrowserError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Too many requests, please try again later.")]
    RateLimited,
}

fn image_host_status(e: &ImageKitError) -> StatusCode {
    match e {
        ImageKitError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        ImageKitError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Booking(e) => match e {
                BookingError::Validation(_) => StatusCode::BAD_REQUEST,
                BookingError::Duplicate => StatusCode::CONFLICT,
                BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Contact(e) => match e {
                ContactError::Validation(_) => StatusCode::BAD_REQUEST,
                ContactError::NotFound(_) => StatusCode::NOT_FOUND,
                ContactError::Email(_) | ContactError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Voucher(e) => match e {
                VoucherError::Validation(_) => StatusCode::BAD_REQUEST,
                VoucherError::NotFound(_) => StatusCode::NOT_FOUND,
                VoucherError::CodeExhausted | VoucherError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::PortfolioCatalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PortfolioSync(e) => match e {
                PortfolioSyncError::ImageKit(e) => image_host_status(e),
                PortfolioSyncError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::PortfolioWebhook(e) => match e {
                PortfolioWebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
                PortfolioWebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::MediaBrowser(e) => match e {
                MediaBrowserError::InvalidFolder(_) => StatusCode::BAD_REQUEST,
                MediaBrowserError::ImageKit(e) => image_host_status(e),
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server-side failures are logged in full and reported generically.
        let message = if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
            match status {
                StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
                _ => self.to_string(),
            }
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
